/// Router Module Index
///
/// Routes are split by who may reach them. The gate middleware wraps the whole
/// router, so the split documents intent; enforcement lives in `gate::decide`.

/// Routes reachable without a session: login page, login/logout, token refresh,
/// health and API docs.
pub mod public;

/// Routes under `/dashboard`, reached only after the gate has let the request
/// through with a valid access token.
pub mod dashboard;
