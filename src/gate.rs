//! Edge authorization gate.
//!
//! Runs in front of every route. The decision itself is a pure function of the
//! path, the request's [`Session`], and the clock, so the whole state table can
//! be tested without a server. No network I/O happens here: renewing a token is
//! delegated to the refresh endpoint by redirect.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{AppState, handlers::logout_response, session::Session};

/// Token refresh endpoint. Never gated, or the redirect would loop.
pub const REFRESH_PATH: &str = "/api/generateToken";
/// Public root, doubling as the login page.
pub const LOGIN_PATH: &str = "/";
/// Landing page of the protected area.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// GateDecision
///
/// What the gate does with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through unchanged.
    Pass,
    /// Access token missing or expired but renewable: detour through the refresh
    /// endpoint and come back to `redirect` (original path plus query, verbatim).
    Refresh { redirect: String },
    /// Nothing to renew with. Clear the cookies and send the user to log in.
    Logout,
    /// Already signed in; skip the login page.
    EnterDashboard,
}

impl GateDecision {
    /// Redirect target, or `None` for [`GateDecision::Pass`].
    pub fn location(&self) -> Option<String> {
        match self {
            GateDecision::Pass => None,
            GateDecision::Refresh { redirect } => Some(format!(
                "{REFRESH_PATH}?redirect={}",
                urlencoding::encode(redirect)
            )),
            GateDecision::Logout => Some(LOGIN_PATH.to_string()),
            GateDecision::EnterDashboard => Some(DASHBOARD_PATH.to_string()),
        }
    }
}

/// True for `/dashboard` and everything beneath it, but not `/dashboards`.
pub fn is_protected(path: &str) -> bool {
    path == DASHBOARD_PATH
        || path
            .strip_prefix(DASHBOARD_PATH)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// decide
///
/// | protected | access valid | refresh present | decision |
/// |-----------|--------------|-----------------|----------|
/// | no        | -            | -               | Pass     |
/// | yes       | yes          | -               | Pass     |
/// | yes       | no           | yes             | Refresh  |
/// | yes       | no           | no              | Logout   |
///
/// plus: the login page with a valid access token enters the dashboard.
pub fn decide(path: &str, query: Option<&str>, session: &Session, now_ms: i64) -> GateDecision {
    if path == REFRESH_PATH {
        return GateDecision::Pass;
    }

    if path == LOGIN_PATH {
        return if session.is_authenticated(now_ms) {
            GateDecision::EnterDashboard
        } else {
            GateDecision::Pass
        };
    }

    if !is_protected(path) || session.is_authenticated(now_ms) {
        return GateDecision::Pass;
    }

    if session.is_recoverable() {
        let redirect = match query {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        GateDecision::Refresh { redirect }
    } else {
        GateDecision::Logout
    }
}

/// gate_middleware
///
/// Applies [`decide`] to every request. On `Pass` the parsed [`Session`] is stored
/// in the request extensions so handlers never re-read the cookies.
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = Session::from_headers(request.headers());
    let decision = decide(
        request.uri().path(),
        request.uri().query(),
        &session,
        Utc::now().timestamp_millis(),
    );

    tracing::debug!(path = request.uri().path(), ?decision, "gate decision");

    match decision.location() {
        None => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Some(location) if decision == GateDecision::Logout => {
            logout_response(&state, Redirect::temporary(&location))
        }
        Some(location) => Redirect::temporary(&location).into_response(),
    }
}
