use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints the gate never blocks. The refresh endpoint must stay here: gating
/// it would send an expired session around the refresh redirect forever.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Login page. The gate redirects signed-in users to /dashboard instead.
        .route("/", get(handlers::login_page))
        // POST /api/login
        // Exchanges credentials for the token pair and sets both cookies.
        .route("/api/login", post(handlers::login))
        // POST /api/logout
        // Clears both cookies.
        .route("/api/logout", post(handlers::logout))
        // GET /api/generateToken?redirect=...
        // Silent refresh of the access cookie, then back to `redirect`.
        .route("/api/generateToken", get(handlers::generate_token))
}
