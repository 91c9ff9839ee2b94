use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Dashboard Router Module
///
/// Server-rendered data views of the admin dashboard. Each handler forwards the
/// session's access token to the data API and returns its JSON.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard
        // Platform overview: user totals and recent activity.
        .route("/dashboard", get(handlers::dashboard_overview))
        // GET /dashboard/users?page=&search=&role=&is_banned=
        .route("/dashboard/users", get(handlers::dashboard_users))
        // GET /dashboard/analytics?page=&year=
        .route("/dashboard/analytics", get(handlers::dashboard_analytics))
        // GET /dashboard/leaderboard
        .route("/dashboard/leaderboard", get(handlers::dashboard_leaderboard))
        // GET /dashboard/moderation?page=&filter=
        .route("/dashboard/moderation", get(handlers::dashboard_moderation))
        // GET /dashboard/support?page=
        .route("/dashboard/support", get(handlers::dashboard_support))
        // GET /dashboard/settings
        // The signed-in admin's own profile.
        .route("/dashboard/settings", get(handlers::dashboard_settings))
}
