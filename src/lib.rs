use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, StatusCode},
    middleware,
    routing::get,
};
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session core.
pub mod cookies;
pub mod events;
pub mod gate;
pub mod session;
pub mod token;

// Upstream access.
pub mod api;
pub mod identity;

pub mod client;
pub mod config;
pub mod handlers;
pub mod models;

// Module for routing segregation (Public, Dashboard).
pub mod routes;
use routes::{dashboard, public};

// --- Public Re-exports ---

pub use client::SessionClient;
pub use config::AppConfig;
pub use events::{AuthEvent, AuthEventBus};
pub use identity::{IdentityApi, IdentityState, ReqwestIdentityClient};

/// ApiDoc
///
/// OpenAPI document for the gateway's own endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::generate_token, handlers::login, handlers::logout,
        handlers::dashboard_overview, handlers::dashboard_users, handlers::dashboard_analytics,
        handlers::dashboard_leaderboard, handlers::dashboard_moderation,
        handlers::dashboard_support, handlers::dashboard_settings
    ),
    components(
        schemas(
            models::LoginRequest, models::ErrorDetail, models::DashboardOverview,
            models::UsersResponse, models::AnalyticsResponse, models::LeaderboardResponse,
            models::ModerationResponse, models::SupportConversationList, models::Profile,
        )
    ),
    tags(
        (name = "mathos-admin", description = "Mathos admin dashboard gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, cloned per request. Handlers pull single parts
/// out of it through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Identity service used for login and the refresh exchange.
    pub identity: IdentityState,
    /// Loaded, immutable configuration.
    pub config: AppConfig,
    /// Session change notifications for in-process observers.
    pub events: AuthEventBus,
    /// Connection pool for data API calls made on behalf of a session.
    pub http: reqwest::Client,
}

impl AppState {
    /// Assembles the state with a data API client honoring the configured timeout.
    pub fn new(
        identity: IdentityState,
        config: AppConfig,
        events: AuthEventBus,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;
        Ok(Self {
            identity,
            config,
            events,
            http,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for AuthEventBus {
    fn from_ref(app_state: &AppState) -> AuthEventBus {
        app_state.events.clone()
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// create_router
///
/// Assembles the routes, puts the gate in front of all of them (fallback
/// included), and adds request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(public::public_routes())
        .merge(dashboard::dashboard_routes())
        .fallback(|| async { StatusCode::NOT_FOUND })
        // The gate sees every path so unknown /dashboard/* URLs are still protected.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::gate_middleware,
        ))
        .with_state(state);

    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// One span per request carrying method, path, and the `x-request-id` set by the
/// layer above. The query string is left out: it can carry redirect targets.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
