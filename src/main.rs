use mathos_admin::{
    AppState, AuthEvent, AuthEventBus, ReqwestIdentityClient,
    config::{AppConfig, Env},
    create_router,
    identity::IdentityState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, wires the identity client and the event
/// bus into the shared state, and serves the gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on unparsable values)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, otherwise verbose defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mathos_admin=debug,tower_http=info,axum=trace".into());

    // 3. Pretty output locally, JSON lines in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    tracing::info!(
        api = %config.api_base_url,
        identity = %config.identity_base_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        "upstreams configured"
    );

    // 4. Identity client
    let identity = Arc::new(
        ReqwestIdentityClient::new(&config.identity_base_url, config.upstream_timeout)
            .expect("FATAL: Failed to build the identity HTTP client."),
    ) as IdentityState;

    // 5. Session event bus with an audit trail. Subscriptions live for the whole process.
    let events = AuthEventBus::new();
    for kind in [
        AuthEvent::AccessChanged,
        AuthEvent::RefreshChanged,
        AuthEvent::LoggedOut,
    ] {
        let _audit = events.subscribe(kind, |event| {
            tracing::info!(?event, "session cookies changed");
        });
    }

    // 6. Unified state
    let bind_addr = config.bind_addr;
    let app_state = AppState::new(identity, config, events)
        .expect("FATAL: Failed to build the data API HTTP client.");

    // 7. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {bind_addr}");
    tracing::info!("OpenAPI document available at: http://{bind_addr}/api-docs/openapi.json");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
