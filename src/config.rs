use std::{env, net::SocketAddr, time::Duration};

/// Host the dashboard talks to when `API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.mathos.cloud";

/// AppConfig
///
/// Immutable configuration loaded once at startup. Pulled into handlers and the
/// gate through `FromRef`, the same way every other piece of shared state is.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Production turns on the `Secure` cookie attribute.
    pub env: Env,
    // Base URL of the remote data API (admin-api/*).
    pub api_base_url: String,
    // Base URL of the identity API (auth/login, auth/generate-access-token).
    pub identity_base_url: String,
    // Socket the HTTP server binds to.
    pub bind_addr: SocketAddr,
    // Upper bound on a single upstream call, including the refresh exchange.
    pub upstream_timeout: Duration,
}

/// Env
///
/// Runtime context: local development or a production build.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe values for tests; no environment variables are read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: DEFAULT_API_URL.to_string(),
            identity_base_url: DEFAULT_API_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the process environment.
    ///
    /// # Panics
    /// Panics when `BIND_ADDR` or `UPSTREAM_TIMEOUT_SECS` is set but cannot be parsed,
    /// so a typo never silently falls back to a default in a deployed build.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = env::var("API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        // The identity endpoints live on the data API host unless split out explicitly.
        let identity_base_url = env::var("IDENTITY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| api_base_url.clone());

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .expect("FATAL: BIND_ADDR must be a socket address such as 0.0.0.0:3000"),
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let upstream_timeout = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .expect("FATAL: UPSTREAM_TIMEOUT_SECS must be a whole number of seconds"),
            ),
            Err(_) => Duration::from_secs(10),
        };

        Self {
            env,
            api_base_url,
            identity_base_url,
            bind_addr,
            upstream_timeout,
        }
    }

    /// Cookies carry `Secure` only in production builds.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}
