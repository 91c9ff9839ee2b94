use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::models::{
    ErrorDetail, LoginRequest, LoginResponse, TokenRefreshRequest, TokenRefreshResponse,
};

/// IdentityError
///
/// Every way a call to the identity API can fail. Callers on the session path
/// collapse all of them into "log the user out"; the variants exist for logging.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity API rejected the request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("identity API unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity API returned an unusable body: {0}")]
    Malformed(String),
}

/// IdentityApi Trait
///
/// Contract for the upstream identity service. Handlers only see this trait, so
/// tests swap in an in-memory implementation.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Exchanges credentials for an access/refresh pair.
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, IdentityError>;
    /// Exchanges a refresh token for a new access token. Exactly one upstream call.
    async fn refresh_access(&self, refresh: &str) -> Result<String, IdentityError>;
}

/// Shared handle used in the application state.
pub type IdentityState = Arc<dyn IdentityApi>;

/// ReqwestIdentityClient
///
/// HTTP implementation talking to `<base>/auth/login/` and
/// `<base>/auth/generate-access-token/`.
pub struct ReqwestIdentityClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestIdentityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl IdentityApi for ReqwestIdentityClient {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, IdentityError> {
        let response = self
            .http
            .post(self.url("/auth/login/"))
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Upstream explains bad credentials in `{ "detail": ... }`.
            let detail = response.json::<ErrorDetail>().await.ok().map(|body| body.detail);
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let tokens = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;
        if tokens.access.is_empty() || tokens.refresh.is_empty() {
            return Err(IdentityError::Malformed("empty token in login response".into()));
        }
        Ok(tokens)
    }

    async fn refresh_access(&self, refresh: &str) -> Result<String, IdentityError> {
        let response = self
            .http
            .post(self.url("/auth/generate-access-token/"))
            .json(&TokenRefreshRequest {
                refresh: refresh.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                detail: None,
            });
        }

        let body = response
            .json::<TokenRefreshResponse>()
            .await
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;
        if body.access.is_empty() {
            return Err(IdentityError::Malformed("empty access token".into()));
        }
        Ok(body.access)
    }
}
