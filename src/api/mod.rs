//! Client for the remote data API.
//!
//! Every request carries `Authorization: Bearer <access>` when the token source
//! has an access token, and goes out bare otherwise; the upstream decides. Reads
//! go through a tag-based [`ResourceCache`] that mutations invalidate.

pub mod cache;
pub mod resources;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    cookies::{ACCESS_COOKIE, CookieStore},
    events::{AuthEvent, AuthEventBus, Subscription},
    session::Session,
};

pub use cache::{ResourceCache, Tag, TagKind};

/// Where the current access token comes from.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Server side: the token on the request being handled.
impl TokenSource for Session {
    fn access_token(&self) -> Option<String> {
        self.access.as_ref().map(|access| access.as_str().to_string())
    }
}

/// Client side: whatever the cookie store holds right now.
impl TokenSource for CookieStore {
    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_COOKIE).filter(|token| !token.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("data API responded {status}")]
    Status { status: StatusCode, body: String },
    #[error("data API unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("data API response did not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Upstream status, when the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }
}

/// ApiClient
///
/// Cheap to clone; clones share the HTTP pool and the cache.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    tokens: Arc<dyn TokenSource>,
    cache: ResourceCache,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            tokens,
            cache: ResourceCache::new(),
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Drops all cached reads whenever the session ends.
    pub fn clear_cache_on_logout(&self, events: &AuthEventBus) -> Subscription {
        let cache = self.cache.clone();
        events.subscribe(AuthEvent::LoggedOut, move |_| cache.clear())
    }

    /// Builds a request against `path`, attaching the bearer token if one exists.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json");

        match self.tokens.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "data API request failed");
            Err(ApiError::Status { status, body })
        }
    }

    async fn send_json(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let bytes = self.send_raw(builder).await?.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// query
    ///
    /// Cached read. `provides` computes the tags from the decoded response so a
    /// listing can tag itself with every member it contains.
    pub(crate) async fn query<T, F>(
        &self,
        key: String,
        builder: RequestBuilder,
        provides: F,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> Vec<Tag>,
    {
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(key = %key, "cache hit");
            return Ok(serde_json::from_value(hit)?);
        }

        let generation = self.cache.generation();
        let value = self.send_json(builder).await?;
        let decoded: T = serde_json::from_value(value.clone())?;
        if !self
            .cache
            .insert_if_current(generation, key, value, provides(&decoded))
        {
            tracing::trace!("cache invalidated while reading, response not kept");
        }
        Ok(decoded)
    }

    /// mutate
    ///
    /// Uncached write. On success every entry providing one of `invalidates` is
    /// dropped so the next read goes upstream.
    pub(crate) async fn mutate<T>(
        &self,
        builder: RequestBuilder,
        invalidates: &[Tag],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let value = self.send_json(builder).await?;
        let dropped = self.cache.invalidate(invalidates);
        tracing::trace!(dropped, "cache invalidated");
        Ok(serde_json::from_value(value)?)
    }

    /// Uncached read or write whose result is not kept.
    pub(crate) async fn call<T>(&self, builder: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.send_json(builder).await?)?)
    }
}

/// Cache key for `path` with its query parameters, in the order given.
pub(crate) fn cache_key(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}
