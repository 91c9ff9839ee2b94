use axum::http::{HeaderMap, header};

use crate::{
    cookies::{ACCESS_COOKIE, REFRESH_COOKIE, find_cookie},
    token,
};

/// Bearer credential authorizing data-API requests. Short-lived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

/// Credential used solely to mint new access tokens. Long-lived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unverified expiry check; see [`crate::token`].
    pub fn is_valid(&self, now_ms: i64) -> bool {
        token::is_valid(&self.0, now_ms)
    }
}

impl RefreshToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Session
///
/// The pair of session cookies as seen on one request. Built once per request
/// and passed by value into the gate decision; nothing caches it across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access: Option<AccessToken>,
    pub refresh: Option<RefreshToken>,
}

impl Session {
    pub fn new(access: Option<AccessToken>, refresh: Option<RefreshToken>) -> Self {
        Self { access, refresh }
    }

    /// Reads both cookies from every `Cookie` header on the request.
    /// Empty values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            access: get_cookie(headers, ACCESS_COOKIE).map(AccessToken),
            refresh: get_cookie(headers, REFRESH_COOKIE).map(RefreshToken),
        }
    }

    /// Access token present and unexpired.
    pub fn is_authenticated(&self, now_ms: i64) -> bool {
        self.access.as_ref().is_some_and(|access| access.is_valid(now_ms))
    }

    /// A refresh token exists, so an expired access token can be renewed.
    pub fn is_recoverable(&self) -> bool {
        self.refresh.is_some()
    }
}

/// Extracts a non-empty cookie value from the request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|raw| find_cookie(raw, name))
        .filter(|value| !value.is_empty())
}
