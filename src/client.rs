//! Client-side session: the cookie store, the identity API, and a data API
//! client wired together the way the dashboard uses them.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    api::{ApiClient, ApiError},
    cookies::{ACCESS_COOKIE, ACCESS_TTL_SECS, CookieStore, REFRESH_COOKIE, REFRESH_TTL_SECS},
    events::Subscription,
    identity::{IdentityError, IdentityState},
    models::{LoginRequest, UpdateProfileRequest, UpdateProfileResponse},
    session::{AccessToken, RefreshToken, Session},
};

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

pub struct SessionClient {
    identity: IdentityState,
    cookies: CookieStore,
    api: ApiClient,
    _cache_reset: Subscription,
}

impl SessionClient {
    /// Builds an API client that reads its bearer token from `cookies` and drops
    /// its cache whenever the cookie store reports a logout.
    pub fn new(
        identity: IdentityState,
        cookies: CookieStore,
        http: reqwest::Client,
        api_base_url: &str,
    ) -> Self {
        let api = ApiClient::new(http, api_base_url, Arc::new(cookies.clone()));
        let cache_reset = api.clear_cache_on_logout(cookies.events());
        Self {
            identity,
            cookies,
            api,
            _cache_reset: cache_reset,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// The cookies as they are right now.
    pub fn session(&self) -> Session {
        Session::new(
            self.cookies
                .get(ACCESS_COOKIE)
                .filter(|v| !v.is_empty())
                .map(AccessToken::new),
            self.cookies
                .get(REFRESH_COOKIE)
                .filter(|v| !v.is_empty())
                .map(RefreshToken::new),
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated(Utc::now().timestamp_millis())
    }

    /// Logs in and seeds both cookies.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), IdentityError> {
        let tokens = self
            .identity
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.cookies.set(
            ACCESS_COOKIE,
            &tokens.access,
            ACCESS_TTL_SECS as f64 / SECONDS_PER_DAY,
        );
        self.cookies.set(
            REFRESH_COOKIE,
            &tokens.refresh,
            REFRESH_TTL_SECS as f64 / SECONDS_PER_DAY,
        );
        tracing::info!("signed in");
        Ok(())
    }

    /// Renews the access cookie from the refresh cookie. Any failure logs out;
    /// there is no retry.
    pub async fn refresh(&self) -> Result<(), IdentityError> {
        let Some(refresh) = self.cookies.get(REFRESH_COOKIE).filter(|v| !v.is_empty()) else {
            self.logout();
            return Err(IdentityError::Rejected {
                status: 401,
                detail: Some("no refresh token".into()),
            });
        };

        match self.identity.refresh_access(&refresh).await {
            Ok(access) => {
                self.cookies.set(
                    ACCESS_COOKIE,
                    &access,
                    ACCESS_TTL_SECS as f64 / SECONDS_PER_DAY,
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, signing out");
                self.logout();
                Err(err)
            }
        }
    }

    /// Clears both cookies. Each removal emits a logout event.
    pub fn logout(&self) {
        self.cookies.remove(ACCESS_COOKIE);
        self.cookies.remove(REFRESH_COOKIE);
    }

    /// Updates the profile and stores the access token upstream re-issued with it.
    pub async fn update_profile(
        &self,
        body: &UpdateProfileRequest,
    ) -> Result<UpdateProfileResponse, ApiError> {
        let updated = self.api.update_profile(body).await?;
        if !updated.access_token.is_empty() {
            self.cookies.set(
                ACCESS_COOKIE,
                &updated.access_token,
                ACCESS_TTL_SECS as f64 / SECONDS_PER_DAY,
            );
        }
        Ok(updated)
    }
}
