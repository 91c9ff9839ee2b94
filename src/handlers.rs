use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    api::{ApiClient, ApiError},
    cookies::{ACCESS_COOKIE, REFRESH_COOKIE, access_cookie, clear_cookie, refresh_cookie},
    events::AuthEvent,
    gate::{DASHBOARD_PATH, LOGIN_PATH},
    identity::IdentityError,
    models::{
        AnalyticsParams, AnalyticsResponse, DashboardOverview, ErrorDetail, LeaderboardResponse,
        LoginRequest, ModerationParams, ModerationResponse, PageParams, Profile, RefreshParams,
        SupportConversationList, UserFilter, UsersResponse,
    },
    session::Session,
};

// --- Session Plumbing ---

/// Only same-origin absolute paths are followed; anything else lands on the dashboard.
/// Control characters are rejected too, since they cannot go into a `Location` header.
pub fn redirect_target(requested: Option<&str>) -> &str {
    match requested {
        Some(path) if is_local_path(path) => path,
        _ => DASHBOARD_PATH,
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control)
}

/// Clears both cookies and sends the browser to the login page.
pub fn logout_response(state: &AppState, redirect: Redirect) -> Response {
    let secure = state.config.secure_cookies();
    state.events.emit(AuthEvent::LoggedOut);
    (
        AppendHeaders([
            (header::SET_COOKIE, clear_cookie(ACCESS_COOKIE, secure)),
            (header::SET_COOKIE, clear_cookie(REFRESH_COOKIE, secure)),
        ]),
        redirect,
    )
        .into_response()
}

/// generate_token
///
/// Silent refresh. Reached only by redirect from the gate, which never matches
/// this path. Exchanges the `refresh` cookie for a new access token and sends the
/// browser back where it was going. Any failure becomes a logout; nothing retries.
#[utoipa::path(
    get,
    path = "/api/generateToken",
    params(RefreshParams),
    responses(
        (
            status = 307,
            description = "Access cookie renewed and redirected to `redirect`, \
                or cookies cleared and redirected to `/`"
        )
    )
)]
pub async fn generate_token(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    headers: HeaderMap,
) -> Response {
    let Some(refresh) = Session::from_headers(&headers).refresh else {
        tracing::info!("refresh requested without a refresh token");
        return logout_response(&state, Redirect::temporary(LOGIN_PATH));
    };

    match state.identity.refresh_access(refresh.as_str()).await {
        Ok(access) => {
            let target = redirect_target(params.redirect.as_deref());
            tracing::info!(redirect = target, "access token renewed");
            let cookie = access_cookie(&access, state.config.secure_cookies(), Utc::now());
            state.events.emit(AuthEvent::AccessChanged);
            (
                AppendHeaders([(header::SET_COOKIE, cookie)]),
                Redirect::temporary(target),
            )
                .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "token refresh failed, logging out");
            logout_response(&state, Redirect::temporary(LOGIN_PATH))
        }
    }
}

/// login
///
/// Exchanges credentials for a token pair and seeds both cookies.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 204, description = "Signed in; access and refresh cookies set"),
        (status = 401, description = "Credentials rejected", body = ErrorDetail),
        (status = 502, description = "Identity service unavailable", body = ErrorDetail)
    )
)]
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    match state.identity.login(&payload).await {
        Ok(tokens) => {
            let secure = state.config.secure_cookies();
            let now = Utc::now();
            let cookies = AppendHeaders([
                (header::SET_COOKIE, access_cookie(&tokens.access, secure, now)),
                (header::SET_COOKIE, refresh_cookie(&tokens.refresh, secure, now)),
            ]);
            state.events.emit(AuthEvent::AccessChanged);
            state.events.emit(AuthEvent::RefreshChanged);
            (StatusCode::NO_CONTENT, cookies, ()).into_response()
        }
        Err(IdentityError::Rejected { detail, .. }) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorDetail {
                detail: detail.unwrap_or_else(|| "Invalid credentials".to_string()),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "login failed upstream");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorDetail {
                    detail: "Identity service unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// logout
///
/// Clears both cookies. 303 so the browser follows with a GET.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 303, description = "Cookies cleared, redirected to `/`"))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    logout_response(&state, Redirect::to(LOGIN_PATH))
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Mathos Admin</title></head>
<body>
<form id="login">
  <input name="email" type="email" placeholder="Email" required>
  <input name="password" type="password" placeholder="Password" required>
  <button type="submit">Sign in</button>
  <p id="error" role="alert"></p>
</form>
<script>
document.getElementById("login").addEventListener("submit", async (event) => {
  event.preventDefault();
  const form = new FormData(event.target);
  const res = await fetch("/api/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
  });
  if (res.ok) { window.location.assign("/dashboard"); return; }
  const body = await res.json().catch(() => ({}));
  document.getElementById("error").textContent = body.detail || "Invalid credentials";
});
</script>
</body>
</html>"#;

/// Public root. Signed-in users never see it; the gate sends them to the dashboard.
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

// --- Dashboard Views ---

/// Data API client carrying the access token of the request being served.
fn data_api(state: &AppState, session: Session) -> ApiClient {
    ApiClient::new(state.http.clone(), &state.config.api_base_url, Arc::new(session))
}

/// Authorization answers are passed through; everything else is the upstream's fault.
fn upstream_failure(err: ApiError) -> StatusCode {
    tracing::warn!(error = %err, "data API call failed");
    match err.status() {
        Some(status)
            if status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || status == StatusCode::NOT_FOUND =>
        {
            status
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Platform overview", body = DashboardOverview))
)]
pub async fn dashboard_overview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardOverview>, StatusCode> {
    data_api(&state, session)
        .overview()
        .await
        .map(Json)
        .map_err(upstream_failure)
}

#[utoipa::path(
    get,
    path = "/dashboard/users",
    params(UserFilter),
    responses((status = 200, description = "User management listing", body = UsersResponse))
)]
pub async fn dashboard_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<UsersResponse>, StatusCode> {
    data_api(&state, session)
        .users(&filter)
        .await
        .map(Json)
        .map_err(upstream_failure)
}

#[utoipa::path(
    get,
    path = "/dashboard/analytics",
    params(AnalyticsParams),
    responses((status = 200, description = "Usage analytics", body = AnalyticsResponse))
)]
pub async fn dashboard_analytics(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsResponse>, StatusCode> {
    data_api(&state, session)
        .analytics(&params)
        .await
        .map(Json)
        .map_err(upstream_failure)
}

#[utoipa::path(
    get,
    path = "/dashboard/leaderboard",
    responses((status = 200, description = "Ranking", body = LeaderboardResponse))
)]
pub async fn dashboard_leaderboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<LeaderboardResponse>, StatusCode> {
    data_api(&state, session)
        .leaderboard()
        .await
        .map(Json)
        .map_err(upstream_failure)
}

#[utoipa::path(
    get,
    path = "/dashboard/moderation",
    params(ModerationParams),
    responses((status = 200, description = "Moderation queue", body = ModerationResponse))
)]
pub async fn dashboard_moderation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<ModerationParams>,
) -> Result<Json<ModerationResponse>, StatusCode> {
    data_api(&state, session)
        .moderation(&params)
        .await
        .map(Json)
        .map_err(upstream_failure)
}

#[utoipa::path(
    get,
    path = "/dashboard/support",
    params(PageParams),
    responses((status = 200, description = "Support inbox", body = SupportConversationList))
)]
pub async fn dashboard_support(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<PageParams>,
) -> Result<Json<SupportConversationList>, StatusCode> {
    data_api(&state, session)
        .support_conversations(&params)
        .await
        .map(Json)
        .map_err(upstream_failure)
}

#[utoipa::path(
    get,
    path = "/dashboard/settings",
    responses((status = 200, description = "Signed-in admin's profile", body = Profile))
)]
pub async fn dashboard_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Profile>, StatusCode> {
    data_api(&state, session)
        .profile()
        .await
        .map(Json)
        .map_err(upstream_failure)
}
