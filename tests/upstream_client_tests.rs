use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use mathos_admin::{
    AuthEventBus, IdentityApi, ReqwestIdentityClient, SessionClient,
    api::{ApiClient, ApiError, Tag, TagKind, TokenSource},
    cookies::{ACCESS_COOKIE, CookieDocument, CookieStore, MemoryDocument, REFRESH_COOKIE},
    identity::{IdentityError, IdentityState},
    models::{
        BanRequest, BanResponse, LoginRequest, ModerationParams, ModerationResponse, User,
        UserFilter, UsersResponse,
    },
};
use serde_json::{Value, json};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::net::TcpListener;

// --- Stub Upstream ---

/// Records every request it receives, keyed by path, together with the
/// `Authorization` header that came with it.
#[derive(Default)]
struct StubUpstream {
    calls: Mutex<HashMap<&'static str, Vec<Option<String>>>>,
    /// When false, the refresh endpoint answers 401.
    accept_refresh: bool,
    /// Users banned through the ban endpoint; reflected in the user listing.
    banned: Mutex<HashSet<String>>,
    /// Delay before the user listing is sent, taken after the body is built.
    users_delay_ms: AtomicU64,
}

impl StubUpstream {
    fn record(&self, path: &'static str, headers: &HeaderMap) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.calls
            .lock()
            .unwrap()
            .entry(path)
            .or_default()
            .push(auth);
    }

    fn hits(&self, path: &'static str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(path)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn last_auth(&self, path: &'static str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .get(path)
            .and_then(|calls| calls.last().cloned())
            .flatten()
    }
}

const USERS: &str = "/admin-api/user-management/";
const MODERATION: &str = "/admin-api/moderation/";
const BAN: &str = "/admin-api/ban/";
const LOGIN: &str = "/auth/login/";
const REFRESH: &str = "/auth/generate-access-token/";

async fn users(State(stub): State<Arc<StubUpstream>>, headers: HeaderMap) -> Json<UsersResponse> {
    stub.record(USERS, &headers);
    let is_banned = stub.banned.lock().unwrap().contains("u-1");
    let page = UsersResponse {
        count: 1,
        results: vec![User {
            id: "u-1".into(),
            email: "student@mathos.cloud".into(),
            is_banned,
            ..Default::default()
        }],
        ..Default::default()
    };

    let delay = stub.users_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    Json(page)
}

async fn moderation(
    State(stub): State<Arc<StubUpstream>>,
    headers: HeaderMap,
) -> Json<ModerationResponse> {
    stub.record(MODERATION, &headers);
    Json(ModerationResponse::default())
}

async fn ban(
    State(stub): State<Arc<StubUpstream>>,
    headers: HeaderMap,
    Json(body): Json<BanRequest>,
) -> Json<BanResponse> {
    stub.record(BAN, &headers);
    stub.banned.lock().unwrap().insert(body.user_id);
    Json(BanResponse {
        msg: "User banned".into(),
        error: None,
    })
}

async fn login(
    State(stub): State<Arc<StubUpstream>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    stub.record(LOGIN, &headers);
    if body.password == "correct-horse" {
        Ok(Json(json!({ "access": "access-1", "refresh": "refresh-1" })))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        ))
    }
}

async fn refresh(
    State(stub): State<Arc<StubUpstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    stub.record(REFRESH, &headers);
    if stub.accept_refresh && body["refresh"] == "refresh-1" {
        Ok(Json(json!({ "access": "access-2" })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn spawn_upstream(stub: Arc<StubUpstream>) -> String {
    let router = Router::new()
        .route(USERS, get(users))
        .route(MODERATION, get(moderation))
        .route(BAN, post(ban))
        .route(LOGIN, post(login))
        .route(REFRESH, post(refresh))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    address
}

struct FixedToken(Option<&'static str>);

impl TokenSource for FixedToken {
    fn access_token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn identity(address: &str) -> IdentityState {
    Arc::new(ReqwestIdentityClient::new(address, Duration::from_secs(5)).unwrap())
}

fn session_client(address: &str) -> (SessionClient, Arc<MemoryDocument>) {
    let document = Arc::new(MemoryDocument::new());
    let cookies = CookieStore::new(document.clone(), AuthEventBus::new(), false);
    let client = SessionClient::new(identity(address), cookies, reqwest::Client::new(), address);
    (client, document)
}

// --- Data API Client ---

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let api = ApiClient::new(
        reqwest::Client::new(),
        &address,
        Arc::new(FixedToken(Some("token-123"))),
    );

    api.users(&UserFilter::default()).await.unwrap();

    assert_eq!(stub.last_auth(USERS).as_deref(), Some("Bearer token-123"));
}

#[tokio::test]
async fn test_requests_without_token_go_out_bare() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let api = ApiClient::new(reqwest::Client::new(), &address, Arc::new(FixedToken(None)));

    api.moderation(&ModerationParams::default()).await.unwrap();

    assert_eq!(stub.hits(MODERATION), 1);
    assert_eq!(stub.last_auth(MODERATION), None);
}

#[tokio::test]
async fn test_reads_are_cached_until_invalidated() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let api = ApiClient::new(
        reqwest::Client::new(),
        &address,
        Arc::new(FixedToken(Some("token-123"))),
    );
    let params = ModerationParams::default();

    api.moderation(&params).await.unwrap();
    api.moderation(&params).await.unwrap();
    assert_eq!(stub.hits(MODERATION), 1, "second read should be served from cache");

    api.ban_user("u-1").await.unwrap();
    api.moderation(&params).await.unwrap();
    assert_eq!(stub.hits(MODERATION), 2, "ban should invalidate the moderation queue");
}

#[tokio::test]
async fn test_invalidating_one_user_refreshes_listing() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let api = ApiClient::new(reqwest::Client::new(), &address, Arc::new(FixedToken(None)));
    let filter = UserFilter::default();

    let page = api.users(&filter).await.unwrap();
    assert_eq!(page.results[0].id, "u-1");

    // Unrelated user: listing stays cached.
    api.cache().invalidate(&[Tag::with_id(TagKind::User, "u-9")]);
    api.users(&filter).await.unwrap();
    assert_eq!(stub.hits(USERS), 1);

    api.cache().invalidate(&[Tag::with_id(TagKind::User, "u-1")]);
    api.users(&filter).await.unwrap();
    assert_eq!(stub.hits(USERS), 2);
}

#[tokio::test]
async fn test_ban_refreshes_user_listing() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let api = ApiClient::new(reqwest::Client::new(), &address, Arc::new(FixedToken(None)));
    let filter = UserFilter::default();

    let before = api.users(&filter).await.unwrap();
    assert!(!before.results[0].is_banned);

    api.ban_user("u-1").await.unwrap();
    let after = api.users(&filter).await.unwrap();

    assert_eq!(stub.hits(USERS), 2, "ban should invalidate listings showing the user");
    assert!(after.results[0].is_banned);
}

#[tokio::test]
async fn test_read_racing_a_mutation_is_not_cached() {
    let stub = Arc::new(StubUpstream::default());
    stub.users_delay_ms.store(300, Ordering::SeqCst);
    let address = spawn_upstream(stub.clone()).await;
    let api = ApiClient::new(reqwest::Client::new(), &address, Arc::new(FixedToken(None)));

    // Slow read starts before the ban and answers with the pre-ban listing.
    let slow = {
        let api = api.clone();
        tokio::spawn(async move { api.users(&UserFilter::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    api.ban_user("u-1").await.unwrap();
    let stale = slow.await.unwrap().unwrap();
    assert!(!stale.results[0].is_banned);

    stub.users_delay_ms.store(0, Ordering::SeqCst);
    let fresh = api.users(&UserFilter::default()).await.unwrap();

    assert_eq!(stub.hits(USERS), 2, "stale listing must not be served from cache");
    assert!(fresh.results[0].is_banned);
}

#[tokio::test]
async fn test_logout_during_read_leaves_cache_empty() {
    let stub = Arc::new(StubUpstream::default());
    stub.users_delay_ms.store(300, Ordering::SeqCst);
    let address = spawn_upstream(stub).await;
    let api = ApiClient::new(reqwest::Client::new(), &address, Arc::new(FixedToken(None)));
    let events = AuthEventBus::new();
    let _reset = api.clear_cache_on_logout(&events);

    let slow = {
        let api = api.clone();
        tokio::spawn(async move { api.users(&UserFilter::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    events.emit(mathos_admin::AuthEvent::LoggedOut);
    slow.await.unwrap().unwrap();

    assert!(api.cache().is_empty());
}

#[tokio::test]
async fn test_upstream_status_is_reported() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub).await;
    let api = ApiClient::new(reqwest::Client::new(), &address, Arc::new(FixedToken(None)));

    let err = api.leaderboard().await.unwrap_err();

    assert!(matches!(err, ApiError::Status { .. }));
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

// --- Identity Client ---

#[tokio::test]
async fn test_identity_login_returns_token_pair() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub).await;

    let tokens = identity(&address)
        .login(&LoginRequest {
            email: "admin@mathos.cloud".into(),
            password: "correct-horse".into(),
        })
        .await
        .unwrap();

    assert_eq!(tokens.access, "access-1");
    assert_eq!(tokens.refresh, "refresh-1");
}

#[tokio::test]
async fn test_identity_login_rejection_keeps_detail() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub).await;

    let err = identity(&address)
        .login(&LoginRequest {
            email: "admin@mathos.cloud".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    match err {
        IdentityError::Rejected { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(
                detail.as_deref(),
                Some("No active account found with the given credentials")
            );
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_identity_refresh_is_a_single_call() {
    let stub = Arc::new(StubUpstream {
        accept_refresh: true,
        ..Default::default()
    });
    let address = spawn_upstream(stub.clone()).await;

    let access = identity(&address).refresh_access("refresh-1").await.unwrap();

    assert_eq!(access, "access-2");
    assert_eq!(stub.hits(REFRESH), 1);
}

#[tokio::test]
async fn test_identity_unreachable_is_transport_error() {
    // Nothing listens on a port we just released.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = identity(&address).refresh_access("refresh-1").await.unwrap_err();

    assert!(matches!(err, IdentityError::Transport(_)));
}

// --- Session Client ---

#[tokio::test]
async fn test_session_login_seeds_cookies_and_authorizes_calls() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let (client, document) = session_client(&address);

    client.login("admin@mathos.cloud", "correct-horse").await.unwrap();

    let jar = document.cookie_header();
    assert!(jar.contains("access=access-1"));
    assert!(jar.contains("refresh=refresh-1"));

    client.api().users(&UserFilter::default()).await.unwrap();
    assert_eq!(stub.last_auth(USERS).as_deref(), Some("Bearer access-1"));
}

#[tokio::test]
async fn test_session_refresh_replaces_access_cookie() {
    let stub = Arc::new(StubUpstream {
        accept_refresh: true,
        ..Default::default()
    });
    let address = spawn_upstream(stub).await;
    let (client, _) = session_client(&address);
    client.login("admin@mathos.cloud", "correct-horse").await.unwrap();

    client.refresh().await.unwrap();

    assert_eq!(client.cookies().get(ACCESS_COOKIE).as_deref(), Some("access-2"));
    assert_eq!(client.cookies().get(REFRESH_COOKIE).as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_session_refresh_failure_logs_out() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub).await;
    let (client, _) = session_client(&address);
    client.login("admin@mathos.cloud", "correct-horse").await.unwrap();

    assert!(client.refresh().await.is_err());

    assert_eq!(client.cookies().get(ACCESS_COOKIE), None);
    assert_eq!(client.cookies().get(REFRESH_COOKIE), None);
}

#[tokio::test]
async fn test_session_logout_drops_cached_reads() {
    let stub = Arc::new(StubUpstream::default());
    let address = spawn_upstream(stub.clone()).await;
    let (client, _) = session_client(&address);
    client.login("admin@mathos.cloud", "correct-horse").await.unwrap();
    client.api().users(&UserFilter::default()).await.unwrap();
    assert!(!client.api().cache().is_empty());

    client.logout();

    assert!(client.api().cache().is_empty());
    assert!(!client.is_authenticated());
}
