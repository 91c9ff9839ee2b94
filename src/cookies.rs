//! Session cookies: names, attributes, parsing, and the client-side store.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::events::{AuthEvent, AuthEventBus};

/// Cookie holding the short-lived access token. Readable by script.
pub const ACCESS_COOKIE: &str = "access";

/// Cookie holding the long-lived refresh token.
pub const REFRESH_COOKIE: &str = "refresh";

/// Access token lifetime on the cookie side (5 minutes).
pub const ACCESS_TTL_SECS: i64 = 5 * 60;

/// Refresh token lifetime on the cookie side (30 days).
pub const REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Longest lifetime a cookie write may ask for (400 days, the browser cap).
pub const MAX_COOKIE_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// Clamps a requested lifetime into `0..=MAX_COOKIE_AGE_SECS`. NaN counts as 0.
fn clamp_age_secs(secs: f64) -> i64 {
    if secs.is_nan() {
        return 0;
    }
    secs.round().clamp(0.0, MAX_COOKIE_AGE_SECS as f64) as i64
}

/// `now + secs`, saturating at the lifetime cap instead of overflowing.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    let capped = secs.clamp(0, MAX_COOKIE_AGE_SECS);
    Duration::try_seconds(capped)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(now)
}

/// Formats a `Set-Cookie` value with the attributes shared by both session cookies:
/// URL-encoded value, absolute expiry, `Path=/`, `SameSite=Strict`, `Secure` on request.
pub fn set_cookie_value(
    name: &str,
    value: &str,
    expires: DateTime<Utc>,
    max_age_secs: i64,
    secure: bool,
) -> String {
    let mut cookie = format!(
        "{name}={}; Expires={}; Max-Age={}; Path=/; SameSite=Strict",
        urlencoding::encode(value),
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        max_age_secs.max(0),
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value issuing a fresh access token.
pub fn access_cookie(token: &str, secure: bool, now: DateTime<Utc>) -> String {
    set_cookie_value(
        ACCESS_COOKIE,
        token,
        now + Duration::seconds(ACCESS_TTL_SECS),
        ACCESS_TTL_SECS,
        secure,
    )
}

/// `Set-Cookie` value issuing a refresh token.
pub fn refresh_cookie(token: &str, secure: bool, now: DateTime<Utc>) -> String {
    set_cookie_value(
        REFRESH_COOKIE,
        token,
        now + Duration::seconds(REFRESH_TTL_SECS),
        REFRESH_TTL_SECS,
        secure,
    )
}

/// `Set-Cookie` value deleting `name` (epoch expiry).
pub fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie_value(
        name,
        "",
        DateTime::from_timestamp(0, 0).unwrap_or_default(),
        0,
        secure,
    )
}

/// Finds `name` in a `Cookie`-header style string (`a=1; b=2`) and returns the
/// decoded value of the first match. Values that fail to decode are returned raw.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| decode_value(value.trim()))
    })
}

fn decode_value(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// CookieDocument
///
/// The client's persistent cookie storage, seen through the same two operations
/// a browser document exposes: read the whole header, write one `Set-Cookie` line.
pub trait CookieDocument: Send + Sync {
    fn cookie_header(&self) -> String;
    fn write_cookie(&self, set_cookie: &str);
}

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    expires: Option<DateTime<Utc>>,
}

/// MemoryDocument
///
/// In-memory cookie jar honoring `Expires`/`Max-Age`. Backs headless sessions
/// (scripts, tests) where no browser owns the cookies.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    cookies: Mutex<Vec<StoredCookie>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieDocument for MemoryDocument {
    fn cookie_header(&self) -> String {
        let now = Utc::now();
        let cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies
            .iter()
            .filter(|cookie| cookie.expires.is_none_or(|at| at > now))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write_cookie(&self, set_cookie: &str) {
        let mut parts = set_cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.trim().split_once('=')) else {
            tracing::warn!(cookie = set_cookie, "ignoring malformed cookie write");
            return;
        };

        let now = Utc::now();
        let mut expires = None;
        let mut max_age = None;
        for attribute in parts {
            let Some((key, val)) = attribute.trim().split_once('=') else {
                continue;
            };
            if key.eq_ignore_ascii_case("max-age") {
                max_age = val.trim().parse::<i64>().ok();
            } else if key.eq_ignore_ascii_case("expires") {
                expires = DateTime::parse_from_rfc2822(val.trim())
                    .ok()
                    .map(|at| at.with_timezone(&Utc));
            }
        }
        // Max-Age wins over Expires.
        if let Some(seconds) = max_age {
            expires = Some(expiry_after(now, seconds));
        }

        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.retain(|cookie| cookie.name != name.trim());
        if expires.is_none_or(|at| at > now) {
            cookies.push(StoredCookie {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
                expires,
            });
        }
    }
}

/// CookieStore
///
/// Client-side read/write of the session cookies. Writing or deleting `access`
/// or `refresh` emits the matching [`AuthEvent`] before returning.
///
/// A detached store (no document, e.g. while rendering on the server) silently
/// ignores writes and reads nothing.
#[derive(Clone)]
pub struct CookieStore {
    document: Option<Arc<dyn CookieDocument>>,
    events: AuthEventBus,
    secure: bool,
}

impl CookieStore {
    pub fn new(document: Arc<dyn CookieDocument>, events: AuthEventBus, secure: bool) -> Self {
        Self {
            document: Some(document),
            events,
            secure,
        }
    }

    pub fn detached(events: AuthEventBus) -> Self {
        Self {
            document: None,
            events,
            secure: false,
        }
    }

    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    /// Writes `name=value` expiring `ttl_days` from now (fractions allowed).
    pub fn set(&self, name: &str, value: &str, ttl_days: f64) {
        let Some(document) = &self.document else {
            return;
        };

        let ttl_secs = clamp_age_secs(ttl_days * SECONDS_PER_DAY);
        let expires = expiry_after(Utc::now(), ttl_secs);
        document.write_cookie(&set_cookie_value(name, value, expires, ttl_secs, self.secure));

        match name {
            ACCESS_COOKIE => self.events.emit(AuthEvent::AccessChanged),
            REFRESH_COOKIE => self.events.emit(AuthEvent::RefreshChanged),
            _ => {}
        }
    }

    pub fn remove(&self, name: &str) {
        let Some(document) = &self.document else {
            return;
        };

        document.write_cookie(&clear_cookie(name, self.secure));

        if name == ACCESS_COOKIE || name == REFRESH_COOKIE {
            self.events.emit(AuthEvent::LoggedOut);
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let document = self.document.as_ref()?;
        find_cookie(&document.cookie_header(), name)
    }
}
