//! Unverified inspection of JWT-shaped access tokens.
//!
//! Nothing here checks a signature. Reading `exp` only saves a refresh round
//! trip for tokens that are obviously stale; the upstream API still rejects
//! forged or expired bearer tokens on every data request.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),
    #[error("payload segment is not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload has no numeric exp claim")]
    MissingExp,
}

/// Decodes the claims segment of `token` without verifying it.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    // Accept both alphabets and optional padding; issuers are not consistent.
    let payload: String = segments[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;

    match serde_json::from_slice(&bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(TokenError::NotAnObject),
    }
}

/// Expiry of `token` in milliseconds since the epoch.
pub fn expires_at_ms(token: &str) -> Result<f64, TokenError> {
    decode_claims(token)?
        .get("exp")
        .and_then(Value::as_f64)
        .map(|exp| exp * 1000.0)
        .ok_or(TokenError::MissingExp)
}

/// True only when `token` carries a numeric `exp` strictly after `now_ms`.
pub fn is_valid(token: &str, now_ms: i64) -> bool {
    match expires_at_ms(token) {
        Ok(expires) => expires > now_ms as f64,
        Err(err) => {
            tracing::debug!(error = %err, "treating undecodable access token as expired");
            false
        }
    }
}

/// Inverse of [`is_valid`]; any decode failure counts as expired.
pub fn is_expired(token: &str, now_ms: i64) -> bool {
    !is_valid(token, now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn token_with(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn future_exp_is_valid() {
        let token = token_with(r#"{"exp":1700000060,"user_id":"7"}"#);
        assert!(is_valid(&token, NOW_MS));
    }

    #[test]
    fn past_exp_is_expired() {
        let token = token_with(r#"{"exp":1699999940}"#);
        assert!(is_expired(&token, NOW_MS));
    }

    #[test]
    fn exp_equal_to_now_is_expired() {
        let token = token_with(r#"{"exp":1700000000}"#);
        assert!(is_expired(&token, NOW_MS));
    }

    #[test]
    fn fractional_exp_is_compared_in_millis() {
        let token = token_with(r#"{"exp":1700000000.5}"#);
        assert!(is_valid(&token, NOW_MS));
        assert!(is_expired(&token, NOW_MS + 500));
    }

    #[test]
    fn missing_or_non_numeric_exp_is_expired() {
        assert!(is_expired(&token_with(r#"{"sub":"1"}"#), NOW_MS));
        assert!(is_expired(&token_with(r#"{"exp":"1800000000"}"#), NOW_MS));
        assert!(is_expired(&token_with(r#"{"exp":null}"#), NOW_MS));
    }

    #[test]
    fn wrong_segment_count_is_expired() {
        assert!(is_expired("", NOW_MS));
        assert!(is_expired("onlyone", NOW_MS));
        assert!(is_expired("two.segments", NOW_MS));
        assert!(is_expired("a.b.c.d", NOW_MS));
        assert!(matches!(
            decode_claims("two.segments"),
            Err(TokenError::Segments(2))
        ));
    }

    #[test]
    fn non_json_payload_is_expired() {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(is_expired(&token, NOW_MS));
        assert!(matches!(decode_claims(&token), Err(TokenError::Json(_))));
    }

    #[test]
    fn non_object_payload_is_expired() {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1,2,3]"));
        assert!(matches!(decode_claims(&token), Err(TokenError::NotAnObject)));
    }

    #[test]
    fn garbage_base64_is_expired() {
        assert!(is_expired("h.!!!not-base64!!!.s", NOW_MS));
    }

    #[test]
    fn padded_standard_alphabet_payload_decodes() {
        let token = format!("h.{}.s", STANDARD.encode(r#"{"exp":1800000000,"n":"??>"}"#));
        assert!(is_valid(&token, NOW_MS));
    }
}
