//! services/api/src/web/cookies.rs
//!
//! The browser-side auth artifacts. Tokens from the identity provider are kept
//! in HttpOnly cookies; signing out expires all of them.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use study_assistant_core::domain::AuthTokens;

pub const ACCESS_TOKEN: &str = "sb-access-token";
pub const REFRESH_TOKEN: &str = "sb-refresh-token";
pub const EXPIRES_AT: &str = "sb-expires-at";
pub const PKCE_VERIFIER: &str = "sb-pkce-verifier";

/// Every cookie this service ever sets.
pub const ALL: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, EXPIRES_AT, PKCE_VERIFIER];

/// Access tokens this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;
const PKCE_MAX_AGE_SECS: i64 = 60 * 10;

/// Reads one cookie value from the request headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name && !value.is_empty()).then_some(value)
        })
}

/// Whether the stored expiry says the access token must be refreshed first.
pub fn access_token_expired(headers: &HeaderMap) -> bool {
    read_cookie(headers, EXPIRES_AT)
        .and_then(|v| v.parse::<i64>().ok())
        .map(|exp| Utc::now().timestamp() >= exp - REFRESH_MARGIN_SECS)
        .unwrap_or(false)
}

fn build(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        name,
        value,
        if secure { " Secure;" } else { "" },
        max_age
    )
}

/// The `Set-Cookie` values that store a fresh set of tokens.
pub fn session_cookies(tokens: &AuthTokens, secure: bool) -> Vec<String> {
    vec![
        build(ACCESS_TOKEN, &tokens.access_token, SESSION_MAX_AGE_SECS, secure),
        build(REFRESH_TOKEN, &tokens.refresh_token, SESSION_MAX_AGE_SECS, secure),
        build(
            EXPIRES_AT,
            &tokens.expires_at.timestamp().to_string(),
            SESSION_MAX_AGE_SECS,
            secure,
        ),
    ]
}

/// Stores the PKCE verifier for the duration of one OAuth round trip.
pub fn pkce_cookie(verifier: &str, secure: bool) -> String {
    build(PKCE_VERIFIER, verifier, PKCE_MAX_AGE_SECS, secure)
}

pub fn clear_pkce_cookie(secure: bool) -> String {
    build(PKCE_VERIFIER, "", 0, secure)
}

/// The `Set-Cookie` values that expire every auth artifact.
pub fn clear_auth_cookies(secure: bool) -> Vec<String> {
    ALL.iter().map(|name| build(name, "", 0, secure)).collect()
}
