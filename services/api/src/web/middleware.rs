//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use study_assistant_core::domain::AuthTokens;
use study_assistant_core::ports::{PortError, PortResult};
use tracing::{debug, warn};

use crate::web::{
    cookies,
    rest::{ErrorBody, RestError},
    state::{AppState, CurrentUser},
    toast::{redirect_with_notice, Notice},
};

/// The outcome of reading the caller's auth cookies.
pub struct ResolvedSession {
    pub current: CurrentUser,
    /// Set when the access token had to be refreshed; the new tokens must be
    /// written back to the browser.
    pub refreshed: Option<AuthTokens>,
}

/// Identifies the caller from their cookies, refreshing an expired access token
/// with the refresh token when possible.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> PortResult<ResolvedSession> {
    let access_token = cookies::read_cookie(headers, cookies::ACCESS_TOKEN);
    let refresh_token = cookies::read_cookie(headers, cookies::REFRESH_TOKEN);
    let expired = cookies::access_token_expired(headers);

    match (access_token, refresh_token) {
        (Some(access_token), _) if !expired => {
            let user = state.auth.get_user(access_token).await?;
            Ok(ResolvedSession {
                current: CurrentUser {
                    user,
                    access_token: access_token.to_string(),
                },
                refreshed: None,
            })
        }
        (_, Some(refresh_token)) => {
            debug!("Access token expired or missing; refreshing.");
            let tokens = state.auth.refresh(refresh_token).await?;
            Ok(ResolvedSession {
                current: CurrentUser {
                    user: tokens.user.clone(),
                    access_token: tokens.access_token.clone(),
                },
                refreshed: Some(tokens),
            })
        }
        _ => Err(PortError::Unauthorized),
    }
}

/// Appends `Set-Cookie` headers for refreshed tokens to an outgoing response.
pub fn store_refreshed(response: &mut Response, refreshed: Option<&AuthTokens>, secure: bool) {
    let Some(tokens) = refreshed else { return };
    for cookie in cookies::session_cookies(tokens, secure) {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Refreshed token could not be stored as a cookie: {}", e),
        }
    }
}

/// Middleware for pages and the chat socket.
///
/// If the caller is signed in, inserts `CurrentUser` into request extensions.
/// Otherwise redirects to the sign-in page. Cookies are cleared only when the
/// identity provider rejected them; an unreachable provider leaves them intact.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, req.headers()).await {
        Ok(resolved) => {
            req.extensions_mut().insert(resolved.current);
            let mut response = next.run(req).await;
            store_refreshed(&mut response, resolved.refreshed.as_ref(), state.config.cookie_secure);
            response
        }
        Err(e) if e.is_auth() => (
            AppendHeaders(
                cookies::clear_auth_cookies(state.config.cookie_secure)
                    .into_iter()
                    .map(|c| (header::SET_COOKIE, c)),
            ),
            Redirect::to("/auth/sign-in"),
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to validate auth session: {}", e);
            redirect_with_notice("/auth/sign-in", Notice::SignInFailed).into_response()
        }
    }
}

/// Middleware for the JSON API. Same as `require_auth`, but answers 401 instead of
/// redirecting, and 502 when the identity provider could not be reached.
pub async fn require_api_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, req.headers()).await {
        Ok(resolved) => {
            req.extensions_mut().insert(resolved.current);
            let mut response = next.run(req).await;
            store_refreshed(&mut response, resolved.refreshed.as_ref(), state.config.cookie_secure);
            response
        }
        Err(e) if e.is_auth() => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to validate auth session: {}", e);
            RestError::from(e).into_response()
        }
    }
}
