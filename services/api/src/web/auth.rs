//! services/api/src/web/auth.rs
//!
//! Authentication pages: password sign-in, sign-up, the OAuth round trip and sign-out.
//! Credentials are checked by the hosted identity provider; this module only moves
//! its tokens in and out of cookies.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use study_assistant_core::domain::AuthTokens;
use study_assistant_core::ports::PortError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::{
    cookies,
    state::AppState,
    toast::{redirect_with_notice, Notice, NoticeParams, Toast},
    views::{render, SignInPage, SignUpPage},
};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Stores `tokens` and sends the browser to the dashboard.
fn signed_in_response(tokens: &AuthTokens, secure: bool) -> Response {
    let mut set_cookies = cookies::session_cookies(tokens, secure);
    set_cookies.push(cookies::clear_pkce_cookie(secure));
    (
        AppendHeaders(set_cookies.into_iter().map(|c| (header::SET_COOKIE, c))),
        Redirect::to("/dashboard"),
    )
        .into_response()
}

fn sign_in_error(state: &AppState, email: String, message: &str) -> Response {
    render(&SignInPage {
        toast: Some(Toast::error(message)),
        error: Some(message.to_string()),
        email,
        oauth_provider: state.config.oauth_provider.clone(),
    })
}

/// A verifier for the `plain` PKCE method: 64 unreserved characters.
fn new_code_verifier() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /auth/sign-in
pub async fn sign_in_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NoticeParams>,
) -> Response {
    render(&SignInPage {
        toast: params.into_toast(),
        error: None,
        email: String::new(),
        oauth_provider: state.config.oauth_provider.clone(),
    })
}

/// POST /auth/sign-in
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state
        .auth
        .sign_in_with_password(&form.email, &form.password)
        .await
    {
        Ok(tokens) => signed_in_response(&tokens, state.config.cookie_secure),
        Err(PortError::Unauthorized) => {
            info!("Password sign-in rejected.");
            sign_in_error(&state, form.email, "Invalid email or password")
        }
        Err(e) => {
            error!("Failed to sign in: {}", e);
            sign_in_error(&state, form.email, "An unexpected error occurred")
        }
    }
}

/// GET /auth/sign-up
pub async fn sign_up_page(Query(params): Query<NoticeParams>) -> Response {
    render(&SignUpPage {
        toast: params.into_toast(),
        error: None,
        email: String::new(),
    })
}

/// POST /auth/sign-up
pub async fn sign_up_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state.auth.sign_up(&form.email, &form.password).await {
        Ok(Some(tokens)) => signed_in_response(&tokens, state.config.cookie_secure),
        Ok(None) => redirect_with_notice("/auth/sign-in", Notice::ConfirmEmail).into_response(),
        Err(e) => {
            let message = match &e {
                PortError::Validation(msg) => msg.clone(),
                _ => {
                    error!("Failed to sign up: {}", e);
                    "An unexpected error occurred".to_string()
                }
            };
            render(&SignUpPage {
                toast: Some(Toast::error(message.clone())),
                error: Some(message),
                email: form.email,
            })
        }
    }
}

/// GET /auth/oauth/{provider} - Starts the provider's OAuth flow.
pub async fn oauth_start_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Response {
    let verifier = new_code_verifier();
    let url = state.auth.oauth_authorize_url(
        &provider,
        &state.config.oauth_callback_url(),
        &verifier,
    );
    info!("Starting OAuth sign-in with provider '{}'.", provider);
    (
        [(
            header::SET_COOKIE,
            cookies::pkce_cookie(&verifier, state.config.cookie_secure),
        )],
        Redirect::to(&url),
    )
        .into_response()
}

/// GET /auth/callback - Where the provider sends the browser back.
pub async fn oauth_callback_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    if let Some(err) = params.error {
        let message = params.error_description.unwrap_or(err);
        warn!("OAuth provider returned an error: {}", message);
        return redirect_with_notice("/auth/sign-in", Notice::SignInFailed).into_response();
    }

    let (Some(code), Some(verifier)) = (
        params.code,
        cookies::read_cookie(&headers, cookies::PKCE_VERIFIER),
    ) else {
        warn!("OAuth callback without a code or verifier.");
        return redirect_with_notice("/auth/sign-in", Notice::SignInFailed).into_response();
    };

    match state.auth.exchange_code(&code, verifier).await {
        Ok(tokens) => signed_in_response(&tokens, state.config.cookie_secure),
        Err(e) => {
            error!("Failed to exchange OAuth code: {}", e);
            redirect_with_notice("/auth/sign-in", Notice::SignInFailed).into_response()
        }
    }
}

/// POST /auth/sign-out - Ends every session of the user and clears local auth state.
pub async fn sign_out_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let clear = AppendHeaders(
        cookies::clear_auth_cookies(state.config.cookie_secure)
            .into_iter()
            .map(|c| (header::SET_COOKIE, c)),
    );

    let result = match cookies::read_cookie(&headers, cookies::ACCESS_TOKEN) {
        Some(access_token) => state.auth.sign_out(access_token).await,
        None => Ok(()),
    };

    match result {
        // An already-expired token has nothing left to revoke.
        Ok(()) | Err(PortError::Unauthorized) => {
            info!("User signed out.");
            (clear, Redirect::to("/")).into_response()
        }
        Err(e) => {
            error!("Error signing out: {}", e);
            (
                clear,
                redirect_with_notice("/", Notice::SignOutFailed),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_verifier_fits_pkce_length_limits() {
        let verifier = new_code_verifier();
        assert_eq!(verifier.len(), 64);
        assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(verifier, new_code_verifier());
    }
}
