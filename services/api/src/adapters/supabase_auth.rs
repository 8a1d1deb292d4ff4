//! services/api/src/adapters/supabase_auth.rs
//!
//! The adapter for the hosted identity provider. It implements the `AuthService`
//! port from the `core` crate on top of the provider's `/auth/v1` endpoints.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use study_assistant_core::domain::{AuthTokens, User};
use study_assistant_core::ports::{AuthService, PortError, PortResult};
use tracing::{info, warn};
use uuid::Uuid;

use super::supabase::{error_from_response, send, SupabaseClient};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseUser {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
        }
    }
}

/// Response from any `/token` grant.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: SupabaseUser,
}

impl TokenResponse {
    fn to_domain(self) -> AuthTokens {
        AuthTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            user: self.user.to_domain(),
        }
    }
}

/// `/signup` returns a full session when email confirmation is off, and just
/// the user object when it is on.
#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<SupabaseUser>,
}

//=========================================================================================
// The Adapter
//=========================================================================================

#[derive(Clone)]
pub struct SupabaseAuthAdapter {
    client: SupabaseClient,
}

impl SupabaseAuthAdapter {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
        action: &str,
    ) -> PortResult<AuthTokens> {
        let request = self
            .client
            .post(self.client.auth_url(&format!("token?grant_type={}", grant_type)))
            .json(&body);
        let response = send(request, action).await?;

        if !response.status().is_success() {
            // The token endpoint answers 400 for bad credentials and stale grants alike.
            return Err(match error_from_response(response, action).await {
                PortError::Validation(_) => PortError::Unauthorized,
                other => other,
            });
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to parse token response: {}", e)))?;
        Ok(tokens.to_domain())
    }
}

#[async_trait]
impl AuthService for SupabaseAuthAdapter {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<AuthTokens> {
        let tokens = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
                "sign in",
            )
            .await?;
        info!("User {} signed in with password.", tokens.user.id);
        Ok(tokens)
    }

    async fn sign_up(&self, email: &str, password: &str) -> PortResult<Option<AuthTokens>> {
        let request = self
            .client
            .post(self.client.auth_url("signup"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response = send(request, "sign up").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "sign up").await);
        }

        let body: SignUpResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to parse sign-up response: {}", e)))?;

        match (body.access_token, body.refresh_token, body.expires_in, body.user) {
            (Some(access_token), Some(refresh_token), Some(expires_in), Some(user)) => {
                info!("User {} signed up with an immediate session.", user.id);
                Ok(Some(
                    TokenResponse {
                        access_token,
                        refresh_token,
                        expires_in,
                        user,
                    }
                    .to_domain(),
                ))
            }
            _ => {
                info!("Sign-up accepted; email confirmation is pending.");
                Ok(None)
            }
        }
    }

    fn oauth_authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> String {
        format!(
            "{}?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=plain",
            self.client.auth_url("authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> PortResult<AuthTokens> {
        let tokens = self
            .token_grant(
                "pkce",
                serde_json::json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
                "exchange authorization code",
            )
            .await?;
        info!("User {} signed in with OAuth.", tokens.user.id);
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> PortResult<AuthTokens> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
            "refresh token",
        )
        .await
    }

    async fn get_user(&self, access_token: &str) -> PortResult<User> {
        let request = self
            .client
            .get(self.client.auth_url("user"))
            .bearer_auth(access_token);
        let response = send(request, "fetch user").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "fetch user").await);
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to parse user info: {}", e)))?;
        Ok(user.to_domain())
    }

    async fn sign_out(&self, access_token: &str) -> PortResult<()> {
        let request = self
            .client
            .post(self.client.auth_url("logout?scope=global"))
            .bearer_auth(access_token);
        let response = send(request, "sign out").await?;

        if !response.status().is_success() {
            let err = error_from_response(response, "sign out").await;
            warn!("Global sign-out was rejected: {}", err);
            return Err(err);
        }
        Ok(())
    }
}
