//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! Authentication, storage and reply generation all live behind these traits so
//! the web layer never talks to the hosted backend directly.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthTokens, NewStudySession, StudySession, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Auth failures send the caller back to sign-in; everything else becomes a notification.
    pub fn is_auth(&self) -> bool {
        matches!(self, PortError::Unauthorized)
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Password grant. Bad credentials surface as `PortError::Unauthorized`.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<AuthTokens>;

    /// Creates an account. Returns `None` when the provider requires email
    /// confirmation before a session is issued.
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<Option<AuthTokens>>;

    /// Builds the provider URL that starts an OAuth authorization-code flow.
    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str)
        -> String;

    /// Completes the OAuth flow started by `oauth_authorize_url`.
    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> PortResult<AuthTokens>;

    async fn refresh(&self, refresh_token: &str) -> PortResult<AuthTokens>;

    async fn get_user(&self, access_token: &str) -> PortResult<User>;

    /// Revokes every session of the token's owner.
    async fn sign_out(&self, access_token: &str) -> PortResult<()>;
}

/// Access to the remote `study_sessions` table, always on behalf of the token's owner.
#[async_trait]
pub trait StudySessionRepository: Send + Sync {
    async fn list_sessions(&self, access_token: &str) -> PortResult<Vec<StudySession>>;

    async fn get_session(&self, access_token: &str, session_id: Uuid) -> PortResult<StudySession>;

    async fn create_session(
        &self,
        access_token: &str,
        session: NewStudySession,
    ) -> PortResult<StudySession>;

    async fn delete_session(&self, access_token: &str, session_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait ReplyService: Send + Sync {
    /// Produces the assistant's answer to one user message.
    async fn reply(&self, session: &StudySession, user_text: &str) -> PortResult<String>;
}
