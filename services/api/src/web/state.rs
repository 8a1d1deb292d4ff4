//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-connection chat state.

use crate::config::Config;
use std::sync::Arc;
use study_assistant_core::chat::ChatLog;
use study_assistant_core::domain::{StudySession, User};
use study_assistant_core::ports::{AuthService, ReplyService, StudySessionRepository};
use tokio_util::sync::CancellationToken;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub sessions: Arc<dyn StudySessionRepository>,
    pub replies: Arc<dyn ReplyService>,
    pub config: Arc<Config>,
}

//=========================================================================================
// CurrentUser (Inserted by the Auth Middleware)
//=========================================================================================

/// The authenticated caller, plus the token to act on their behalf at the backend.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub access_token: String,
}

//=========================================================================================
// ChatState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single chat connection. Dropped, with its log, when the socket closes.
pub struct ChatState {
    pub current: CurrentUser,
    pub session: StudySession,
    pub log: ChatLog,
    /// Cancels the pending reply when the connection goes away.
    pub cancellation_token: CancellationToken,
}

impl ChatState {
    /// Creates the state for `session` and opens its log with the greeting.
    pub fn new(current: CurrentUser, session: StudySession) -> Self {
        let mut log = ChatLog::new();
        log.open(&session.title);
        Self {
            current,
            session,
            log,
            cancellation_token: CancellationToken::new(),
        }
    }
}
