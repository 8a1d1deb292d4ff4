//! In-memory stand-ins for the hosted backend, shared by the web tests.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use study_assistant_core::chat::echo_reply_for;
use study_assistant_core::domain::{AuthTokens, NewStudySession, StudySession, User};
use study_assistant_core::ports::{
    AuthService, PortError, PortResult, ReplyService, StudySessionRepository,
};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::config::Config;
use crate::web::state::{AppState, CurrentUser};

pub const ACCESS: &str = "access-token";
pub const REFRESHED_ACCESS: &str = "refreshed-access-token";
pub const REFRESH: &str = "refresh-token";
pub const PASSWORD: &str = "correct-horse";
pub const EMAIL: &str = "student@example.com";

fn user_id() -> Uuid {
    Uuid::from_u128(0x5757_0000_0000_0000_0000_0000_0000_0001)
}

fn user() -> User {
    User {
        id: user_id(),
        email: Some(EMAIL.to_string()),
    }
}

fn tokens(access: &str) -> AuthTokens {
    AuthTokens {
        access_token: access.to_string(),
        refresh_token: REFRESH.to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        user: user(),
    }
}

/// A session owned by `user_id`, created `minutes` after a fixed epoch.
pub fn sample_session(user_id: Uuid, title: &str, minutes: i64) -> StudySession {
    StudySession {
        id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        description: format!("Preparing for {title}"),
        study_level: "undergraduate".to_string(),
        learning_goals: String::new(),
        learning_style: String::new(),
        weaknesses: String::new(),
        additional_info: String::new(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes),
    }
}

pub fn signed_in_user(_backend: &TestBackend) -> CurrentUser {
    CurrentUser {
        user: user(),
        access_token: ACCESS.to_string(),
    }
}

/// The `Cookie` header of a signed-in browser.
pub fn auth_cookie() -> String {
    format!(
        "sb-access-token={ACCESS}; sb-refresh-token={REFRESH}; sb-expires-at={}",
        (Utc::now() + Duration::hours(1)).timestamp()
    )
}

/// The `Cookie` header of a browser whose access token has expired.
pub fn expired_cookie() -> String {
    format!(
        "sb-access-token=stale; sb-refresh-token={REFRESH}; sb-expires-at={}",
        (Utc::now() - Duration::minutes(5)).timestamp()
    )
}

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Default)]
pub struct FakeAuth {
    pub sign_out_calls: AtomicUsize,
    pub fail_sign_out: AtomicBool,
    /// The provider is unreachable: token checks fail without rejecting the token.
    pub fail_get_user: AtomicBool,
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<AuthTokens> {
        if email == EMAIL && password == PASSWORD {
            Ok(tokens(ACCESS))
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> PortResult<Option<AuthTokens>> {
        Ok(None)
    }

    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!("https://idp.test/authorize?provider={provider}&redirect_to={redirect_to}&code_challenge={code_challenge}")
    }

    async fn exchange_code(&self, auth_code: &str, _code_verifier: &str) -> PortResult<AuthTokens> {
        if auth_code == "good-code" {
            Ok(tokens(ACCESS))
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn refresh(&self, refresh_token: &str) -> PortResult<AuthTokens> {
        if refresh_token == REFRESH {
            Ok(tokens(REFRESHED_ACCESS))
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn get_user(&self, access_token: &str) -> PortResult<User> {
        if self.fail_get_user.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected(
                "identity provider returned 503".to_string(),
            ));
        }
        if access_token == ACCESS || access_token == REFRESHED_ACCESS {
            Ok(user())
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn sign_out(&self, _access_token: &str) -> PortResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            Err(PortError::Unexpected("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Rows are returned in insertion order, not sorted.
///
/// When `fail_with` is set, create and delete return that error; reads still work.
#[derive(Default)]
pub struct FakeSessions {
    pub rows: Mutex<Vec<StudySession>>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub fail_with: Mutex<Option<PortError>>,
}

impl FakeSessions {
    fn injected_failure(&self) -> PortResult<()> {
        match self.fail_with.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StudySessionRepository for FakeSessions {
    async fn list_sessions(&self, _access_token: &str) -> PortResult<Vec<StudySession>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_session(&self, _access_token: &str, session_id: Uuid) -> PortResult<StudySession> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Study session {session_id} not found")))
    }

    async fn create_session(
        &self,
        _access_token: &str,
        new: NewStudySession,
    ) -> PortResult<StudySession> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        let session = StudySession {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            study_level: new.study_level,
            learning_goals: new.learning_goals,
            learning_style: new.learning_style,
            weaknesses: new.weaknesses,
            additional_info: new.additional_info,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn delete_session(&self, _access_token: &str, session_id: Uuid) -> PortResult<()> {
        self.injected_failure()?;
        self.rows.lock().unwrap().retain(|s| s.id != session_id);
        Ok(())
    }
}

/// Answers immediately unless held; a held reply waits for `release`.
#[derive(Default)]
pub struct FakeReplies {
    held: AtomicBool,
    failing: AtomicBool,
    release: Notify,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ReplyService for FakeReplies {
    async fn reply(&self, _session: &StudySession, user_text: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("reply backend down".to_string()));
        }
        Ok(echo_reply_for(user_text))
    }
}

//=========================================================================================
// TestBackend
//=========================================================================================

pub struct TestBackend {
    pub auth: Arc<FakeAuth>,
    pub sessions: Arc<FakeSessions>,
    pub replies: Arc<FakeReplies>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            auth: Arc::new(FakeAuth::default()),
            sessions: Arc::new(FakeSessions::default()),
            replies: Arc::new(FakeReplies::default()),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        let config = Config::from_lookup(|key| match key {
            "SUPABASE_URL" => Some("https://project.supabase.test".to_string()),
            "SUPABASE_ANON_KEY" => Some("anon-key".to_string()),
            "COOKIE_SECURE" => Some("false".to_string()),
            "REPLY_DELAY_MS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        Arc::new(AppState {
            auth: self.auth.clone(),
            sessions: self.sessions.clone(),
            replies: self.replies.clone(),
            config: Arc::new(config),
        })
    }

    /// Adds a stored session for the signed-in user.
    pub fn seed(&self, title: &str, minutes: i64) -> StudySession {
        let session = sample_session(user_id(), title, minutes);
        self.sessions.rows.lock().unwrap().push(session.clone());
        session
    }

    pub fn hold_replies(&self) {
        self.replies.held.store(true, Ordering::SeqCst);
    }

    pub fn release_replies(&self) {
        self.replies.held.store(false, Ordering::SeqCst);
        self.replies.release.notify_one();
    }

    pub fn fail_replies(&self) {
        self.replies.failing.store(true, Ordering::SeqCst);
    }

    /// Makes every create and delete fail with `error`.
    pub fn fail_writes(&self, error: PortError) {
        *self.sessions.fail_with.lock().unwrap() = Some(error);
    }

    /// Makes the identity provider unreachable.
    pub fn take_auth_offline(&self) {
        self.auth.fail_get_user.store(true, Ordering::SeqCst);
    }
}
