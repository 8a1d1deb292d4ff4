//! services/api/src/adapters/canned_reply.rs
//!
//! The placeholder reply producer for the session chat. It waits a fixed delay
//! and then answers with a canned sentence built from the user's text. No
//! inference backend is involved.

use async_trait::async_trait;
use std::time::Duration;
use study_assistant_core::chat::echo_reply_for;
use study_assistant_core::domain::StudySession;
use study_assistant_core::ports::{PortResult, ReplyService};
use tracing::debug;

pub struct CannedReplyAdapter {
    delay: Duration,
}

impl CannedReplyAdapter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ReplyService for CannedReplyAdapter {
    async fn reply(&self, session: &StudySession, user_text: &str) -> PortResult<String> {
        debug!("Preparing canned reply for session {}.", session.id);
        tokio::time::sleep(self.delay).await;
        Ok(echo_reply_for(user_text))
    }
}
