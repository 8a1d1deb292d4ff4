//! crates/study_assistant_core/src/chat.rs
//!
//! The message loop behind the session chat view.
//!
//! A `ChatLog` starts in `Loading`, moves to `Ready` once its study session has
//! been fetched, and then alternates between `Ready` and `Sending`. Only one
//! reply can be in flight at a time.

use crate::domain::{display_title, ChatMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Loading,
    Ready,
    Sending,
}

/// Why a submission was not accepted. The log is left untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error("Message is empty")]
    Blank,
    #[error("Still waiting for the previous reply")]
    ReplyInFlight,
    #[error("The study session has not loaded yet")]
    NotReady,
}

/// The opening assistant message for a freshly loaded session.
pub fn greeting_for(title: &str) -> String {
    let title = display_title(title);
    format!(
        "Hello! I'm here to help you with your study session on \"{title}\". What would you like to focus on today?"
    )
}

/// The canned assistant answer to `user_text`.
pub fn echo_reply_for(user_text: &str) -> String {
    format!("I understand you're asking about \"{user_text}\". Let me help you with that...")
}

#[derive(Debug, Clone)]
pub struct ChatLog {
    phase: ChatPhase,
    messages: Vec<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            phase: ChatPhase::Loading,
            messages: Vec::new(),
        }
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.phase == ChatPhase::Sending
    }

    /// Moves from `Loading` to `Ready` and seeds the greeting.
    ///
    /// Returns `None` if the log was already opened.
    pub fn open(&mut self, session_title: &str) -> Option<ChatMessage> {
        if self.phase != ChatPhase::Loading {
            return None;
        }
        let greeting = ChatMessage::assistant(greeting_for(session_title));
        self.messages.push(greeting.clone());
        self.phase = ChatPhase::Ready;
        Some(greeting)
    }

    /// Accepts one user message and enters `Sending`.
    ///
    /// The stored content is trimmed. Returns the appended message.
    pub fn submit(&mut self, input: &str) -> Result<ChatMessage, SubmitRejection> {
        match self.phase {
            ChatPhase::Loading => return Err(SubmitRejection::NotReady),
            ChatPhase::Sending => return Err(SubmitRejection::ReplyInFlight),
            ChatPhase::Ready => {}
        }
        let content = input.trim();
        if content.is_empty() {
            return Err(SubmitRejection::Blank);
        }
        let message = ChatMessage::user(content);
        self.messages.push(message.clone());
        self.phase = ChatPhase::Sending;
        Ok(message)
    }

    /// Appends the assistant reply for the in-flight submission and returns to `Ready`.
    ///
    /// A reply that arrives when nothing is in flight is dropped and `None` is returned.
    pub fn complete(&mut self, reply: impl Into<String>) -> Option<ChatMessage> {
        if self.phase != ChatPhase::Sending {
            return None;
        }
        let message = ChatMessage::assistant(reply);
        self.messages.push(message.clone());
        self.phase = ChatPhase::Ready;
        Some(message)
    }

    /// Gives up on the in-flight reply without appending anything.
    pub fn abandon(&mut self) {
        if self.phase == ChatPhase::Sending {
            self.phase = ChatPhase::Ready;
        }
    }
}
