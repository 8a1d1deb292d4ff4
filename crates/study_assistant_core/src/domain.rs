//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any backend or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// An account known to the hosted identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
}

/// The tokens handed out by the identity provider after a successful sign-in.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// A user-created record describing a topic and learning preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
    pub created_at: DateTime<Utc>,
}

/// Shown wherever a session has no title.
pub const UNTITLED_SESSION: &str = "Untitled session";

/// `title`, or the untitled placeholder when it is blank.
pub fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        UNTITLED_SESSION
    } else {
        title
    }
}

/// A validated study session that has not been inserted yet.
///
/// `id` and `created_at` are assigned by the backend on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudySession {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
}

/// The fixed choices offered by the standalone creation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyLevel {
    HighSchool,
    Undergraduate,
    Graduate,
    Professional,
}

impl StudyLevel {
    pub const ALL: [StudyLevel; 4] = [
        StudyLevel::HighSchool,
        StudyLevel::Undergraduate,
        StudyLevel::Graduate,
        StudyLevel::Professional,
    ];

    /// The value stored in the `study_level` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyLevel::HighSchool => "high-school",
            StudyLevel::Undergraduate => "undergraduate",
            StudyLevel::Graduate => "graduate",
            StudyLevel::Professional => "professional",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StudyLevel::HighSchool => "High School",
            StudyLevel::Undergraduate => "Undergraduate",
            StudyLevel::Graduate => "Graduate",
            StudyLevel::Professional => "Professional",
        }
    }
}

impl fmt::Display for StudyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudyLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown study level: {s}"))
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in the transient, per-connection chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
