//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser's chat view and
//! the API server. All frames are JSON text frames tagged by `type`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_assistant_core::domain::{ChatMessage, Role};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The user submitted the input box.
    Send { content: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireRole {
    User,
    Assistant,
}

impl From<Role> for WireRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => WireRole::User,
            Role::Assistant => WireRole::Assistant,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The study session was loaded and the chat is ready. Sent once, first.
    SessionReady {
        session_id: Uuid,
        title: String,
        description: String,
    },

    /// A new entry in the chat log.
    Message {
        role: WireRole,
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// A submission was accepted and its reply is pending. The UI disables input.
    Sending,

    /// No reply is pending. The UI re-enables input.
    Ready,

    /// A submission was not accepted; the log is unchanged.
    Rejected { reason: String },

    /// A one-shot notification for the user.
    Error { message: String },
}

impl From<&ChatMessage> for ServerMessage {
    fn from(message: &ChatMessage) -> Self {
        ServerMessage::Message {
            role: message.role.into(),
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}
