//! services/api/src/web/chat_task.rs
//!
//! The chat loop's per-message logic, kept apart from the socket so it can be
//! driven through a plain channel.

use std::sync::Arc;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use study_assistant_core::domain::StudySession;

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, ChatState},
};

/// Where server messages for one connection are queued for the socket writer.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

fn push(outbox: &Outbox, message: ServerMessage) {
    if outbox.send(message).is_err() {
        warn!("Chat outbox closed; client has disconnected.");
    }
}

/// Sends the opening frames: the session header followed by the current log.
pub async fn open_chat(chat_lock: &Arc<Mutex<ChatState>>, outbox: &Outbox) {
    let chat = chat_lock.lock().await;
    push(
        outbox,
        ServerMessage::SessionReady {
            session_id: chat.session.id,
            title: chat.session.title.clone(),
            description: chat.session.description.clone(),
        },
    );
    for message in chat.log.messages() {
        push(outbox, ServerMessage::from(message));
    }
    push(outbox, ServerMessage::Ready);
}

/// Handles one client message. Returns the spawned reply task, if one was started.
pub async fn handle_client_message(
    app_state: &Arc<AppState>,
    chat_lock: &Arc<Mutex<ChatState>>,
    outbox: &Outbox,
    message: ClientMessage,
) -> Option<JoinHandle<()>> {
    match message {
        ClientMessage::Send { content } => {
            let mut chat = chat_lock.lock().await;
            match chat.log.submit(&content) {
                Ok(user_message) => {
                    push(outbox, ServerMessage::from(&user_message));
                    push(outbox, ServerMessage::Sending);

                    let task = {
                        let app_state = app_state.clone();
                        let chat_lock = chat_lock.clone();
                        let outbox = outbox.clone();
                        let token = chat.cancellation_token.clone();
                        let session = chat.session.clone();
                        tokio::spawn(async move {
                            reply_process(
                                app_state,
                                chat_lock,
                                outbox,
                                token,
                                session,
                                user_message.content,
                            )
                            .await;
                        })
                    };
                    Some(task)
                }
                Err(rejection) => {
                    warn!("Chat submission rejected: {}", rejection);
                    push(
                        outbox,
                        ServerMessage::Rejected {
                            reason: rejection.to_string(),
                        },
                    );
                    None
                }
            }
        }
    }
}

/// Waits for the reply to one accepted submission and appends it to the log.
///
/// Ends early, without touching the log, if the connection is cancelled.
pub async fn reply_process(
    app_state: Arc<AppState>,
    chat_lock: Arc<Mutex<ChatState>>,
    outbox: Outbox,
    cancellation_token: CancellationToken,
    session: StudySession,
    user_text: String,
) {
    let reply = tokio::select! {
        _ = cancellation_token.cancelled() => {
            info!("Reply for session {} cancelled.", session.id);
            return;
        }
        reply = app_state.replies.reply(&session, &user_text) => reply,
    };

    let mut chat = chat_lock.lock().await;
    match reply {
        Ok(text) => {
            if let Some(message) = chat.log.complete(text) {
                push(&outbox, ServerMessage::from(&message));
            }
        }
        Err(e) => {
            error!("Error sending message: {}", e);
            chat.log.abandon();
            push(
                &outbox,
                ServerMessage::Error {
                    message: "Failed to send message".to_string(),
                },
            );
        }
    }
    push(&outbox, ServerMessage::Ready);
}
