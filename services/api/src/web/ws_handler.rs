//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a chat connection.
//! Outgoing frames are queued on a channel and written by a dedicated task, so the
//! reply task never touches the socket directly.

use crate::web::{
    chat_task::{handle_client_message, open_chat, Outbox},
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, ChatState, CurrentUser},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading `/ws/sessions/{id}` to a WebSocket connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, current, session_id))
}

/// Forwards queued server messages to the socket until the queue closes or the client goes away.
async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = queue.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                continue;
            }
        };
        if sink.send(Message::Text(json.into())).await.is_err() {
            info!("Client went away while sending.");
            return;
        }
    }
    let _ = sink.send(Message::Close(None)).await;
}

async fn handle_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    current: CurrentUser,
    session_id: Uuid,
) {
    info!(
        "New chat connection for session {} (user {}).",
        session_id, current.user.id
    );

    let (sink, mut receiver) = socket.split();
    let (outbox, queue): (Outbox, _) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(sink, queue));

    // --- 1. Load the Session ---
    let session = match app_state
        .sessions
        .get_session(&current.access_token, session_id)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            let _ = outbox.send(ServerMessage::Error {
                message: "Failed to load study session".to_string(),
            });
            // Dropping the only sender lets the writer flush the error and close.
            drop(outbox);
            let _ = writer.await;
            return;
        }
    };

    let chat_lock = Arc::new(Mutex::new(ChatState::new(current, session)));
    open_chat(&chat_lock, &outbox).await;

    // --- 2. Main Message Loop ---
    let mut reply_task: Option<JoinHandle<()>> = None;
    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("Client sent close message.");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => {
                if let Some(task) =
                    handle_client_message(&app_state, &chat_lock, &outbox, message).await
                {
                    reply_task = Some(task);
                }
            }
            Err(e) => warn!("Failed to deserialize client message: {}", e),
        }
    }

    // --- 3. Cleanup ---
    chat_lock.lock().await.cancellation_token.cancel();
    if let Some(handle) = reply_task {
        handle.abort();
    }
    writer.abort();
    info!("Chat connection for session {} closed.", session_id);
}
