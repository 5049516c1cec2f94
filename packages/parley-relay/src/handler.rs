//! WebSocket connection handler.
//!
//! Manages individual WebSocket connections: waiting for the handshake,
//! routing client frames through the presence coordinator and relay router,
//! and writing server frames back out.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::Session;
use crate::state::RelayState;

/// Handle a single WebSocket connection.
///
/// This function runs for the lifetime of the connection:
/// 1. Waits for a `handshake` frame carrying the session credentials
/// 2. Spawns a sender task to forward outbound messages
/// 3. Brings the connection online through the presence coordinator
/// 4. Processes `private message` frames until the connection closes
/// 5. Runs the disconnect check
///
/// A connection whose handshake is rejected stays open but inert: it is sent
/// `invalid session` and every later frame is ignored.
pub async fn handle_websocket(socket: WebSocket, state: RelayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let conn_id = Uuid::new_v4().to_string();

    // Create the outbound channel for this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // ── Step 1: Wait for Handshake ────────────────────────────────────────

    let auth = loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Handshake(auth)) => break auth,
                Ok(_) => {
                    let err = ServerMessage::Error {
                        message: "Must send handshake before other events".to_string(),
                    };
                    if let Some(frame) = encode(&err) {
                        let _ = ws_sender.send(frame).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(conn_id = conn_id.as_str(), "Failed to parse handshake: {}", e);
                    let err = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    if let Some(frame) = encode(&err) {
                        let _ = ws_sender.send(frame).await;
                    }
                }
            },
            Some(Ok(Message::Ping(data))) => {
                let _ = ws_sender.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => {
                return; // Connection closed before handshake
            }
            _ => continue,
        }
    };

    // ── Step 2: Register Connection ───────────────────────────────────────

    state.hub.register(&conn_id, tx);

    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(frame) = encode(&msg) else {
                continue;
            };
            if ws_sender.send(frame).await.is_err() {
                break; // Connection closed
            }
        }
    });

    // ── Step 3: Resolve Session ───────────────────────────────────────────

    let session = state.presence.connect(&conn_id, &auth).ok();

    // ── Step 4: Process Messages ──────────────────────────────────────────

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let Some(session) = session.as_ref() else {
                    continue; // Inert after invalid session
                };
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(&state, &conn_id, session, client_msg);
                    }
                    Err(e) => {
                        tracing::warn!(
                            conn_id = conn_id.as_str(),
                            user_id = session.user_id.as_str(),
                            error = %e,
                            "Failed to parse client message"
                        );
                        state.hub.emit_to_self(
                            &conn_id,
                            ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            },
                        );
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(conn_id = conn_id.as_str(), "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::warn!(
                    conn_id = conn_id.as_str(),
                    error = %e,
                    "WebSocket error"
                );
                break;
            }
            _ => {} // Binary, Ping, Pong; axum answers pings itself
        }
    }

    // ── Step 5: Cleanup ───────────────────────────────────────────────────

    if let Some(session) = &session {
        state.presence.disconnect(&conn_id, session);
    }
    state.hub.unregister(&conn_id);
    sender_task.abort();
    tracing::debug!(conn_id = conn_id.as_str(), "WebSocket closed");
}

/// Handle a parsed client message from an identified connection.
fn handle_client_message(state: &RelayState, conn_id: &str, session: &Session, msg: ClientMessage) {
    match msg {
        ClientMessage::Handshake(_) => {
            state.hub.emit_to_self(
                conn_id,
                ServerMessage::Error {
                    message: "Already handshaken".to_string(),
                },
            );
        }

        ClientMessage::PrivateMessage { content, to } => {
            if let Err(e) = state.relay.send(&session.user_id, content, to) {
                tracing::warn!(
                    conn_id = conn_id,
                    user_id = session.user_id.as_str(),
                    error = %e,
                    "Rejected private message"
                );
                state.hub.emit_to_self(
                    conn_id,
                    ServerMessage::Error {
                        message: e.to_string(),
                    },
                );
            }
        }
    }
}

/// Serialize a server message into a text frame.
fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            None
        }
    }
}
