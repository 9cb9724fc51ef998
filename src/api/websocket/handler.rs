//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, Query, State},
    response::Response,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::events::ClientMessage;
use super::state::AppState;
use crate::relay::{Envelope, Gateway, RelayEvent};
use crate::types::ConnectionId;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Username the chat page was opened with after login
    pub user: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let user = params.user.filter(|u| !u.trim().is_empty());
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, user: Option<String>) {
    let (outbox, mut rx) = mpsc::unbounded_channel::<Envelope>();

    let connection_id = match state.gateway.on_connect(user, outbox) {
        Ok(id) => id,
        Err(_) => {
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    loop {
        tokio::select! {
            // Relay deliveries to client
            outbound = rx.recv() => {
                match outbound {
                    Some(envelope) => {
                        if send_envelope(&mut socket, &envelope).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    None => break, // Deregistered elsewhere
                }
            }

            // Handle client messages
            inbound = socket.recv() => {
                let msg = match inbound {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        debug!(connection_id = %connection_id, error = %e, "websocket error");
                        break;
                    }
                    None => break, // Client disconnected
                };

                let sent = match handle_client_message(msg, &connection_id, &state.gateway) {
                    FrameAction::Continue => Ok(()),
                    FrameAction::Reply(envelope) => send_envelope(&mut socket, &envelope).await,
                    FrameAction::Pong(data) => socket.send(Message::Pong(data)).await,
                    FrameAction::Close => break, // Client requested close
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    state.gateway.on_disconnect(&connection_id);
}

async fn send_envelope(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), axum::Error> {
    match serde_json::to_string(envelope) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize envelope");
            Ok(())
        }
    }
}

/// What the socket loop does after one inbound frame
#[derive(Debug, PartialEq)]
enum FrameAction {
    Continue,
    /// Answer the sender directly
    Reply(Envelope),
    /// Protocol-level pong for a ping frame
    Pong(Vec<u8>),
    Close,
}

/// Handle a message from the client
fn handle_client_message(
    msg: Message,
    connection_id: &ConnectionId,
    gateway: &Gateway,
) -> FrameAction {
    match msg {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Ping) => FrameAction::Reply(Envelope::new(RelayEvent::Pong)),
            Ok(client_msg) => {
                if let Some(event) = client_msg.into_gateway_event(connection_id.clone()) {
                    if let Err(e) = gateway.dispatch(event) {
                        warn!(connection_id = %connection_id, error = %e, "dispatch failed");
                    }
                }
                FrameAction::Continue
            }
            Err(e) => FrameAction::Reply(Envelope::new(RelayEvent::Error {
                code: "bad_request".to_string(),
                message: e.to_string(),
            })),
        },
        Message::Binary(_) => FrameAction::Continue, // Ignore binary messages
        Message::Ping(data) => FrameAction::Pong(data),
        Message::Pong(_) => FrameAction::Continue, // Ignore pong responses
        Message::Close(_) => FrameAction::Close,
    }
}
