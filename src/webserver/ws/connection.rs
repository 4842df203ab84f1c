/// WebSocket connection handler
///
/// Manages individual WebSocket connections:
/// - Registration with a fresh connection id and the welcome message
/// - Subscribe/unsubscribe requests, answered with an informational reply
/// - Forwarding queued component updates to the client
/// - Removal from the registry when the connection ends
use axum::extract::ws::{Message as WsFrame, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::WebsocketConfig;
use crate::logger::{self, LogTag};

use super::clients::{ClientRegistry, ConnectionId};
use super::message::{Message, Reply};

/// Lifecycle of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Handle one inbound text frame
///
/// Returns the reply to send back, if any. Frames that do not decode are
/// dropped silently and component updates from clients are ignored.
pub async fn handle_client_text(
    text: &str,
    conn_id: ConnectionId,
    clients: &ClientRegistry,
) -> Option<String> {
    let message = match Message::decode(text) {
        Ok(message) => message,
        Err(e) => {
            logger::debug(
                LogTag::Socket,
                &format!("Connection {}: ignoring undecodable frame: {}", conn_id, e),
            );
            return None;
        }
    };

    let reply = match message {
        Message::Subscribe { component } => {
            if clients.add_subscription(&component, conn_id).await {
                Reply::Subscribed(component)
            } else {
                Reply::NotFound(component)
            }
        }
        Message::Unsubscribe { component } => {
            clients.remove_subscription(&component, conn_id).await;
            Reply::Unsubscribed(component)
        }
        Message::ComponentUpdate { component, .. } => {
            logger::debug(
                LogTag::Socket,
                &format!(
                    "Connection {}: ignoring client-sent update for '{}'",
                    conn_id, component
                ),
            );
            return None;
        }
    };

    Some(reply.to_text())
}

/// Handle a WebSocket connection until it closes
pub async fn handle_connection(
    socket: WebSocket,
    clients: Arc<ClientRegistry>,
    settings: WebsocketConfig,
) {
    let mut state = ConnectionState::Connecting;
    let conn_id = Uuid::new_v4();
    let (tx, mut outbound_rx) = mpsc::channel::<String>(settings.send_buffer.max(1));
    clients.add(conn_id, tx).await;

    let (mut ws_tx, mut ws_rx) = socket.split();

    if !settings.welcome_message.is_empty()
        && ws_tx
            .send(WsFrame::Text(settings.welcome_message.clone()))
            .await
            .is_err()
    {
        logger::warning(
            LogTag::Socket,
            &format!("Connection {}: failed to send welcome message", conn_id),
        );
        clients.remove(conn_id).await;
        return;
    }

    state = transition(conn_id, state, ConnectionState::Open);

    loop {
        tokio::select! {
            // Updates queued by broadcasts
            Some(text) = outbound_rx.recv() => {
                if let Err(e) = ws_tx.send(WsFrame::Text(text)).await {
                    logger::warning(
                        LogTag::Socket,
                        &format!("Connection {}: failed to send message: {}", conn_id, e),
                    );
                    break;
                }
            }

            // Frames from the client
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(WsFrame::Text(text))) => {
                        if let Some(reply) = handle_client_text(&text, conn_id, &clients).await {
                            if let Err(e) = ws_tx.send(WsFrame::Text(reply)).await {
                                logger::warning(
                                    LogTag::Socket,
                                    &format!("Connection {}: failed to send reply: {}", conn_id, e),
                                );
                                break;
                            }
                        }
                    }
                    Some(Ok(WsFrame::Close(_))) | None => {
                        logger::debug(
                            LogTag::Socket,
                            &format!("Connection {}: client closed", conn_id),
                        );
                        break;
                    }
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Socket,
                            &format!("Connection {}: websocket error: {}", conn_id, e),
                        );
                        break;
                    }
                    // Binary, ping and pong frames
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    clients.remove(conn_id).await;
    transition(conn_id, state, ConnectionState::Closed);
}

fn transition(conn_id: ConnectionId, from: ConnectionState, to: ConnectionState) -> ConnectionState {
    logger::debug(
        LogTag::Socket,
        &format!("Connection {}: {:?} -> {:?}", conn_id, from, to),
    );
    to
}
