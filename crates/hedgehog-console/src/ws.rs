//! `WebSocket` handler for real-time console updates.
//!
//! Clients connect to `GET /ws/alerts` and receive JSON-encoded
//! [`ConsoleMessage`] frames. A client that connects while an alert is
//! pending receives it immediately, then follows the live stream.
//!
//! If a client falls behind, lagged messages are silently skipped.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, ConsoleMessage};

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming console messages.
///
/// # Route
///
/// `GET /ws/alerts`
pub async fn ws_alerts(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn send_json(socket: &mut WebSocket, message: &ConsoleMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize console message: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the current alert so nothing published in
    // between is missed.
    let mut rx = state.board.subscribe();
    if let Some(notice) = state.board.current_alert() {
        if !send_json(&mut socket, &ConsoleMessage::Alert { notice }).await {
            debug!("WebSocket client disconnected (send failed)");
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        if !send_json(&mut socket, &message).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}
