//! WebSocket upgrade and connection handling.

use std::sync::atomic::Ordering;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast;

use crate::mlog;
use crate::web::config::MAX_WS_CONNECTIONS;
use crate::web::state::AppState;
use crate::web::utils::api_error;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Check connection limit before upgrading
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= MAX_WS_CONNECTIONS {
        return api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            format!(
                "too many WebSocket connections (max {})",
                MAX_WS_CONNECTIONS
            ),
        );
    }

    ws.on_upgrade(|socket| ws_connection(socket, state))
        .into_response()
}

async fn ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = {
        let eng = state.engine.lock().await;
        eng.events.subscribe()
    };
    state.ws_connection_count.fetch_add(1, Ordering::Relaxed);

    loop {
        tokio::select! {
            // Forward lifecycle events to the WebSocket client
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if socket.send(WsMessage::Text(json)).await.is_err() {
                                break; // client disconnected
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        mlog!("ws client lagged, skipped {n} events");
                        // Notify client so it can refresh
                        let lag_msg = serde_json::json!({
                            "type": "events_missed",
                            "count": n,
                        });
                        if let Ok(json) = serde_json::to_string(&lag_msg) {
                            if socket.send(WsMessage::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Handle incoming messages from the client
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = socket.send(WsMessage::Pong(data)).await;
                    }
                    _ => {} // clients have nothing else to say to us
                }
            }
        }
    }

    // Decrement connection count on disconnect
    state.ws_connection_count.fetch_sub(1, Ordering::Relaxed);
}
