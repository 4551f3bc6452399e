//! Message send/delete/seen handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::lifecycle;
use crate::web::state::AppState;
use crate::web::utils::{api_error, repo_error};

#[derive(Deserialize)]
pub struct SendMessageRequest {
    text: String,
    /// Operator types as the counterparty: no seen-timer, no auto-reply.
    #[serde(default)]
    impersonate: bool,
}

pub async fn send_message_handler(
    State(state): State<AppState>,
    Path(conv_id): Path<String>,
    axum::Json(req): axum::Json<SendMessageRequest>,
) -> Response {
    let text = req.text.trim();
    if text.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "text required");
    }

    match lifecycle::send_message(&state.engine, &conv_id, text, req.impersonate).await {
        Ok((message, conversations)) => {
            let body = serde_json::json!({
                "message": message,
                "conversations": conversations,
            });
            (StatusCode::CREATED, axum::Json(body)).into_response()
        }
        Err(e) => repo_error(&e),
    }
}

pub async fn delete_message_handler(
    State(state): State<AppState>,
    Path((conv_id, msg_id)): Path<(String, String)>,
) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.delete_message(&conv_id, &msg_id) {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}

pub async fn mark_seen_handler(
    State(state): State<AppState>,
    Path((conv_id, msg_id)): Path<(String, String)>,
) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.mark_message_seen(&conv_id, &msg_id) {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}
