//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::web::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let eng = state.engine.lock().await;
    let conversation_count = eng
        .repository
        .list_conversations()
        .map(|c| c.len())
        .unwrap_or(0);

    let body = serde_json::json!({
        "status": "ok",
        "conversations": conversation_count,
        "reply_generator": eng.generator.label(),
    });
    (StatusCode::OK, axum::Json(body))
}
