//! Conversation list handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::lifecycle;
use crate::model::User;
use crate::seed;
use crate::web::state::AppState;
use crate::web::utils::{api_error, repo_error};

pub async fn list_conversations_handler(State(state): State<AppState>) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.list_conversations() {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    username: Option<String>,
    full_name: Option<String>,
    avatar: Option<String>,
    followers: Option<String>,
    posts_count: Option<String>,
    following_since: Option<String>,
    mutual_follows: Option<String>,
}

pub async fn create_conversation_handler(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<CreateConversationRequest>,
) -> Response {
    // Blank fields fall back to the new-chat template.
    let mut user: User = seed::default_new_user();
    if let Some(v) = req.username {
        user.username = v;
    }
    if let Some(v) = req.full_name {
        user.full_name = v;
    }
    if let Some(v) = req.avatar {
        user.avatar = v;
    }
    if let Some(v) = req.followers {
        user.followers = Some(v);
    }
    if let Some(v) = req.posts_count {
        user.posts_count = Some(v);
    }
    if let Some(v) = req.following_since {
        user.following_since = Some(v);
    }
    if let Some(v) = req.mutual_follows {
        user.mutual_follows = Some(v);
    }

    let eng = state.engine.lock().await;
    match eng.repository.add_conversation(user) {
        Ok(conversations) => (StatusCode::CREATED, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}

pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    Path(conv_id): Path<String>,
) -> Response {
    match lifecycle::delete_conversation(&state.engine, &conv_id).await {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    Path(conv_id): Path<String>,
) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.mark_conversation_read(&conv_id) {
        Ok(conversations) => {
            let _ = eng.events.send(crate::lifecycle::Event::ConversationRead {
                conversation_id: conv_id,
            });
            (StatusCode::OK, axum::Json(conversations)).into_response()
        }
        Err(e) => repo_error(&e),
    }
}

pub async fn toggle_ai_handler(
    State(state): State<AppState>,
    Path(conv_id): Path<String>,
) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.toggle_ai_enabled(&conv_id) {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}
