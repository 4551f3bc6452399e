//! Reaction handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::model::{Reaction, LOCAL_USER_ID};
use crate::web::state::AppState;
use crate::web::utils::{api_error, repo_error};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    emoji: String,
    #[serde(default = "local_sender")]
    sender_id: String,
}

fn local_sender() -> String {
    LOCAL_USER_ID.to_string()
}

pub async fn react_handler(
    State(state): State<AppState>,
    Path((conv_id, msg_id)): Path<(String, String)>,
    axum::Json(req): axum::Json<ReactRequest>,
) -> Response {
    if req.emoji.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "emoji required");
    }
    let reaction = Reaction {
        emoji: req.emoji,
        sender_id: req.sender_id,
    };

    let eng = state.engine.lock().await;
    match eng
        .repository
        .add_or_replace_reaction(&conv_id, &msg_id, reaction)
    {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}
