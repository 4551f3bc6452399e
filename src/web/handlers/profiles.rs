//! Profile handlers: the local profile record and embedded counterparties.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::model::{ProfilePatch, UserPatch};
use crate::web::state::AppState;
use crate::web::utils::{api_error, repo_error};

pub async fn get_own_profile_handler(State(state): State<AppState>) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.own_profile() {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn update_own_profile_handler(
    State(state): State<AppState>,
    axum::Json(patch): axum::Json<ProfilePatch>,
) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.update_own_profile(&patch) {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn update_counterparty_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    axum::Json(patch): axum::Json<UserPatch>,
) -> Response {
    let eng = state.engine.lock().await;
    match eng.repository.update_counterparty_profile(&user_id, &patch) {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(e) => repo_error(&e),
    }
}
