//! Shared utility functions for the web handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::repository::RepoError;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// Map a repository error onto the API error taxonomy: missing ids become
/// 404, storage failures become 500.
pub fn repo_error(e: &RepoError) -> Response {
    if e.is_not_found() {
        api_error(StatusCode::NOT_FOUND, e.to_string())
    } else {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}
