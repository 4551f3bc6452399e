//! Axum router construction.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::AppState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health::health_handler))
        // Conversations API
        .route(
            "/api/conversations",
            get(handlers::conversations::list_conversations_handler)
                .post(handlers::conversations::create_conversation_handler),
        )
        .route(
            "/api/conversations/:conv_id",
            delete(handlers::conversations::delete_conversation_handler),
        )
        .route(
            "/api/conversations/:conv_id/read",
            post(handlers::conversations::mark_read_handler),
        )
        .route(
            "/api/conversations/:conv_id/ai",
            post(handlers::conversations::toggle_ai_handler),
        )
        // Messages API
        .route(
            "/api/conversations/:conv_id/messages",
            post(handlers::messages::send_message_handler),
        )
        .route(
            "/api/conversations/:conv_id/messages/:msg_id",
            delete(handlers::messages::delete_message_handler),
        )
        .route(
            "/api/conversations/:conv_id/messages/:msg_id/seen",
            post(handlers::messages::mark_seen_handler),
        )
        // Reactions API
        .route(
            "/api/conversations/:conv_id/messages/:msg_id/react",
            post(handlers::reactions::react_handler),
        )
        // Profiles API
        .route(
            "/api/profile",
            get(handlers::profiles::get_own_profile_handler)
                .put(handlers::profiles::update_own_profile_handler),
        )
        .route(
            "/api/users/:user_id",
            axum::routing::put(handlers::profiles::update_counterparty_handler),
        )
        // WebSocket
        .route("/api/ws", get(handlers::websocket::ws_handler))
        .with_state(state)
}
