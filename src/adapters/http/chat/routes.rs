//! HTTP routes for chat endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_session, reset_session, send_message, ChatHandlers};

/// Creates the chat router with all endpoints.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/:id/messages", post(send_message))
        .route("/:id", get(get_session).delete(reset_session))
        .with_state(handlers)
}
