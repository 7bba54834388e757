//! HTTP handlers for chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::chat::{
    ChatError, GetSessionHandler, ProcessMessageCommand, ProcessMessageHandler,
    ResetSessionHandler,
};
use crate::domain::foundation::SessionId;
use crate::domain::guardrail::RejectReason;

use super::dto::{ChatMessageResponse, ErrorResponse, SendMessageRequest, SessionResponse};

#[derive(Clone)]
pub struct ChatHandlers {
    process_handler: Arc<ProcessMessageHandler>,
    reset_handler: Arc<ResetSessionHandler>,
    get_handler: Arc<GetSessionHandler>,
}

impl ChatHandlers {
    pub fn new(
        process_handler: Arc<ProcessMessageHandler>,
        reset_handler: Arc<ResetSessionHandler>,
        get_handler: Arc<GetSessionHandler>,
    ) -> Self {
        Self {
            process_handler,
            reset_handler,
            get_handler,
        }
    }
}

/// POST /chat/:id/messages - Send a message in a session
pub async fn send_message(
    State(handlers): State<ChatHandlers>,
    Path(session_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = ProcessMessageCommand {
        session_id,
        message: req.message,
    };

    match handlers.process_handler.handle(cmd).await {
        Ok(result) => {
            let response: ChatMessageResponse = result.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_chat_error(e),
    }
}

/// GET /chat/:id - Inspect a session
pub async fn get_session(
    State(handlers): State<ChatHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.get_handler.handle(session_id).await {
        Ok(session) => {
            let response: SessionResponse = session.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_chat_error(e),
    }
}

/// DELETE /chat/:id - Reset a session
pub async fn reset_session(
    State(handlers): State<ChatHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.reset_handler.handle(session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_chat_error(e),
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse::<SessionId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid session ID")),
        )
            .into_response()
    })
}

/// Maps application errors onto HTTP statuses.
fn handle_chat_error(error: ChatError) -> Response {
    match error {
        ChatError::Rejected { reason, score } => {
            let status = match reason {
                RejectReason::MalformedInput { .. } | RejectReason::InjectionDetected { .. } => {
                    StatusCode::BAD_REQUEST
                }
                RejectReason::ProhibitedContent | RejectReason::OffTopic => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            let body = ErrorResponse::with_detail(
                reason.to_string(),
                format!("relevance score {score:.2}"),
            );
            (status, Json(body)).into_response()
        }
        ChatError::SessionClosed(state) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::with_detail(
                error_text_for_closed(),
                format!("{state:?}"),
            )),
        )
            .into_response(),
        ChatError::SessionNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Session not found")),
        )
            .into_response(),
        ChatError::Conflict(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "Session was updated concurrently, retry the message",
            )),
        )
            .into_response(),
        ChatError::Store(e) => {
            tracing::error!(error = %e, "session store failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Session store unavailable")),
            )
                .into_response()
        }
        ChatError::Generator(e) => {
            tracing::error!(error = %e, "answer generation failure");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Answer generation failed")),
            )
                .into_response()
        }
    }
}

fn error_text_for_closed() -> &'static str {
    "Conversation already closed; reset the session to start over"
}
