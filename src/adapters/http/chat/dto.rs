//! HTTP DTOs for chat endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::handlers::chat::ProcessMessageResult;
use crate::domain::conversation::{LifecycleState, Role, SessionState};

/// Request to send one chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Response for a processed message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub session_id: String,
    pub reply: String,
    pub state: LifecycleState,
    pub attempt_count: u32,
    pub score: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub corrections: BTreeMap<String, String>,
}

impl From<ProcessMessageResult> for ChatMessageResponse {
    fn from(result: ProcessMessageResult) -> Self {
        Self {
            session_id: result.session_id.to_string(),
            reply: result.reply,
            state: result.lifecycle,
            attempt_count: result.attempt_count,
            score: result.score,
            corrections: result.corrections,
        }
    }
}

/// One turn of stored conversation history.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub role: Role,
    pub content: String,
    pub at: String,
}

/// Full session view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub state: LifecycleState,
    pub attempt_count: u32,
    pub history: Vec<TurnResponse>,
    pub created_at: String,
    pub last_updated: String,
}

impl From<SessionState> for SessionResponse {
    fn from(session: SessionState) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            state: session.lifecycle,
            attempt_count: session.attempt_count,
            history: session
                .history
                .into_iter()
                .map(|turn| TurnResponse {
                    role: turn.role,
                    content: turn.content,
                    at: turn.at.to_string(),
                })
                .collect(),
            created_at: session.created_at.to_string(),
            last_updated: session.last_updated.to_string(),
        }
    }
}

/// Error payload for all chat endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: Some(detail.into()),
        }
    }
}
