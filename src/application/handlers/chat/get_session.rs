//! GetSessionHandler - read side for inspecting a conversation.

use std::sync::Arc;

use crate::domain::conversation::SessionState;
use crate::domain::foundation::SessionId;
use crate::ports::SessionStore;

use super::error::ChatError;

/// Handler for fetching session state.
pub struct GetSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl GetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, session_id: SessionId) -> Result<SessionState, ChatError> {
        self.store
            .get(&session_id)
            .await?
            .ok_or(ChatError::SessionNotFound(session_id))
    }
}
