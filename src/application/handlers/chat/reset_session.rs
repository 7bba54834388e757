//! ResetSessionHandler - wipes a conversation so the user can start over.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::ports::SessionStore;

use super::error::ChatError;

/// Handler for resetting (deleting) a session.
pub struct ResetSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl ResetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Deletes the session. Resetting an absent session succeeds, so the
    /// operation is safe to retry.
    pub async fn handle(&self, session_id: SessionId) -> Result<(), ChatError> {
        self.store.delete(&session_id).await?;
        tracing::info!(%session_id, "session reset");
        Ok(())
    }
}
