//! Session store port.
//!
//! Defines the contract for persisting conversation sessions between
//! messages. Implementations back this with Redis in production and an
//! in-process map for tests and degraded operation.
//!
//! # Design
//!
//! - **Optimistic concurrency**: writes carry the version the caller
//!   read; a mismatch means another writer got there first.
//! - **TTL-based expiry**: implementations drop idle sessions on their
//!   own schedule; a missing session is not an error.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::SessionState;
use crate::domain::foundation::SessionId;

/// Failures surfaced by session store implementations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Another writer updated the session between read and write.
    #[error("session {0} was modified concurrently")]
    VersionConflict(SessionId),

    /// The backing store cannot be reached.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// The stored payload could not be decoded.
    #[error("stored session is corrupt: {0}")]
    Corrupt(String),
}

/// Port for session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session. Returns `None` when absent or expired.
    async fn get(&self, id: &SessionId) -> Result<Option<SessionState>, SessionStoreError>;

    /// Write a session if the stored version still equals
    /// `expected_version` (0 when the caller saw no session).
    ///
    /// # Errors
    ///
    /// - `VersionConflict` when another writer advanced the session
    /// - `Unavailable` on connectivity failure
    async fn put(
        &self,
        session: &SessionState,
        expected_version: u64,
    ) -> Result<(), SessionStoreError>;

    /// Remove a session. Deleting an absent session is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;

    /// Cheap connectivity probe for health checks and startup fallback.
    async fn ping(&self) -> Result<(), SessionStoreError>;
}
