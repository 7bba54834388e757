//! In-memory session store for testing and degraded operation.
//!
//! Backs the session store port with a process-local map. Used by the
//! test suite and as the fallback when Redis is unreachable at startup.
//! Not suitable for multi-server deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::conversation::SessionState;
use crate::domain::foundation::{SessionId, Timestamp};
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
struct Entry {
    session: SessionState,
    expires_at: Timestamp,
}

impl Entry {
    fn is_live(&self, now: &Timestamp) -> bool {
        self.expires_at.is_after(now)
    }
}

/// Process-local session store with TTL-based expiry.
///
/// Expired entries are dropped lazily on access.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<SessionId, Entry>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// One-hour TTL, matching the production default.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(3600))
    }

    /// Number of live sessions, for tests.
    pub async fn len(&self) -> usize {
        let now = Timestamp::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(&now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionState>, SessionStoreError> {
        let now = Timestamp::now();
        let mut entries = self.entries.write().await;
        match entries.get(id) {
            Some(entry) if entry.is_live(&now) => Ok(Some(entry.session.clone())),
            Some(_) => {
                entries.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        session: &SessionState,
        expected_version: u64,
    ) -> Result<(), SessionStoreError> {
        let now = Timestamp::now();
        let mut entries = self.entries.write().await;

        let current = entries
            .get(&session.session_id)
            .filter(|e| e.is_live(&now))
            .map(|e| e.session.version)
            .unwrap_or(0);
        if current != expected_version {
            return Err(SessionStoreError::VersionConflict(session.session_id));
        }

        entries.insert(
            session.session_id,
            Entry {
                session: session.clone(),
                expires_at: now.add_secs(self.ttl.as_secs() as i64),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.entries.write().await.remove(id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), SessionStoreError> {
        Ok(())
    }
}
