//! Redis-backed session store for production deployments.
//!
//! Sessions are stored as JSON under a prefixed key with a TTL that
//! refreshes on every write. Writes go through a small Lua script so the
//! version check and the SET happen atomically; without it two servers
//! handling the same session could interleave read-modify-write cycles.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::domain::conversation::SessionState;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, SessionStoreError};

/// Compare-and-set write: admits the payload only when the stored
/// version matches the expected one (absent counts as version 0).
static CAS_PUT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local current = redis.call('GET', KEYS[1])
        local expected = tonumber(ARGV[1])
        if current then
            local decoded = cjson.decode(current)
            if decoded.version ~= expected then
                return 0
            end
        elseif expected ~= 0 then
            return 0
        end
        redis.call('SET', KEYS[1], ARGV[2], 'EX', tonumber(ARGV[3]))
        return 1
        ",
    )
});

/// Redis session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(conn: MultiplexedConnection, ttl_secs: u64) -> Self {
        Self { conn, ttl_secs }
    }

    /// Connects to Redis and wraps the connection in a store.
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        Ok(Self::new(conn, ttl_secs))
    }

    fn key(id: &SessionId) -> String {
        format!("repair:session:{id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionState>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(Self::key(id))
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        match payload {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| SessionStoreError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        session: &SessionState,
        expected_version: u64,
    ) -> Result<(), SessionStoreError> {
        let payload = serde_json::to_string(session)
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;

        let mut conn = self.conn.clone();
        let admitted: i64 = CAS_PUT
            .key(Self::key(&session.session_id))
            .arg(expected_version)
            .arg(payload)
            .arg(self.ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        if admitted == 1 {
            Ok(())
        } else {
            Err(SessionStoreError::VersionConflict(session.session_id))
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(id))
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))
    }

    async fn ping(&self) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed_by_namespace() {
        let id = SessionId::new();
        let key = RedisSessionStore::key(&id);
        assert!(key.starts_with("repair:session:"));
        assert!(key.ends_with(&id.to_string()));
    }
}
