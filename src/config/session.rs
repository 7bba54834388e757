//! Session storage configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Session persistence settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Idle time before a session expires, in seconds
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_secs < 60 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}
