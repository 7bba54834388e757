//! Redis configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Redis configuration
///
/// The URL is optional: when absent, the server falls back to the
/// in-memory session store and logs a warning.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: Option<String>,
}

impl RedisConfig {
    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_url_is_valid() {
        assert!(RedisConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_scheme_fails_validation() {
        let config = RedisConfig {
            url: Some("http://localhost:6379".to_string()),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn redis_scheme_passes() {
        let config = RedisConfig {
            url: Some("redis://localhost:6379".to_string()),
        };
        assert!(config.validate().is_ok());
    }
}
