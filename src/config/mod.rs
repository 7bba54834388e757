//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `REPAIR_CONCIERGE` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use repair_concierge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod guardrail;
mod redis;
mod server;
mod session;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use guardrail::GuardrailConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration (session store); optional
    #[serde(default)]
    pub redis: RedisConfig,

    /// Ollama configuration (answers and topic checks)
    #[serde(default)]
    pub ai: AiConfig,

    /// Guardrail thresholds and strategy
    #[serde(default)]
    pub guardrail: GuardrailConfig,

    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - Loads a `.env` file if present (for development)
    /// - Reads variables with the `REPAIR_CONCIERGE` prefix
    /// - `__` separates nested values:
    ///   `REPAIR_CONCIERGE__SERVER__PORT=8080` -> `server.port = 8080`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when values cannot be parsed into the
    /// expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("REPAIR_CONCIERGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.redis.validate()?;
        self.ai.validate()?;
        self.guardrail.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
