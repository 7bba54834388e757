//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid Ollama base URL format")]
    InvalidOllamaUrl,

    #[error("Guardrail minimum score must be within [0, 1]")]
    InvalidMinScore,

    #[error("Guardrail uncertain band must be ordered and within [0, 1]")]
    InvalidUncertainBand,

    #[error("Max attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Session TTL must be at least 60 seconds")]
    InvalidSessionTtl,
}
