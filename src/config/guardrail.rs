//! Guardrail tuning configuration

use serde::Deserialize;

use crate::domain::guardrail::{GuardrailPolicy, ValidationStrategy};

use super::error::ValidationError;

/// Thresholds and strategy for the admission pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardrailConfig {
    /// Minimum fused score for a message to be admitted
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Validation strategy
    #[serde(default)]
    pub strategy: ValidationStrategy,

    /// Lower bound of the uncertain band (LLM-assisted strategy only)
    #[serde(default = "default_uncertain_low")]
    pub uncertain_low: f64,

    /// Upper bound of the uncertain band
    #[serde(default = "default_uncertain_high")]
    pub uncertain_high: f64,

    /// Answers allowed per problem before suggesting a professional
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl GuardrailConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ValidationError::InvalidMinScore);
        }
        let band_ok = (0.0..=1.0).contains(&self.uncertain_low)
            && (0.0..=1.0).contains(&self.uncertain_high)
            && self.uncertain_low < self.uncertain_high;
        if !band_ok {
            return Err(ValidationError::InvalidUncertainBand);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        Ok(())
    }

    /// Builds the domain policy from this configuration.
    pub fn policy(&self) -> GuardrailPolicy {
        GuardrailPolicy {
            min_score: self.min_score,
            strategy: self.strategy,
            uncertain_band: (self.uncertain_low, self.uncertain_high),
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            strategy: ValidationStrategy::default(),
            uncertain_low: default_uncertain_low(),
            uncertain_high: default_uncertain_high(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_min_score() -> f64 {
    0.3
}

fn default_uncertain_low() -> f64 {
    0.15
}

fn default_uncertain_high() -> f64 {
    0.3
}

fn default_max_attempts() -> u32 {
    3
}
