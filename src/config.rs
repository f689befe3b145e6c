//! Engine configuration
//!
//! The defaults reproduce the study's fixed constants. A JSON file may override
//! any subset of fields; omitted fields keep their default.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Decision time substituted for every scenario when no scenario has usable timing
pub const DEFAULT_FALLBACK_DECISION_TIME_SEC: f64 = 75.0;

/// Lives saved at which the first composite dimension saturates
pub const DEFAULT_LIVES_SAVED_CAP: f64 = 20_000.0;

/// Casualties at which the second composite dimension bottoms out
pub const DEFAULT_HUMAN_CASUALTIES_CAP: f64 = 1_000.0;

/// Tunable constants consulted by the aggregation stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Session-wide fallback decision time in seconds
    pub fallback_decision_time_sec: f64,
    /// Normalization cap for `livesSaved`
    pub lives_saved_cap: f64,
    /// Normalization cap for `humanCasualties`
    pub human_casualties_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_decision_time_sec: DEFAULT_FALLBACK_DECISION_TIME_SEC,
            lives_saved_cap: DEFAULT_LIVES_SAVED_CAP,
            human_casualties_cap: DEFAULT_HUMAN_CASUALTIES_CAP,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    /// Reject values that would make the normalization divide by zero or go negative
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.fallback_decision_time_sec.is_nan() || self.fallback_decision_time_sec < 0.0 {
            return Err(ComputeError::ConfigError(
                "fallback_decision_time_sec must be non-negative".to_string(),
            ));
        }
        if self.lives_saved_cap.is_nan() || self.lives_saved_cap <= 0.0 {
            return Err(ComputeError::ConfigError(
                "lives_saved_cap must be positive".to_string(),
            ));
        }
        if self.human_casualties_cap.is_nan() || self.human_casualties_cap <= 0.0 {
            return Err(ComputeError::ConfigError(
                "human_casualties_cap must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
