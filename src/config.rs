//! Pipeline configuration
//!
//! Every field has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Crisp value returned when defuzzification has nothing to integrate
pub const DEFAULT_DEGENERACY_FALLBACK: f64 = 0.5;

/// Upper bound on frames per trace; per-frame stages are linear in this
pub const DEFAULT_MAX_FRAMES: usize = 10_000;

/// What to do with the remaining scores when one input trace fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Withhold all three scores together
    #[default]
    FailTogether,
    /// Report every score whose inputs validated
    Partial,
}

/// Tunable policy points of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub degeneracy_fallback: f64,
    pub max_frames: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            degeneracy_fallback: DEFAULT_DEGENERACY_FALLBACK,
            max_frames: DEFAULT_MAX_FRAMES,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if !(0.0..=1.0).contains(&self.degeneracy_fallback) {
            return Err(ComputeError::Configuration(format!(
                "degeneracy_fallback must lie in [0, 1], got {}",
                self.degeneracy_fallback
            )));
        }
        if self.max_frames < 2 {
            return Err(ComputeError::Configuration(format!(
                "max_frames must be at least 2, got {}",
                self.max_frames
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config =
            PipelineConfig::from_json(r#"{"failure_policy": "partial", "max_frames": 64}"#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Partial);
        assert_eq!(config.max_frames, 64);
        assert_eq!(config.degeneracy_fallback, DEFAULT_DEGENERACY_FALLBACK);
    }

    #[test]
    fn test_rejects_out_of_range_fallback() {
        let result = PipelineConfig::from_json(r#"{"degeneracy_fallback": 1.5}"#);
        assert!(matches!(result, Err(ComputeError::Configuration(_))));
    }

    #[test]
    fn test_rejects_tiny_frame_cap() {
        let result = PipelineConfig::from_json(r#"{"max_frames": 1}"#);
        assert!(matches!(result, Err(ComputeError::Configuration(_))));
    }

    #[test]
    fn test_unknown_policy_is_json_error() {
        let result = PipelineConfig::from_json(r#"{"failure_policy": "sometimes"}"#);
        assert!(matches!(result, Err(ComputeError::Json(_))));
    }
}
