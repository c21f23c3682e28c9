//! Error types for MindBloom

use thiserror::Error;

/// Errors that can occur while validating inputs or running inference
#[derive(Debug, Error)]
pub enum ComputeError {
    /// Unrecognized option or malformed rule base / pipeline configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input trace rejected before any inference ran
    #[error("Validation error: {0}")]
    Validation(String),

    /// Centroid denominator collapsed and the caller asked for strict evaluation
    #[error("Numeric degeneracy in stage '{stage}': no rule fired")]
    Degenerate { stage: &'static str },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ComputeError {
    /// Stable machine-readable code, used by the CLI and partial responses
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::Configuration(_) => "CONFIGURATION_ERROR",
            ComputeError::Validation(_) => "VALIDATION_ERROR",
            ComputeError::Degenerate { .. } => "NUMERIC_DEGENERACY",
            ComputeError::Json(_) => "JSON_ERROR",
        }
    }
}
