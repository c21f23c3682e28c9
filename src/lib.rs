//! MindBloom - fuzzy-inference engine for behavioral scoring
//!
//! Turns a hand-movement trace (speed, range, symmetry per frame) and an
//! emotion trace (seven category confidences per frame) into three scores in
//! [0, 1] through a chain of Mamdani inference stages:
//! per-frame reaction time → pause frequency → motor engagement → focus, plus
//! an independent emotional-stability stage.
//!
//! ## Modules
//!
//! - **fuzzy**: membership functions, rule trees and the inference engine
//! - **stages**: the five rule bases
//! - **features**: normalization and emotion-trace feature extraction
//! - **pipeline**: orchestration and the JSON entry points

pub mod config;
pub mod error;
pub mod features;
pub mod fixtures;
pub mod fuzzy;
pub mod pipeline;
pub mod stages;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{FailurePolicy, PipelineConfig};
pub use error::ComputeError;
pub use features::{normalize_reduce, ReduceMode};
pub use fuzzy::{membership, Triangular};
pub use pipeline::{emotion_stability_to_json, emotion_state_to_json, FuzzyPipeline};
pub use stages::StageKind;
pub use types::{
    BehavioralTrace, EmotionStateRequest, EmotionStateScores, EmotionTrace, PartialScores,
    PipelineReport,
};

/// Library version reported by the CLI and FFI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
