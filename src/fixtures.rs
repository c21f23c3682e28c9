//! Reference traces
//!
//! A ten-frame emotion trace and a five-frame linear motion ramp. They back
//! the regression baselines in the test suite and the CLI `doctor` command.

use crate::types::{EmotionFrame, EmotionStateRequest};

pub const SAMPLE_EMOTIONS: [EmotionFrame; 10] = [
    [0.70, 0.05, 0.05, 0.05, 0.05, 0.05, 0.05],
    [0.60, 0.10, 0.05, 0.10, 0.05, 0.05, 0.05],
    [0.40, 0.15, 0.05, 0.15, 0.05, 0.05, 0.05],
    [0.40, 0.20, 0.05, 0.20, 0.05, 0.05, 0.05],
    [0.45, 0.25, 0.05, 0.15, 0.05, 0.05, 0.00],
    [0.30, 0.10, 0.05, 0.10, 0.10, 0.05, 0.05],
    [0.65, 0.05, 0.05, 0.05, 0.10, 0.05, 0.05],
    [0.60, 0.05, 0.10, 0.05, 0.05, 0.10, 0.05],
    [0.40, 0.10, 0.20, 0.05, 0.10, 0.10, 0.05],
    [0.20, 0.00, 0.25, 0.05, 0.00, 0.10, 0.05],
];

pub const SAMPLE_MOTION: [f64; 5] = [0.5, 0.6, 0.7, 0.8, 0.9];

/// The reference traces as a wire request
pub fn sample_request() -> EmotionStateRequest {
    EmotionStateRequest {
        emotion: SAMPLE_EMOTIONS.iter().map(|frame| frame.to_vec()).collect(),
        speed: SAMPLE_MOTION.to_vec(),
        ranges: SAMPLE_MOTION.to_vec(),
        symmetry: SAMPLE_MOTION.to_vec(),
    }
}
