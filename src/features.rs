//! Feature extraction from raw traces
//!
//! Pure functions turning behavioral and emotion traces into the scalar inputs
//! of the scalar inference stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::types::{check_frames, EmotionFrame, StabilityFeatures, EMOTION_CATEGORIES};

/// Guards min-max normalization of a constant sequence
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Frame-to-frame confidence rise that counts as a microexpression
pub const MICROEXPRESSION_SPIKE_THRESHOLD: f64 = 0.3;

/// How a min-max normalized sequence is collapsed to one number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceMode {
    /// Arithmetic mean, in [0, 1]
    #[default]
    Mean,
    /// Total, in [0, N]
    Sum,
    /// Weighted mean with weights rising linearly from 1 to 2, in [0, 1]
    Weighted,
}

impl FromStr for ReduceMode {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(ReduceMode::Mean),
            "sum" => Ok(ReduceMode::Sum),
            "weighted" => Ok(ReduceMode::Weighted),
            other => Err(ComputeError::Configuration(format!(
                "reduce mode must be 'mean', 'sum', or 'weighted', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReduceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReduceMode::Mean => "mean",
            ReduceMode::Sum => "sum",
            ReduceMode::Weighted => "weighted",
        };
        f.write_str(name)
    }
}

/// Rescale to [0, 1] with `(x - min) / (max - min + eps)` and reduce
pub fn normalize_reduce(values: &[f64], mode: ReduceMode) -> Result<f64, ComputeError> {
    if values.is_empty() {
        return Err(ComputeError::Validation(
            "cannot normalize an empty sequence".to_string(),
        ));
    }

    if let Some(position) = values.iter().position(|v| !v.is_finite()) {
        return Err(ComputeError::Validation(format!(
            "cannot normalize non-finite value at index {}",
            position
        )));
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min + NORMALIZE_EPSILON;
    // finite samples can still overflow the span
    if !span.is_finite() {
        return Err(ComputeError::Validation(format!(
            "value spread {} .. {} is too wide to normalize",
            min, max
        )));
    }
    let normalized = values.iter().map(|&x| (x - min) / span);

    let n = values.len();
    let reduced = match mode {
        ReduceMode::Mean => normalized.sum::<f64>() / n as f64,
        ReduceMode::Sum => normalized.sum::<f64>(),
        ReduceMode::Weighted => {
            let weights = linear_weights(n);
            let total_weight: f64 = weights.iter().sum();
            let dot: f64 = normalized.zip(&weights).map(|(x, w)| x * w).sum();
            dot / total_weight
        }
    };
    Ok(reduced)
}

/// Same as [`normalize_reduce`] with the mode given by name
pub fn normalize_reduce_named(values: &[f64], mode: &str) -> Result<f64, ComputeError> {
    normalize_reduce(values, mode.parse()?)
}

/// Weights 1 → 2 evenly spaced over `n` positions
fn linear_weights(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let step = 1.0 / (n - 1) as f64;
    let mut weights: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * step).collect();
    weights[n - 1] = 2.0;
    weights
}

/// Dominant category of a frame and its confidence; ties go to the lowest index
pub fn dominant(frame: &EmotionFrame) -> (usize, f64) {
    let mut best = (0, frame[0]);
    for (index, &confidence) in frame.iter().enumerate().skip(1) {
        if confidence > best.1 {
            best = (index, confidence);
        }
    }
    best
}

/// Fraction of consecutive frame pairs whose dominant categories differ
fn change_rate(dominants: &[usize]) -> f64 {
    let changes = dominants.windows(2).filter(|w| w[0] != w[1]).count();
    changes as f64 / (dominants.len() - 1) as f64
}

/// Focus feature: `0.5 * consistency + 0.5 * mean dominant confidence`
///
/// Consistency is the fraction of consecutive frames sharing a dominant category.
pub fn focus_feature(frames: &[EmotionFrame]) -> Result<f64, ComputeError> {
    check_frames(frames)?;

    let (indices, strengths): (Vec<usize>, Vec<f64>) = frames.iter().map(dominant).unzip();
    let consistency = 1.0 - change_rate(&indices);
    let avg_strength = strengths.iter().sum::<f64>() / strengths.len() as f64;

    Ok(0.5 * consistency + 0.5 * avg_strength)
}

/// Volatility, microexpression rate and expression-change rate of a trace
pub fn stability_features(frames: &[EmotionFrame]) -> Result<StabilityFeatures, ComputeError> {
    check_frames(frames)?;

    let indices: Vec<usize> = frames.iter().map(|f| dominant(f).0).collect();
    let n = indices.len() as f64;
    let spread = (EMOTION_CATEGORIES - 1) as f64;

    // population std of dominant indices, scaled by the widest possible spread
    let mean = indices.iter().map(|&i| i as f64).sum::<f64>() / n;
    let variance = indices
        .iter()
        .map(|&i| (i as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let volatility = variance.sqrt() / spread;

    let expression_change_rate = change_rate(&indices);

    let mut spikes = 0usize;
    for (pair, &current_dominant) in frames.windows(2).zip(indices.iter().skip(1)) {
        let (previous, current) = (&pair[0], &pair[1]);
        spikes += (0..EMOTION_CATEGORIES)
            .filter(|&category| {
                category != current_dominant
                    && current[category] - previous[category] > MICROEXPRESSION_SPIKE_THRESHOLD
            })
            .count();
    }
    let microexpression_rate = spikes as f64 / ((frames.len() - 1) as f64 * spread);

    Ok(StabilityFeatures {
        volatility,
        microexpression_rate,
        expression_change_rate,
    })
}
