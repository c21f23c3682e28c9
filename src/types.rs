//! Core data types for MindBloom
//!
//! Traces are validated on construction; wire types mirror the JSON contract of
//! the `/emotion_state` transport layer.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::stages::StageKind;

/// Emotion categories per frame
pub const EMOTION_CATEGORIES: usize = 7;

/// Shortest trace that supports consecutive-frame statistics
pub const MIN_FRAMES: usize = 2;

/// Per-frame confidences, one per emotion category
pub type EmotionFrame = [f64; EMOTION_CATEGORIES];

/// Reject sequences that are too short or carry NaN/inf samples
pub(crate) fn check_sequence(name: &str, values: &[f64]) -> Result<(), ComputeError> {
    if values.len() < MIN_FRAMES {
        return Err(ComputeError::Validation(format!(
            "{} needs at least {} samples, got {}",
            name,
            MIN_FRAMES,
            values.len()
        )));
    }
    if let Some(position) = values.iter().position(|v| !v.is_finite()) {
        return Err(ComputeError::Validation(format!(
            "{}[{}] is not a finite number",
            name, position
        )));
    }
    Ok(())
}

/// Hand-movement trace: equal-length speed, range and symmetry sequences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehavioralTrace {
    speed: Vec<f64>,
    range: Vec<f64>,
    symmetry: Vec<f64>,
}

impl BehavioralTrace {
    pub fn new(speed: Vec<f64>, range: Vec<f64>, symmetry: Vec<f64>) -> Result<Self, ComputeError> {
        if speed.len() != range.len() || speed.len() != symmetry.len() {
            return Err(ComputeError::Validation(format!(
                "trace length mismatch: speed={}, range={}, symmetry={}",
                speed.len(),
                range.len(),
                symmetry.len()
            )));
        }
        check_sequence("speed", &speed)?;
        check_sequence("range", &range)?;
        check_sequence("symmetry", &symmetry)?;
        Ok(Self {
            speed,
            range,
            symmetry,
        })
    }

    pub fn len(&self) -> usize {
        self.speed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speed.is_empty()
    }

    pub fn speed(&self) -> &[f64] {
        &self.speed
    }

    pub fn range(&self) -> &[f64] {
        &self.range
    }

    pub fn symmetry(&self) -> &[f64] {
        &self.symmetry
    }
}

/// Sequence of per-frame emotion-confidence vectors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionTrace {
    frames: Vec<EmotionFrame>,
}

impl EmotionTrace {
    /// Build from loosely-typed rows, checking each has exactly seven confidences
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ComputeError> {
        let frames = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                <EmotionFrame>::try_from(row.as_slice()).map_err(|_| {
                    ComputeError::Validation(format!(
                        "emotion frame {} has {} categories, expected {}",
                        index,
                        row.len(),
                        EMOTION_CATEGORIES
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_frames(frames)
    }

    pub fn from_frames(frames: Vec<EmotionFrame>) -> Result<Self, ComputeError> {
        check_frames(&frames)?;
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[EmotionFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Length and range checks shared by every emotion-trace consumer
pub(crate) fn check_frames(frames: &[EmotionFrame]) -> Result<(), ComputeError> {
    if frames.len() < MIN_FRAMES {
        return Err(ComputeError::Validation(format!(
            "emotion trace needs at least {} frames, got {}",
            MIN_FRAMES,
            frames.len()
        )));
    }
    for (index, frame) in frames.iter().enumerate() {
        if let Some(category) = frame
            .iter()
            .position(|c| !c.is_finite() || !(0.0..=1.0).contains(c))
        {
            return Err(ComputeError::Validation(format!(
                "emotion frame {} category {} is outside [0, 1]: {}",
                index, category, frame[category]
            )));
        }
    }
    Ok(())
}

/// Request body of the `/emotion_state` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionStateRequest {
    pub emotion: Vec<Vec<f64>>,
    pub speed: Vec<f64>,
    pub ranges: Vec<f64>,
    pub symmetry: Vec<f64>,
}

impl EmotionStateRequest {
    pub fn behavioral_trace(&self) -> Result<BehavioralTrace, ComputeError> {
        BehavioralTrace::new(
            self.speed.clone(),
            self.ranges.clone(),
            self.symmetry.clone(),
        )
    }

    pub fn emotion_trace(&self) -> Result<EmotionTrace, ComputeError> {
        EmotionTrace::new(self.emotion.clone())
    }
}

/// Request body carrying only the emotion trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionOnlyRequest {
    pub emotion: Vec<Vec<f64>>,
}

/// Response body of the `/emotion_state` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionStateScores {
    pub focus_score: f64,
    pub motor_engagement_score: f64,
    pub emotion_stability_score: f64,
}

/// Response body of the stability-only call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityScore {
    pub emotion_stability_score: f64,
}

/// Why one score was withheld under the partial failure policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreError {
    pub score: String,
    pub code: String,
    pub message: String,
}

/// Scores under the partial failure policy; `None` marks a withheld score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialScores {
    pub focus_score: Option<f64>,
    pub motor_engagement_score: Option<f64>,
    pub emotion_stability_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ScoreError>,
}

/// Emotional-stability inputs derived from an emotion trace, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityFeatures {
    pub volatility: f64,
    pub microexpression_rate: f64,
    pub expression_change_rate: f64,
}

/// Scores plus every intermediate the pipeline computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub scores: EmotionStateScores,
    pub reaction_times: Vec<f64>,
    pub reaction_time_mean: f64,
    pub pause_frequency: f64,
    pub motor_engagement_frames: Vec<f64>,
    pub focus_feature: f64,
    pub stability_features: StabilityFeatures,
    /// Stages where at least one inference fell back because nothing fired
    pub degenerate_stages: Vec<StageKind>,
}
