//! The five hand-authored rule bases
//!
//! Each stage module defines an enum of its input variables, a struct of named
//! crisp inputs, the variable definitions and the rule list. Dependency order:
//!
//! ```text
//! trace ─► reaction_time (per frame) ─┬─► pause_frequency ─► focus
//!                                     ├─► motor_engagement (per frame)
//!                                     └──────────────────────► focus
//! emotions ─► stability
//! emotions ─► focus
//! ```

pub mod focus;
pub mod motor_engagement;
pub mod pause_frequency;
pub mod reaction_time;
pub mod stability;

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::fuzzy::FuzzySystem;

/// Identifies one inference stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    ReactionTime,
    PauseFrequency,
    MotorEngagement,
    FocusAttention,
    EmotionalStability,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::ReactionTime,
        StageKind::PauseFrequency,
        StageKind::MotorEngagement,
        StageKind::FocusAttention,
        StageKind::EmotionalStability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::ReactionTime => "reaction_time",
            StageKind::PauseFrequency => "pause_frequency",
            StageKind::MotorEngagement => "motor_engagement",
            StageKind::FocusAttention => "focus_attention",
            StageKind::EmotionalStability => "emotional_stability",
        }
    }
}

/// All five rule bases, built once and shared read-only
#[derive(Debug, Clone)]
pub struct StageSystems {
    pub reaction_time: FuzzySystem<reaction_time::ReactionVar>,
    pub pause_frequency: FuzzySystem<pause_frequency::PauseVar>,
    pub motor_engagement: FuzzySystem<motor_engagement::MotorVar>,
    pub focus: FuzzySystem<focus::FocusVar>,
    pub stability: FuzzySystem<stability::StabilityVar>,
}

impl StageSystems {
    /// Build every stage, using `fallback` when a stage has nothing to defuzzify
    pub fn build(fallback: f64) -> Result<Self, ComputeError> {
        Ok(Self {
            reaction_time: reaction_time::system()?.with_fallback(fallback),
            pause_frequency: pause_frequency::system()?.with_fallback(fallback),
            motor_engagement: motor_engagement::system()?.with_fallback(fallback),
            focus: focus::system()?.with_fallback(fallback),
            stability: stability::system()?.with_fallback(fallback),
        })
    }

    pub fn rule_count(&self, stage: StageKind) -> usize {
        match stage {
            StageKind::ReactionTime => self.reaction_time.rule_count(),
            StageKind::PauseFrequency => self.pause_frequency.rule_count(),
            StageKind::MotorEngagement => self.motor_engagement.rule_count(),
            StageKind::FocusAttention => self.focus.rule_count(),
            StageKind::EmotionalStability => self.stability.rule_count(),
        }
    }
}
