//! Stage F: focus attention score
//!
//! Combines the emotion-derived focus feature with pause frequency (stage P)
//! and the reduced reaction-time mean (stage R).

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::fuzzy::membership::MEDIUM5_NARROW;
use crate::fuzzy::{
    and, is, or, CrispInputs, FuzzySystem, FuzzyVariable, InputVariable, Partition, Rule, Universe,
};

/// Universe resolution
pub const UNIVERSE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusVar {
    Focus,
    PauseFrequency,
    ReactionTime,
}

impl InputVariable for FocusVar {
    const ALL: &'static [Self] = &[FocusVar::Focus, FocusVar::PauseFrequency, FocusVar::ReactionTime];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            FocusVar::Focus => "focus",
            FocusVar::PauseFrequency => "pause_frequency",
            FocusVar::ReactionTime => "reaction_time_ms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusInputs {
    pub focus: f64,
    pub pause_frequency: f64,
    pub reaction_time: f64,
}

impl CrispInputs<FocusVar> for FocusInputs {
    fn crisp(&self, var: FocusVar) -> f64 {
        match var {
            FocusVar::Focus => self.focus,
            FocusVar::PauseFrequency => self.pause_frequency,
            FocusVar::ReactionTime => self.reaction_time,
        }
    }
}

fn five_level(name: &'static str, universe: &Universe) -> FuzzyVariable {
    FuzzyVariable::new(name, universe.clone(), Partition::five_level(MEDIUM5_NARROW))
}

pub fn system() -> Result<FuzzySystem<FocusVar>, ComputeError> {
    let universe = Universe::stepped(UNIVERSE_STEP)?;
    FuzzySystem::new(
        |var: FocusVar| five_level(var.name(), &universe),
        five_level("focus_attention_score", &universe),
        rules(),
    )
}

pub fn rules() -> Vec<Rule<FocusVar>> {
    use crate::fuzzy::Level::*;
    use FocusVar::*;

    vec![
        // excellent focus
        Rule::new(and([is(Focus, VeryHigh), is(PauseFrequency, VeryLow), is(ReactionTime, VeryLow)]), VeryHigh),
        Rule::new(and([is(Focus, High), is(PauseFrequency, Low), is(ReactionTime, Low)]), High),
        // good focus, slower response
        Rule::new(and([is(Focus, High), is(PauseFrequency, Medium), is(ReactionTime, Medium)]), Medium),
        Rule::new(and([is(Focus, Medium), is(PauseFrequency, Low), is(ReactionTime, Low)]), Medium),
        // mixed focus or more pauses
        Rule::new(and([is(Focus, Medium), is(PauseFrequency, Medium), is(ReactionTime, Medium)]), Medium),
        Rule::new(and([is(Focus, Low), is(PauseFrequency, Medium), is(ReactionTime, Medium)]), Low),
        // poor focus, long delays
        Rule::new(and([is(Focus, Low), is(PauseFrequency, High), is(ReactionTime, High)]), Low),
        Rule::new(and([is(Focus, VeryLow), is(PauseFrequency, VeryHigh)]), VeryLow),
        Rule::new(and([is(Focus, VeryLow), is(PauseFrequency, VeryHigh), is(ReactionTime, VeryHigh)]), VeryLow),
        // any single extreme
        Rule::new(or([is(Focus, VeryLow), is(PauseFrequency, VeryHigh), is(ReactionTime, VeryHigh)]), VeryLow),
        Rule::new(or([is(Focus, VeryHigh), is(PauseFrequency, VeryLow), is(ReactionTime, VeryLow)]), VeryHigh),
        // mixed but recovering
        Rule::new(and([is(Focus, High), is(ReactionTime, High)]), Medium),
        Rule::new(and([is(Focus, Medium), is(PauseFrequency, Low), is(ReactionTime, Medium)]), Medium),
        Rule::new(and([is(Focus, Medium), is(PauseFrequency, High), is(ReactionTime, Low)]), Low),
        // inconsistent but decent
        Rule::new(and([is(Focus, High), is(PauseFrequency, High), is(ReactionTime, Low)]), Medium),
        Rule::new(and([is(Focus, Medium), is(PauseFrequency, VeryLow), is(ReactionTime, VeryHigh)]), Low),
        Rule::new(and([is(Focus, Medium), is(PauseFrequency, Medium), is(ReactionTime, Low)]), Medium),
        Rule::new(and([is(Focus, Low), is(PauseFrequency, Low), is(ReactionTime, Low)]), Medium),
        // starts well, ends poorly
        Rule::new(and([is(Focus, High), is(PauseFrequency, Medium)]), Low),
        Rule::new(and([is(Focus, Medium), is(ReactionTime, VeryHigh)]), Low),
        // weighted on focus alone
        Rule::new(is(Focus, Medium), Medium),
        Rule::new(and([is(Focus, VeryLow), is(PauseFrequency, Medium)]), Low),
        Rule::new(and([is(Focus, VeryHigh), is(PauseFrequency, Medium)]), High),
        Rule::new(and([is(Focus, Low), is(PauseFrequency, VeryLow), is(ReactionTime, VeryLow)]), Medium),
        Rule::new(and([is(Focus, High), is(PauseFrequency, VeryLow), is(ReactionTime, VeryLow)]), High),
        Rule::new(and([is(Focus, VeryHigh), is(ReactionTime, Medium)]), High),
        Rule::new(and([is(PauseFrequency, VeryHigh), is(ReactionTime, VeryLow)]), Low),
    ]
}
