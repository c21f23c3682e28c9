//! Stage P: pause frequency from trace-level motion features

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::fuzzy::{
    and, is, CrispInputs, FuzzySystem, FuzzyVariable, InputVariable, Level, Partition, Rule,
    Triangular, Universe,
};

/// Universe resolution
pub const UNIVERSE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseVar {
    ReactionTime,
    Speed,
    Range,
    Symmetry,
}

impl InputVariable for PauseVar {
    const ALL: &'static [Self] = &[
        PauseVar::ReactionTime,
        PauseVar::Speed,
        PauseVar::Range,
        PauseVar::Symmetry,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            PauseVar::ReactionTime => "reaction_time",
            PauseVar::Speed => "speed",
            PauseVar::Range => "range",
            PauseVar::Symmetry => "symmetry",
        }
    }
}

/// Min-max reduced means of the reaction-time array and the raw trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseInputs {
    pub reaction_time_mean: f64,
    pub speed: f64,
    pub range: f64,
    pub symmetry: f64,
}

impl CrispInputs<PauseVar> for PauseInputs {
    fn crisp(&self, var: PauseVar) -> f64 {
        match var {
            PauseVar::ReactionTime => self.reaction_time_mean,
            PauseVar::Speed => self.speed,
            PauseVar::Range => self.range,
            PauseVar::Symmetry => self.symmetry,
        }
    }
}

/// Output sets; `medium` is deliberately narrow
fn output_partition() -> Partition {
    Partition::from_sets([
        (Level::VeryLow, Triangular::new(0.0, 0.0, 0.2)),
        (Level::Low, Triangular::new(0.1, 0.3, 0.5)),
        (Level::Medium, Triangular::new(0.4, 0.5, 0.6)),
        (Level::High, Triangular::new(0.5, 0.7, 0.9)),
        (Level::VeryHigh, Triangular::new(0.8, 1.0, 1.0)),
    ])
}

pub fn system() -> Result<FuzzySystem<PauseVar>, ComputeError> {
    let universe = Universe::stepped(UNIVERSE_STEP)?;
    FuzzySystem::new(
        |var: PauseVar| FuzzyVariable::new(var.name(), universe.clone(), Partition::three_level()),
        FuzzyVariable::new("pause_frequency", universe.clone(), output_partition()),
        rules(),
    )
}

pub fn rules() -> Vec<Rule<PauseVar>> {
    use Level::*;
    use PauseVar::*;

    vec![
        Rule::new(
            and([is(ReactionTime, Low), is(Speed, High), is(Range, High), is(Symmetry, High)]),
            VeryLow,
        ),
        Rule::new(
            and([is(ReactionTime, Medium), is(Speed, Medium), is(Range, Medium), is(Symmetry, Medium)]),
            Medium,
        ),
        Rule::new(
            and([is(ReactionTime, High), is(Speed, Low), is(Range, Low), is(Symmetry, Low)]),
            VeryHigh,
        ),
        Rule::new(and([is(ReactionTime, Low), is(Speed, Low)]), High),
        Rule::new(and([is(Speed, Low), is(Symmetry, Low)]), High),
        Rule::new(and([is(Range, Low), is(Symmetry, High)]), Medium),
        Rule::new(and([is(Speed, Medium), is(Range, High)]), Low),
        Rule::new(and([is(ReactionTime, High), is(Speed, Medium)]), Medium),
        Rule::new(and([is(Speed, High), is(Symmetry, Medium)]), Low),
        Rule::new(and([is(Range, Medium), is(Symmetry, Medium)]), Medium),
        Rule::new(and([is(ReactionTime, Medium), is(Speed, High)]), Low),
        Rule::new(and([is(ReactionTime, Low), is(Symmetry, Medium)]), Low),
        Rule::new(and([is(Speed, Low), is(Range, Medium)]), Medium),
        Rule::new(and([is(Speed, High), is(Range, Low)]), Medium),
        Rule::new(and([is(Range, High), is(Symmetry, Low)]), High),
        Rule::new(and([is(ReactionTime, Low), is(Range, High)]), Low),
        Rule::new(and([is(ReactionTime, Medium), is(Symmetry, Low)]), Medium),
        Rule::new(and([is(ReactionTime, High), is(Symmetry, High)]), Low),
        Rule::new(and([is(ReactionTime, Medium), is(Range, Low)]), High),
        Rule::new(and([is(ReactionTime, High), is(Range, Medium)]), Medium),
        Rule::new(and([is(Speed, Low), is(Symmetry, Medium)]), Medium),
        Rule::new(and([is(Speed, Medium), is(Symmetry, High)]), Low),
        Rule::new(and([is(Range, Low), is(Speed, High)]), Low),
        Rule::new(
            and([is(ReactionTime, Low), is(Speed, Medium), is(Symmetry, Low)]),
            Medium,
        ),
        Rule::new(
            and([is(ReactionTime, High), is(Speed, Low), is(Symmetry, Medium)]),
            High,
        ),
    ]
}
