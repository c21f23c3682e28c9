//! Stage R: per-frame reaction time from speed, range and symmetry
//!
//! Output is a normalized reaction time: `very_low` is the fastest response,
//! `very_high` the slowest.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::fuzzy::membership::MEDIUM5_WIDE;
use crate::fuzzy::{
    and, is, or, CrispInputs, Defuzzified, FuzzySystem, FuzzyVariable, InputVariable, Partition,
    Rule, Universe,
};
use crate::types::BehavioralTrace;

/// Points in every reaction-time universe
pub const UNIVERSE_POINTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionVar {
    Speed,
    Range,
    Symmetry,
}

impl InputVariable for ReactionVar {
    const ALL: &'static [Self] = &[ReactionVar::Speed, ReactionVar::Range, ReactionVar::Symmetry];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            ReactionVar::Speed => "speed",
            ReactionVar::Range => "range",
            ReactionVar::Symmetry => "symmetry",
        }
    }
}

/// One frame of the behavioral trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionInputs {
    pub speed: f64,
    pub range: f64,
    pub symmetry: f64,
}

impl CrispInputs<ReactionVar> for ReactionInputs {
    fn crisp(&self, var: ReactionVar) -> f64 {
        match var {
            ReactionVar::Speed => self.speed,
            ReactionVar::Range => self.range,
            ReactionVar::Symmetry => self.symmetry,
        }
    }
}

pub fn system() -> Result<FuzzySystem<ReactionVar>, ComputeError> {
    FuzzySystem::new(
        |var: ReactionVar| {
            FuzzyVariable::new(
                var.name(),
                Universe::linspace(UNIVERSE_POINTS),
                Partition::three_level(),
            )
        },
        FuzzyVariable::new(
            "normalized_reaction_time",
            Universe::linspace(UNIVERSE_POINTS),
            Partition::five_level(MEDIUM5_WIDE),
        ),
        rules(),
    )
}

pub fn rules() -> Vec<Rule<ReactionVar>> {
    use crate::fuzzy::Level::*;
    use ReactionVar::*;

    vec![
        Rule::new(and([is(Speed, High), is(Range, High), is(Symmetry, High)]), VeryLow),
        Rule::new(or([is(Speed, Low), is(Range, Low)]), VeryHigh),
        Rule::new(and([is(Speed, Medium), is(Range, Medium), is(Symmetry, Medium)]), Medium),
        Rule::new(and([is(Speed, High), is(Symmetry, Low)]), Medium),
        Rule::new(and([is(Speed, Low), is(Range, High)]), High),
        Rule::new(and([is(Speed, Medium), is(Range, Low)]), High),
        Rule::new(and([is(Speed, Low), is(Symmetry, Low)]), VeryHigh),
        Rule::new(and([is(Speed, High), is(Range, Medium), is(Symmetry, High)]), Low),
        Rule::new(and([is(Speed, Medium), is(Range, High)]), Low),
        Rule::new(and([is(Speed, Medium), is(Symmetry, Low)]), Medium),
        Rule::new(and([is(Range, Medium), is(Symmetry, Medium)]), Medium),
        Rule::new(and([is(Speed, Low), is(Range, Medium), is(Symmetry, Medium)]), High),
        Rule::new(and([is(Speed, High), is(Range, Low), is(Symmetry, Low)]), High),
        Rule::new(and([is(Speed, Medium), is(Range, Medium), is(Symmetry, Low)]), Medium),
        Rule::new(and([is(Speed, High), is(Range, High), is(Symmetry, Low)]), Low),
        Rule::new(and([is(Speed, Low), is(Range, Low), is(Symmetry, High)]), VeryHigh),
        Rule::new(and([is(Speed, Low), is(Range, High), is(Symmetry, Low)]), High),
        Rule::new(and([is(Speed, High), is(Range, Low), is(Symmetry, High)]), Medium),
        Rule::new(and([is(Speed, Medium), is(Range, Low), is(Symmetry, High)]), Medium),
        Rule::new(and([is(Speed, Medium), is(Range, High), is(Symmetry, Low)]), Medium),
    ]
}

/// One inference per frame of the trace
pub fn evaluate_frames(
    system: &FuzzySystem<ReactionVar>,
    trace: &BehavioralTrace,
) -> Vec<Defuzzified> {
    trace
        .speed()
        .iter()
        .zip(trace.range())
        .zip(trace.symmetry())
        .map(|((&speed, &range), &symmetry)| {
            system.infer(&ReactionInputs {
                speed,
                range,
                symmetry,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(speed: f64, range: f64, symmetry: f64) -> f64 {
        system()
            .unwrap()
            .infer(&ReactionInputs {
                speed,
                range,
                symmetry,
            })
            .value
    }

    #[test]
    fn test_rule_count() {
        assert_eq!(rules().len(), 20);
    }

    #[test]
    fn test_fluent_movement_reacts_fast() {
        assert!(frame(1.0, 1.0, 1.0) < 0.1);
    }

    #[test]
    fn test_sluggish_movement_reacts_slow() {
        assert!(frame(0.0, 0.0, 0.0) > 0.9);
    }

    #[test]
    fn test_evaluate_frames_matches_single_inference() {
        let sys = system().unwrap();
        let trace = BehavioralTrace::new(
            vec![0.2, 0.9, 0.5],
            vec![0.4, 0.8, 0.5],
            vec![0.6, 0.7, 0.5],
        )
        .unwrap();
        let frames = evaluate_frames(&sys, &trace);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].value, frame(0.9, 0.8, 0.7));
        assert!(frames.iter().all(|f| !f.degenerate));
    }
}
