//! Stage M: per-frame motor engagement from reaction time, speed and range

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::fuzzy::membership::MEDIUM5_WIDE;
use crate::fuzzy::{
    and, is, or, CrispInputs, Defuzzified, FuzzySystem, FuzzyVariable, InputVariable, Partition,
    Rule, Universe,
};

/// Points in every motor-engagement universe
pub const UNIVERSE_POINTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorVar {
    ReactionTime,
    Speed,
    Range,
}

impl InputVariable for MotorVar {
    const ALL: &'static [Self] = &[MotorVar::ReactionTime, MotorVar::Speed, MotorVar::Range];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            MotorVar::ReactionTime => "reaction_time",
            MotorVar::Speed => "speed",
            MotorVar::Range => "range",
        }
    }
}

/// One frame: that frame's reaction time plus its raw speed and range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorInputs {
    pub reaction_time: f64,
    pub speed: f64,
    pub range: f64,
}

impl CrispInputs<MotorVar> for MotorInputs {
    fn crisp(&self, var: MotorVar) -> f64 {
        match var {
            MotorVar::ReactionTime => self.reaction_time,
            MotorVar::Speed => self.speed,
            MotorVar::Range => self.range,
        }
    }
}

pub fn system() -> Result<FuzzySystem<MotorVar>, ComputeError> {
    FuzzySystem::new(
        |var: MotorVar| {
            // reaction time is graded on five levels, movement on three
            let partition = match var {
                MotorVar::ReactionTime => Partition::five_level(MEDIUM5_WIDE),
                MotorVar::Speed | MotorVar::Range => Partition::three_level(),
            };
            FuzzyVariable::new(var.name(), Universe::linspace(UNIVERSE_POINTS), partition)
        },
        FuzzyVariable::new(
            "motor_engagement",
            Universe::linspace(UNIVERSE_POINTS),
            Partition::five_level(MEDIUM5_WIDE),
        ),
        rules(),
    )
}

pub fn rules() -> Vec<Rule<MotorVar>> {
    use crate::fuzzy::Level::*;
    use MotorVar::*;

    vec![
        Rule::new(and([is(ReactionTime, VeryLow), is(Speed, High), is(Range, High)]), VeryHigh),
        Rule::new(is(ReactionTime, VeryHigh), VeryLow),
        Rule::new(and([is(ReactionTime, Medium), is(Speed, Medium), is(Range, Medium)]), Medium),
        Rule::new(or([is(Speed, Low), is(Range, Low)]), Low),
        Rule::new(and([is(Speed, High), is(Range, Medium)]), High),
        Rule::new(and([is(Speed, Medium), is(Range, High)]), High),
        Rule::new(and([is(Speed, Medium), is(Range, Low)]), Low),
        Rule::new(and([is(ReactionTime, Low), is(Speed, Medium), is(Range, Medium)]), Medium),
        Rule::new(and([is(ReactionTime, Low), is(Speed, High)]), High),
        Rule::new(and([is(ReactionTime, High), is(Speed, Low)]), Low),
        Rule::new(and([is(ReactionTime, VeryLow), is(Range, High)]), VeryHigh),
        Rule::new(and([is(ReactionTime, VeryHigh), is(Speed, Medium)]), Low),
        Rule::new(and([is(ReactionTime, VeryLow), is(Speed, Low)]), Medium),
        Rule::new(and([is(ReactionTime, Low), is(Range, Low)]), Low),
        Rule::new(and([is(ReactionTime, Medium), is(Range, Low)]), Medium),
        Rule::new(and([is(ReactionTime, High), is(Speed, High)]), Medium),
        Rule::new(and([is(ReactionTime, Medium), is(Speed, Low), is(Range, High)]), Medium),
        Rule::new(and([is(ReactionTime, High), is(Speed, Medium), is(Range, Medium)]), Medium),
        Rule::new(and([is(ReactionTime, High), is(Speed, High), is(Range, Low)]), Medium),
        Rule::new(and([is(ReactionTime, VeryLow), is(Speed, High), is(Range, Low)]), High),
        Rule::new(and([is(ReactionTime, VeryLow), is(Speed, Medium), is(Range, Medium)]), High),
        Rule::new(and([is(ReactionTime, Low), is(Speed, Low), is(Range, Medium)]), Low),
        Rule::new(and([is(ReactionTime, Low), is(Speed, High), is(Range, Low)]), Medium),
        Rule::new(and([is(ReactionTime, Medium), is(Speed, Medium), is(Range, High)]), High),
        Rule::new(and([is(ReactionTime, VeryHigh), is(Speed, High), is(Range, High)]), Medium),
    ]
}

/// One inference per frame; `reaction_times`, `speed` and `range` are index-aligned
pub fn evaluate_frames(
    system: &FuzzySystem<MotorVar>,
    reaction_times: &[f64],
    speed: &[f64],
    range: &[f64],
) -> Vec<Defuzzified> {
    reaction_times
        .iter()
        .zip(speed)
        .zip(range)
        .map(|((&reaction_time, &speed), &range)| {
            system.infer(&MotorInputs {
                reaction_time,
                speed,
                range,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engagement(reaction_time: f64, speed: f64, range: f64) -> f64 {
        system()
            .unwrap()
            .infer(&MotorInputs {
                reaction_time,
                speed,
                range,
            })
            .value
    }

    #[test]
    fn test_rule_count() {
        assert_eq!(rules().len(), 25);
    }

    #[test]
    fn test_quick_wide_movement_is_engaged() {
        assert!(engagement(0.0, 1.0, 1.0) > 0.85);
    }

    #[test]
    fn test_slow_still_movement_is_disengaged() {
        assert!(engagement(1.0, 0.0, 0.0) < 0.25);
    }

    #[test]
    fn test_evaluate_frames_aligns_inputs() {
        let sys = system().unwrap();
        let frames = evaluate_frames(&sys, &[0.0, 1.0], &[1.0, 0.0], &[1.0, 0.0]);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].value > frames[1].value);
    }
}
