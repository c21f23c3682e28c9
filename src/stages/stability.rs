//! Stage S: emotional stability from volatility, microexpressions and expression changes

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::fuzzy::membership::MEDIUM5_NARROW;
use crate::fuzzy::{
    and, is, or, CrispInputs, FuzzySystem, FuzzyVariable, InputVariable, Partition, Rule, Universe,
};
use crate::types::StabilityFeatures;

/// Universe resolution
pub const UNIVERSE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabilityVar {
    Volatility,
    Microexpression,
    ExpressionChange,
}

impl InputVariable for StabilityVar {
    const ALL: &'static [Self] = &[
        StabilityVar::Volatility,
        StabilityVar::Microexpression,
        StabilityVar::ExpressionChange,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            StabilityVar::Volatility => "emotion_volatility",
            StabilityVar::Microexpression => "microexpression_count",
            StabilityVar::ExpressionChange => "expression_change_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityInputs {
    pub volatility: f64,
    pub microexpression_rate: f64,
    pub expression_change_rate: f64,
}

impl From<StabilityFeatures> for StabilityInputs {
    fn from(features: StabilityFeatures) -> Self {
        Self {
            volatility: features.volatility,
            microexpression_rate: features.microexpression_rate,
            expression_change_rate: features.expression_change_rate,
        }
    }
}

impl CrispInputs<StabilityVar> for StabilityInputs {
    fn crisp(&self, var: StabilityVar) -> f64 {
        match var {
            StabilityVar::Volatility => self.volatility,
            StabilityVar::Microexpression => self.microexpression_rate,
            StabilityVar::ExpressionChange => self.expression_change_rate,
        }
    }
}

fn five_level(name: &'static str, universe: &Universe) -> FuzzyVariable {
    FuzzyVariable::new(name, universe.clone(), Partition::five_level(MEDIUM5_NARROW))
}

pub fn system() -> Result<FuzzySystem<StabilityVar>, ComputeError> {
    let universe = Universe::stepped(UNIVERSE_STEP)?;
    FuzzySystem::new(
        |var: StabilityVar| five_level(var.name(), &universe),
        five_level("emotional_stability", &universe),
        rules(),
    )
}

pub fn rules() -> Vec<Rule<StabilityVar>> {
    use crate::fuzzy::Level::*;
    use StabilityVar::*;

    vec![
        // very stable
        Rule::new(and([is(Volatility, VeryLow), is(ExpressionChange, VeryLow), is(Microexpression, VeryLow)]), VeryHigh),
        Rule::new(and([is(Volatility, Low), is(ExpressionChange, Low), is(Microexpression, Low)]), High),
        // moderately stable
        Rule::new(and([is(Volatility, Medium), is(ExpressionChange, Medium)]), Medium),
        Rule::new(and([is(Volatility, Low), is(ExpressionChange, Medium)]), Medium),
        Rule::new(and([is(Volatility, Medium), is(ExpressionChange, Low)]), Medium),
        // unstable
        Rule::new(and([is(Volatility, High), is(ExpressionChange, High)]), Low),
        Rule::new(or([is(Volatility, VeryHigh), is(ExpressionChange, VeryHigh), is(Microexpression, VeryHigh)]), VeryLow),
        // single-signal fallbacks
        Rule::new(or([is(Volatility, VeryLow), is(ExpressionChange, VeryLow)]), High),
        Rule::new(or([is(Volatility, Low), is(Microexpression, Low)]), Medium),
        Rule::new(or([is(Volatility, Medium), is(ExpressionChange, Medium), is(Microexpression, Medium)]), Medium),
        Rule::new(or([is(Volatility, High), is(Microexpression, High)]), Low),
        Rule::new(and([is(Volatility, VeryHigh), is(Microexpression, VeryHigh)]), VeryLow),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stability(volatility: f64, microexpression_rate: f64, expression_change_rate: f64) -> f64 {
        system()
            .unwrap()
            .infer(&StabilityInputs {
                volatility,
                microexpression_rate,
                expression_change_rate,
            })
            .rounded()
    }

    #[test]
    fn test_rule_count() {
        assert_eq!(rules().len(), 12);
    }

    #[test]
    fn test_calm_trace_is_stable() {
        let calm = stability(0.0, 0.0, 0.0);
        assert!(calm > 0.75, "calm = {}", calm);
    }

    #[test]
    fn test_erratic_trace_is_unstable() {
        let erratic = stability(1.0, 1.0, 1.0);
        assert!(erratic < 0.15, "erratic = {}", erratic);
    }

    #[test]
    fn test_from_features() {
        let inputs = StabilityInputs::from(StabilityFeatures {
            volatility: 0.1,
            microexpression_rate: 0.2,
            expression_change_rate: 0.3,
        });
        assert_eq!(inputs.crisp(StabilityVar::ExpressionChange), 0.3);
        assert_eq!(inputs.crisp(StabilityVar::Microexpression), 0.2);
    }
}
