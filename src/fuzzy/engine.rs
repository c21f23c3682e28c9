//! Mamdani inference: fuzzify → fire → implicate → aggregate → defuzzify
//!
//! A [`FuzzySystem`] is immutable once built and holds no per-call state, so a
//! single instance can serve any number of concurrent evaluations.

use crate::error::ComputeError;
use crate::fuzzy::membership::{FuzzyVariable, Level};
use crate::fuzzy::rule::{Fuzzified, InputVariable, Rule};

/// Centroid denominators at or below this are treated as "nothing fired"
pub const DEGENERACY_EPSILON: f64 = 1e-12;

/// Crisp values for every input variable of a stage
pub trait CrispInputs<V: InputVariable> {
    fn crisp(&self, var: V) -> f64;
}

/// Crisp output of one inference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defuzzified {
    pub value: f64,
    /// Set when no rule fired and `value` is the configured fallback
    pub degenerate: bool,
}

impl Defuzzified {
    /// Value rounded to 3 decimals
    pub fn rounded(&self) -> f64 {
        round3(self.value)
    }
}

/// Round to 3 decimal places
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Centroid of `membership` over `points`, or `None` if the curve is empty
pub fn centroid(points: &[f64], membership: &[f64]) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&x, &mu) in points.iter().zip(membership) {
        weighted += x * mu;
        total += mu;
    }
    if total <= DEGENERACY_EPSILON {
        None
    } else {
        Some(weighted / total)
    }
}

/// Rule base plus the variables it is defined over
#[derive(Debug, Clone)]
pub struct FuzzySystem<V> {
    inputs: Vec<FuzzyVariable>,
    output: FuzzyVariable,
    rules: Vec<Rule<V>>,
    /// Sampled output curves, `(level, curve)` for each defined output level
    output_curves: Vec<(Level, Vec<f64>)>,
    fallback: f64,
}

impl<V: InputVariable> FuzzySystem<V> {
    /// Build and validate a system.
    ///
    /// `input` is called once per variable in `V::ALL` order.
    pub fn new(
        input: impl Fn(V) -> FuzzyVariable,
        output: FuzzyVariable,
        rules: Vec<Rule<V>>,
    ) -> Result<Self, ComputeError> {
        let inputs: Vec<FuzzyVariable> = V::ALL.iter().map(|&var| input(var)).collect();

        for (var, variable) in V::ALL.iter().zip(&inputs) {
            if var.index() >= inputs.len() || V::ALL[var.index()] != *var {
                return Err(ComputeError::Configuration(format!(
                    "input variable {} has an index out of order",
                    var.name()
                )));
            }
            variable.partition.validate(variable.name)?;
        }
        output.partition.validate(output.name)?;

        if rules.is_empty() {
            return Err(ComputeError::Configuration(format!(
                "{} has an empty rule base",
                output.name
            )));
        }

        for (position, rule) in rules.iter().enumerate() {
            if rule.antecedent.has_empty_node() {
                return Err(ComputeError::Configuration(format!(
                    "{} rule {} has an empty AND/OR node",
                    output.name, position
                )));
            }
            for (var, level) in rule.antecedent.leaves() {
                if !inputs[var.index()].partition.is_defined(level) {
                    return Err(ComputeError::Configuration(format!(
                        "{} rule {} references undefined set {}.{}",
                        output.name,
                        position,
                        var.name(),
                        level.name()
                    )));
                }
            }
            if !output.partition.is_defined(rule.consequent) {
                return Err(ComputeError::Configuration(format!(
                    "{} rule {} concludes undefined set {}",
                    output.name,
                    position,
                    rule.consequent.name()
                )));
            }
        }

        let output_curves = output
            .partition
            .iter()
            .filter_map(|(level, _)| output.curve(level).map(|curve| (level, curve)))
            .collect();
        let fallback = output.universe.midpoint();

        Ok(Self {
            inputs,
            output,
            rules,
            output_curves,
            fallback,
        })
    }

    /// Replace the value returned when no rule fires
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = self.output.universe.clamp(fallback);
        self
    }

    pub fn name(&self) -> &'static str {
        self.output.name
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn output(&self) -> &FuzzyVariable {
        &self.output
    }

    /// Membership degrees of every input in every level
    pub fn fuzzify(&self, inputs: &impl CrispInputs<V>) -> Fuzzified<V> {
        let degrees = V::ALL
            .iter()
            .map(|&var| self.inputs[var.index()].fuzzify(inputs.crisp(var)))
            .collect();
        Fuzzified::new(degrees)
    }

    /// Strongest firing strength reaching each output level
    pub fn activations(&self, fuzzified: &Fuzzified<V>) -> [f64; Level::COUNT] {
        let mut activation = [0.0f64; Level::COUNT];
        for rule in &self.rules {
            let strength = rule.antecedent.evaluate(fuzzified);
            let slot = &mut activation[rule.consequent.index()];
            *slot = slot.max(strength);
        }
        activation
    }

    /// Aggregated output curve: max over levels of each curve clipped at its activation
    pub fn aggregate(&self, activation: &[f64; Level::COUNT]) -> Vec<f64> {
        let mut aggregated: Vec<f64> = vec![0.0; self.output.universe.len()];
        for (level, curve) in &self.output_curves {
            let height = activation[level.index()];
            if height <= 0.0 {
                continue;
            }
            for (point, &mu) in aggregated.iter_mut().zip(curve) {
                *point = point.max(mu.min(height));
            }
        }
        aggregated
    }

    /// Full inference. Never returns NaN: when nothing fires the fallback is
    /// returned with `degenerate` set.
    pub fn infer(&self, inputs: &impl CrispInputs<V>) -> Defuzzified {
        let fuzzified = self.fuzzify(inputs);
        let activation = self.activations(&fuzzified);
        let aggregated = self.aggregate(&activation);

        match centroid(self.output.universe.points(), &aggregated) {
            Some(value) => Defuzzified {
                value: self.output.universe.clamp(value),
                degenerate: false,
            },
            None => {
                log::warn!(
                    "{}: no rule fired, falling back to {}",
                    self.output.name,
                    self.fallback
                );
                Defuzzified {
                    value: self.fallback,
                    degenerate: true,
                }
            }
        }
    }

    /// Like [`infer`](Self::infer) but degeneracy is an error
    pub fn infer_strict(&self, inputs: &impl CrispInputs<V>) -> Result<f64, ComputeError> {
        let result = self.infer(inputs);
        if result.degenerate {
            Err(ComputeError::Degenerate {
                stage: self.output.name,
            })
        } else {
            Ok(result.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::membership::{Partition, Triangular, Universe, HIGH3, LOW3};
    use crate::fuzzy::rule::{and, is, or};
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Var {
        Load,
        Noise,
    }

    impl InputVariable for Var {
        const ALL: &'static [Self] = &[Var::Load, Var::Noise];

        fn index(self) -> usize {
            self as usize
        }

        fn name(self) -> &'static str {
            match self {
                Var::Load => "load",
                Var::Noise => "noise",
            }
        }
    }

    struct Pair(f64, f64);

    impl CrispInputs<Var> for Pair {
        fn crisp(&self, var: Var) -> f64 {
            match var {
                Var::Load => self.0,
                Var::Noise => self.1,
            }
        }
    }

    fn three(name: &'static str) -> FuzzyVariable {
        FuzzyVariable::new(name, Universe::stepped(0.01).unwrap(), Partition::three_level())
    }

    fn system(rules: Vec<Rule<Var>>) -> FuzzySystem<Var> {
        FuzzySystem::new(|var| three(var.name()), three("strain"), rules).unwrap()
    }

    fn standard() -> FuzzySystem<Var> {
        system(vec![
            Rule::new(is(Var::Load, Level::Low), Level::Low),
            Rule::new(is(Var::Load, Level::Medium), Level::Medium),
            Rule::new(or([is(Var::Load, Level::High), is(Var::Noise, Level::High)]), Level::High),
        ])
    }

    #[test]
    fn test_centroid_of_symmetric_curve() {
        let universe = Universe::stepped(0.01).unwrap();
        let curve: Vec<f64> = universe
            .points()
            .iter()
            .map(|&x| Triangular::new(0.25, 0.5, 0.75).membership(x))
            .collect();
        let c = centroid(universe.points(), &curve).unwrap();
        assert!((c - 0.5).abs() < 1e-9);
        assert_eq!(centroid(universe.points(), &vec![0.0; 101]), None);
    }

    #[test]
    fn test_single_rule_full_strength() {
        let sys = system(vec![Rule::new(is(Var::Load, Level::Low), Level::High)]);
        let result = sys.infer(&Pair(0.0, 0.0));
        assert!(!result.degenerate);
        // centroid of the sampled high shoulder
        assert!(result.value > 0.75 && result.value < 0.9);
    }

    #[test]
    fn test_clipping_limits_contribution() {
        let sys = standard();
        let f = sys.fuzzify(&Pair(0.125, 0.0));
        let activation = sys.activations(&f);
        assert!((activation[Level::Low.index()] - 0.75).abs() < 1e-12);
        assert_eq!(activation[Level::High.index()], 0.0);

        let aggregated = sys.aggregate(&activation);
        let peak = aggregated.iter().cloned().fold(0.0, f64::max);
        assert!((peak - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_higher_input_moves_output_up() {
        let sys = standard();
        let low = sys.infer(&Pair(0.1, 0.0)).value;
        let mid = sys.infer(&Pair(0.5, 0.0)).value;
        let high = sys.infer(&Pair(0.9, 0.0)).value;
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_degenerate_returns_fallback() {
        // Only fires for a high load; a zero load leaves every curve empty.
        let sys = system(vec![Rule::new(
            and([is(Var::Load, Level::High), is(Var::Noise, Level::High)]),
            Level::High,
        )]);
        let result = sys.infer(&Pair(0.0, 0.0));
        assert!(result.degenerate);
        assert_eq!(result.value, 0.5);
        assert!(!result.value.is_nan());

        let custom = sys.clone().with_fallback(0.2).infer(&Pair(-5.0, -5.0));
        assert!(custom.degenerate);
        assert_eq!(custom.value, 0.2);

        assert!(matches!(
            sys.infer_strict(&Pair(0.0, 0.0)),
            Err(ComputeError::Degenerate { stage: "strain" })
        ));
    }

    #[test]
    fn test_rule_order_does_not_matter() {
        let mut reversed = vec![
            Rule::new(is(Var::Load, Level::Low), Level::Low),
            Rule::new(is(Var::Load, Level::Medium), Level::Medium),
            Rule::new(or([is(Var::Load, Level::High), is(Var::Noise, Level::High)]), Level::High),
        ];
        reversed.reverse();
        let a = standard().infer(&Pair(0.4, 0.7));
        let b = system(reversed).infer(&Pair(0.4, 0.7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_undefined_leaf_rejected() {
        let result = FuzzySystem::new(
            |var: Var| three(var.name()),
            three("strain"),
            vec![Rule::new(is(Var::Load, Level::VeryHigh), Level::High)],
        );
        assert!(matches!(result, Err(ComputeError::Configuration(_))));
    }

    #[test]
    fn test_undefined_consequent_rejected() {
        let result = FuzzySystem::new(
            |var: Var| three(var.name()),
            three("strain"),
            vec![Rule::new(is(Var::Load, Level::Low), Level::VeryLow)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_rule_base_rejected() {
        let result = FuzzySystem::<Var>::new(|var| three(var.name()), three("strain"), vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_output_partition_rejected() {
        let output = FuzzyVariable::new(
            "strain",
            Universe::stepped(0.01).unwrap(),
            Partition::from_sets([
                (Level::Low, HIGH3),
                (Level::High, LOW3),
            ]),
        );
        let result = FuzzySystem::new(
            |var: Var| three(var.name()),
            output,
            vec![Rule::new(is(Var::Load, Level::Low), Level::Low)],
        );
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn prop_output_in_universe_and_deterministic(load in -1.0f64..2.0, noise in -1.0f64..2.0) {
            let sys = standard();
            let first = sys.infer(&Pair(load, noise));
            let second = sys.infer(&Pair(load, noise));
            prop_assert!(first.value.is_finite());
            prop_assert!((0.0..=1.0).contains(&first.value));
            prop_assert_eq!(first, second);
        }
    }
}
