//! Membership functions, linguistic levels and discretized universes
//!
//! Every variable in the pipeline lives on the closed interval [0, 1]. A
//! variable's sets are drawn from the same five linguistic levels; three-level
//! variables simply leave `VeryLow` and `VeryHigh` undefined.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Lower bound of every universe
pub const UNIVERSE_MIN: f64 = 0.0;

/// Upper bound of every universe
pub const UNIVERSE_MAX: f64 = 1.0;

/// Triangular membership function with breakpoints `a <= b <= c`
///
/// Degenerate shoulders (`a == b` or `b == c`) behave as a step at `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangular {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangular {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// True when the breakpoints are finite and ordered
    pub fn is_well_formed(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.a <= self.b
            && self.b <= self.c
    }

    /// Degree of membership of `x`, in [0, 1]
    pub fn membership(&self, x: f64) -> f64 {
        let Triangular { a, b, c } = *self;
        if x == b {
            1.0
        } else if x <= a || x >= c {
            0.0
        } else if x < b {
            // a < x < b, so b - a > 0
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        }
    }
}

/// Contract-level helper: `membership(value, breakpoints)`
pub fn membership(value: f64, set: &Triangular) -> f64 {
    set.membership(value)
}

/// Linguistic level of a fuzzy set, in canonical (ascending) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Level {
    pub const COUNT: usize = 5;

    pub const ALL: [Level; Level::COUNT] = [
        Level::VeryLow,
        Level::Low,
        Level::Medium,
        Level::High,
        Level::VeryHigh,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::VeryLow => "very_low",
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
            Level::VeryHigh => "very_high",
        }
    }
}

/// Three-level `low` set
pub const LOW3: Triangular = Triangular::new(0.0, 0.0, 0.5);
/// Three-level `medium` set
pub const MEDIUM3: Triangular = Triangular::new(0.25, 0.5, 0.75);
/// Three-level `high` set
pub const HIGH3: Triangular = Triangular::new(0.5, 1.0, 1.0);

pub const VERY_LOW5: Triangular = Triangular::new(0.0, 0.0, 0.2);
pub const LOW5: Triangular = Triangular::new(0.1, 0.25, 0.4);
pub const HIGH5: Triangular = Triangular::new(0.6, 0.75, 0.9);
pub const VERY_HIGH5: Triangular = Triangular::new(0.8, 1.0, 1.0);

/// Narrow five-level `medium`, used by focus and stability variables
pub const MEDIUM5_NARROW: Triangular = Triangular::new(0.35, 0.5, 0.65);
/// Wide five-level `medium`, used by reaction-time and motor-engagement variables
pub const MEDIUM5_WIDE: Triangular = Triangular::new(0.3, 0.5, 0.7);

/// Mapping from level to membership function
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    sets: [Option<Triangular>; Level::COUNT],
}

impl Partition {
    /// Partition from explicit `(level, set)` pairs
    pub fn from_sets(sets: impl IntoIterator<Item = (Level, Triangular)>) -> Self {
        let mut partition = Self {
            sets: [None; Level::COUNT],
        };
        for (level, set) in sets {
            partition.sets[level.index()] = Some(set);
        }
        partition
    }

    /// low / medium / high
    pub fn three_level() -> Self {
        Self::from_sets([
            (Level::Low, LOW3),
            (Level::Medium, MEDIUM3),
            (Level::High, HIGH3),
        ])
    }

    /// very_low .. very_high with the given `medium` set
    pub fn five_level(medium: Triangular) -> Self {
        Self::from_sets([
            (Level::VeryLow, VERY_LOW5),
            (Level::Low, LOW5),
            (Level::Medium, medium),
            (Level::High, HIGH5),
            (Level::VeryHigh, VERY_HIGH5),
        ])
    }

    pub fn get(&self, level: Level) -> Option<&Triangular> {
        self.sets[level.index()].as_ref()
    }

    pub fn is_defined(&self, level: Level) -> bool {
        self.sets[level.index()].is_some()
    }

    /// Defined sets in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Level, &Triangular)> {
        Level::ALL
            .iter()
            .filter_map(move |&level| self.get(level).map(|set| (level, set)))
    }

    /// Check every set is well formed, inside the universe, and that
    /// breakpoints never decrease across the canonical ordering.
    pub fn validate(&self, variable: &str) -> Result<(), ComputeError> {
        let mut previous: Option<(Level, &Triangular)> = None;
        for (level, set) in self.iter() {
            if !set.is_well_formed() || set.a < UNIVERSE_MIN || set.c > UNIVERSE_MAX {
                return Err(ComputeError::Configuration(format!(
                    "{}.{} has invalid breakpoints {:?}",
                    variable,
                    level.name(),
                    set
                )));
            }
            if let Some((prev_level, prev)) = previous {
                if set.a < prev.a || set.b < prev.b || set.c < prev.c {
                    return Err(ComputeError::Configuration(format!(
                        "{}.{} breakpoints fall below {}.{}",
                        variable,
                        level.name(),
                        variable,
                        prev_level.name()
                    )));
                }
            }
            previous = Some((level, set));
        }
        if previous.is_none() {
            return Err(ComputeError::Configuration(format!(
                "{} defines no fuzzy sets",
                variable
            )));
        }
        Ok(())
    }
}

/// Discretized universe of discourse over [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    points: Vec<f64>,
}

impl Universe {
    /// Points `0, step, 2*step, ..., 1`; `step` must lie in (0, 1]
    pub fn stepped(step: f64) -> Result<Self, ComputeError> {
        if !step.is_finite() || step <= 0.0 || step > UNIVERSE_MAX - UNIVERSE_MIN {
            return Err(ComputeError::Configuration(format!(
                "universe step must lie in (0, 1], got {}",
                step
            )));
        }
        let intervals = ((UNIVERSE_MAX - UNIVERSE_MIN) / step).round() as usize;
        let points = (0..=intervals)
            .map(|i| UNIVERSE_MIN + i as f64 * step)
            .collect();
        Ok(Self { points })
    }

    /// `count` evenly spaced points including both ends
    pub fn linspace(count: usize) -> Self {
        let count = count.max(2);
        let step = (UNIVERSE_MAX - UNIVERSE_MIN) / (count - 1) as f64;
        let mut points: Vec<f64> = (0..count)
            .map(|i| UNIVERSE_MIN + i as f64 * step)
            .collect();
        points[count - 1] = UNIVERSE_MAX;
        Self { points }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Clamp a crisp value to the universe boundary
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(UNIVERSE_MIN, UNIVERSE_MAX)
    }

    pub fn midpoint(&self) -> f64 {
        (UNIVERSE_MIN + UNIVERSE_MAX) / 2.0
    }
}

/// A named fuzzy variable: universe plus its sets
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyVariable {
    pub name: &'static str,
    pub universe: Universe,
    pub partition: Partition,
}

impl FuzzyVariable {
    pub fn new(name: &'static str, universe: Universe, partition: Partition) -> Self {
        Self {
            name,
            universe,
            partition,
        }
    }

    /// Degree of membership in every level; undefined levels are 0.
    ///
    /// Values outside the universe are clamped first.
    pub fn fuzzify(&self, value: f64) -> [f64; Level::COUNT] {
        let clamped = self.universe.clamp(value);
        if clamped != value {
            log::trace!("{}: clamped {} to {}", self.name, value, clamped);
        }
        let mut degrees = [0.0; Level::COUNT];
        for (level, set) in self.partition.iter() {
            degrees[level.index()] = set.membership(clamped);
        }
        degrees
    }

    /// Membership curve of one level sampled over the universe
    pub fn curve(&self, level: Level) -> Option<Vec<f64>> {
        self.partition.get(level).map(|set| {
            self.universe
                .points()
                .iter()
                .map(|&x| set.membership(x))
                .collect()
        })
    }
}
