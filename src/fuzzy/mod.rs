//! Small Mamdani-style approximate-reasoning engine
//!
//! - [`membership`]: triangular sets, linguistic levels, universes
//! - [`rule`]: antecedent trees over enum-keyed variables
//! - [`engine`]: inference and centroid defuzzification

pub mod engine;
pub mod membership;
pub mod rule;

pub use engine::{centroid, round3, CrispInputs, Defuzzified, FuzzySystem};
pub use membership::{membership, FuzzyVariable, Level, Partition, Triangular, Universe};
pub use rule::{and, is, or, Expr, Fuzzified, InputVariable, Rule};
