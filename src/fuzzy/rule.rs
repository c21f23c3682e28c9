//! Rule antecedent trees and their evaluation
//!
//! Rule bases are plain data: a leaf names an input variable and one of its
//! levels, internal nodes combine children with AND (min) or OR (max).

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::fuzzy::membership::Level;

/// Enum-keyed input variable of one stage
///
/// `ALL` lists every variant in index order; `index()` must agree with it.
pub trait InputVariable: Copy + Eq + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

/// Antecedent expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<V> {
    Is(V, Level),
    And(Vec<Expr<V>>),
    Or(Vec<Expr<V>>),
}

/// Leaf: `var` is `level`
pub fn is<V>(var: V, level: Level) -> Expr<V> {
    Expr::Is(var, level)
}

pub fn and<V>(children: impl IntoIterator<Item = Expr<V>>) -> Expr<V> {
    Expr::And(children.into_iter().collect())
}

pub fn or<V>(children: impl IntoIterator<Item = Expr<V>>) -> Expr<V> {
    Expr::Or(children.into_iter().collect())
}

impl<V: InputVariable> Expr<V> {
    /// Firing strength of this expression, in [0, 1]
    pub fn evaluate(&self, fuzzified: &Fuzzified<V>) -> f64 {
        match self {
            Expr::Is(var, level) => fuzzified.degree(*var, *level),
            Expr::And(children) => children
                .iter()
                .map(|child| child.evaluate(fuzzified))
                .fold(1.0, f64::min),
            Expr::Or(children) => children
                .iter()
                .map(|child| child.evaluate(fuzzified))
                .fold(0.0, f64::max),
        }
    }

    /// Every `(variable, level)` leaf, depth first
    pub fn leaves(&self) -> Vec<(V, Level)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<(V, Level)>) {
        match self {
            Expr::Is(var, level) => out.push((*var, *level)),
            Expr::And(children) | Expr::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// True if some AND/OR node has no children
    pub fn has_empty_node(&self) -> bool {
        match self {
            Expr::Is(..) => false,
            Expr::And(children) | Expr::Or(children) => {
                children.is_empty() || children.iter().any(Expr::has_empty_node)
            }
        }
    }
}

/// IF `antecedent` THEN output is `consequent`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule<V> {
    pub antecedent: Expr<V>,
    pub consequent: Level,
}

impl<V> Rule<V> {
    pub fn new(antecedent: Expr<V>, consequent: Level) -> Self {
        Self {
            antecedent,
            consequent,
        }
    }
}

/// Membership degrees of every input variable in every level
#[derive(Debug, Clone, PartialEq)]
pub struct Fuzzified<V> {
    degrees: Vec<[f64; Level::COUNT]>,
    _vars: PhantomData<V>,
}

impl<V: InputVariable> Fuzzified<V> {
    /// `degrees[i]` belongs to the variable whose `index()` is `i`
    pub fn new(degrees: Vec<[f64; Level::COUNT]>) -> Self {
        debug_assert_eq!(degrees.len(), V::ALL.len());
        Self {
            degrees,
            _vars: PhantomData,
        }
    }

    pub fn degree(&self, var: V, level: Level) -> f64 {
        self.degrees[var.index()][level.index()]
    }
}
