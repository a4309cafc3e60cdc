//! A point in the subset search space.

use crate::bitset::BitVector;

/// Objective of a candidate that has not been evaluated yet.
pub const UNEVALUATED: f64 = f64::NEG_INFINITY;

/// Two objectives closer than this are treated as equal when breaking ties.
pub const OBJECTIVE_EPSILON: f64 = 1e-6;

/// Tolerant objective equality.
pub fn objectives_eq(a: f64, b: f64) -> bool {
    a - b < OBJECTIVE_EPSILON && b - a < OBJECTIVE_EPSILON
}

/// An attribute subset with its raw merit and population-relative fitness.
///
/// Clones are fully independent; a candidate is never shared between
/// population slots.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// Selected attributes.
    pub bits: BitVector,
    /// Raw merit from the evaluator. Higher is better.
    pub objective: f64,
    /// Scaled fitness for the current generation.
    pub fitness: f64,
}

impl Candidate {
    /// Creates an unevaluated candidate over `len` attributes.
    pub fn new(len: usize) -> Self {
        Self::from_bits(BitVector::new(len))
    }

    /// Wraps an existing bit vector as an unevaluated candidate.
    pub fn from_bits(bits: BitVector) -> Self {
        Self {
            bits,
            objective: UNEVALUATED,
            fitness: 0.0,
        }
    }

    /// Number of selected attributes.
    pub fn feature_count(&self) -> usize {
        self.bits.count_set()
    }

    /// Whether `self` should replace `incumbent` as a best-so-far:
    /// strictly higher objective, or a tolerant tie with fewer attributes.
    pub fn beats(&self, incumbent: &Candidate) -> bool {
        if self.objective > incumbent.objective {
            true
        } else if objectives_eq(self.objective, incumbent.objective) {
            self.feature_count() < incumbent.feature_count()
        } else {
            false
        }
    }
}
