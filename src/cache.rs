//! Memoized subset evaluation.
//!
//! [`EvaluationCache`] maps a subset to the candidate snapshot produced when
//! it was first scored. Only the objective of a snapshot is meaningful on
//! lookup: fitness is population-relative and recomputed every generation.
//!
//! Keys are owned copies of the scored bit vector, so later mutation of the
//! live candidate never reaches into the cache.

use crate::bitset::BitVector;
use crate::candidate::Candidate;
use crate::error::{Result, SearchError};
use crate::pso::SubsetEvaluator;
use std::collections::HashMap;

/// Grow-only memo table for one search run.
#[derive(Debug, Default, Clone)]
pub struct EvaluationCache {
    table: HashMap<BitVector, Candidate>,
    hits: usize,
    misses: usize,
}

impl EvaluationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache with room for `capacity` subsets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Cached objective for `bits`, if it has been scored.
    pub fn objective(&self, bits: &BitVector) -> Option<f64> {
        self.table.get(bits).map(|c| c.objective)
    }

    /// Returns `true` if `bits` has been scored.
    pub fn contains(&self, bits: &BitVector) -> bool {
        self.table.contains_key(bits)
    }

    /// Stores a snapshot of an evaluated candidate.
    pub fn insert(&mut self, candidate: &Candidate) {
        self.table.insert(candidate.bits.clone(), candidate.clone());
    }

    /// Fills in `candidate.objective`, scoring it only on a cache miss.
    ///
    /// Returns `true` on a hit. Evaluator failures are fatal for the run.
    pub fn evaluate<E: SubsetEvaluator + ?Sized>(
        &mut self,
        candidate: &mut Candidate,
        evaluator: &E,
    ) -> Result<bool> {
        if let Some(objective) = self.objective(&candidate.bits) {
            log::trace!("cache hit for {}", candidate.bits);
            candidate.objective = objective;
            self.hits += 1;
            return Ok(true);
        }
        candidate.objective = score(evaluator, &candidate.bits)?;
        log::trace!(
            "cache miss for {}: merit {}",
            candidate.bits,
            candidate.objective
        );
        self.insert(candidate);
        self.misses += 1;
        Ok(false)
    }

    /// Records a lookup that was resolved outside [`evaluate`](Self::evaluate).
    #[cfg(feature = "parallel")]
    pub(crate) fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    /// Number of distinct subsets scored.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if nothing has been scored.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Lookups served from the table.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups that invoked the evaluator.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Invokes the evaluator, attaching the subset to any failure.
pub(crate) fn score<E: SubsetEvaluator + ?Sized>(evaluator: &E, bits: &BitVector) -> Result<f64> {
    evaluator
        .evaluate_subset(bits)
        .map_err(|source| SearchError::Evaluation {
            subset: bits.to_attribute_string().trim_end().to_string(),
            source,
        })
}
