//! Generation-best and all-time-best bookkeeping.
//!
//! After each generation the tracker picks the generation's *partial best*
//! and folds it into the *total best*. Higher merit wins; on a tolerant
//! merit tie the subset with fewer attributes wins.

use super::population::PopulationStats;
use crate::candidate::{objectives_eq, Candidate};

/// What happened while tracking one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    /// Every particle had the same merit; the sparsest one was chosen.
    pub flat: bool,
    /// The total best changed this generation.
    pub improved: bool,
}

/// A tracked best particle with its attribute count.
#[derive(Debug, Clone, PartialEq)]
pub struct Best {
    /// Snapshot of the particle.
    pub candidate: Candidate,
    /// Number of selected attributes.
    pub feature_count: usize,
}

impl Best {
    fn of(candidate: &Candidate, feature_count: usize) -> Self {
        Self {
            candidate: candidate.clone(),
            feature_count,
        }
    }

    /// Merit of the tracked particle.
    pub fn objective(&self) -> f64 {
        self.candidate.objective
    }
}

/// Tracker state across a run.
#[derive(Debug, Clone, Default)]
pub struct BestTracker {
    partial: Option<Best>,
    total: Option<Best>,
    history: Vec<f64>,
    flat_generations: Vec<usize>,
}

impl BestTracker {
    /// Creates a tracker with no best yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects this generation's best and updates the all-time best.
    ///
    /// On a merit tie during the scan, a particle displaces the running
    /// choice only if it has fewer attributes than the previous
    /// generation's partial best (zero before the first generation).
    ///
    /// # Panics
    /// Panics if `candidates` is empty.
    pub fn track(&mut self, candidates: &[Candidate], stats: &PopulationStats) -> TrackOutcome {
        let flat = stats.is_flat();
        let (winner, count) = if flat {
            sparsest(candidates)
        } else {
            let previous = self.partial.as_ref().map_or(0, |b| b.feature_count);
            best_by_merit(candidates, previous)
        };

        let improved = match &self.total {
            None => true,
            Some(total) => {
                winner.objective > total.objective()
                    || (objectives_eq(total.objective(), winner.objective)
                        && count < total.feature_count)
            }
        };
        if improved {
            self.total = Some(Best::of(winner, count));
        }
        self.partial = Some(Best::of(winner, count));

        if flat {
            self.flat_generations.push(self.history.len());
        }
        self.history.push(self.total_objective());
        TrackOutcome { flat, improved }
    }

    /// Best particle of the latest generation.
    pub fn partial_best(&self) -> Option<&Best> {
        self.partial.as_ref()
    }

    /// Best particle across all generations.
    pub fn total_best(&self) -> Option<&Best> {
        self.total.as_ref()
    }

    /// Merit of the total best, or negative infinity before any generation.
    pub fn total_objective(&self) -> f64 {
        self.total
            .as_ref()
            .map_or(f64::NEG_INFINITY, Best::objective)
    }

    /// Total-best merit recorded after every tracked generation.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Generations in which all particles had the same merit.
    pub fn flat_generations(&self) -> &[usize] {
        &self.flat_generations
    }

    /// First generation whose recorded merit equals the final total best.
    pub fn first_best_generation(&self) -> usize {
        let best = self.total_objective();
        #[allow(clippy::float_cmp)]
        let first = self.history.iter().position(|&v| v == best);
        first.unwrap_or(0)
    }
}

fn best_by_merit(candidates: &[Candidate], previous_count: usize) -> (&Candidate, usize) {
    let mut best = &candidates[0];
    let mut best_objective = best.objective;
    let mut best_count = best.feature_count();
    for c in &candidates[1..] {
        if c.objective > best_objective {
            best = c;
            best_objective = c.objective;
            best_count = c.feature_count();
        } else if objectives_eq(c.objective, best_objective) {
            let count = c.feature_count();
            if count < previous_count {
                best = c;
                best_objective = c.objective;
                best_count = count;
            }
        }
    }
    (best, best_count)
}

fn sparsest(candidates: &[Candidate]) -> (&Candidate, usize) {
    let mut best = &candidates[0];
    let mut best_count = best.feature_count();
    for c in &candidates[1..] {
        let count = c.feature_count();
        if count < best_count {
            best = c;
            best_count = count;
        }
    }
    (best, best_count)
}
