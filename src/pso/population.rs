//! Swarm state: current particles and their personal bests.

use super::types::DatasetShape;
use crate::bitset::BitVector;
use crate::candidate::Candidate;
use crate::error::{Result, SearchError};
use rand::Rng;

/// Upper bound on redraws when looking for a non-reserved bit.
const MAX_BIT_DRAWS: usize = 1 << 20;

/// Summary of the current generation's objectives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    /// Lowest objective.
    pub min: f64,
    /// Highest objective.
    pub max: f64,
    /// Mean objective.
    pub mean: f64,
    /// Sum of objectives.
    pub sum: f64,
}

impl PopulationStats {
    /// Computes statistics over a non-empty candidate slice.
    ///
    /// # Panics
    /// Panics if `candidates` is empty.
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let first = candidates[0].objective;
        let (mut min, mut max, mut sum) = (first, first, first);
        for c in &candidates[1..] {
            sum += c.objective;
            if c.objective > max {
                max = c.objective;
            } else if c.objective < min {
                min = c.objective;
            }
        }
        Self {
            min,
            max,
            mean: sum / candidates.len() as f64,
            sum,
        }
    }

    /// Returns `true` when every objective is the same.
    pub fn is_flat(&self) -> bool {
        self.max - self.min <= 0.0
    }
}

/// Fixed-size swarm: one current particle and one personal best per slot.
#[derive(Debug, Clone)]
pub struct Population {
    current: Vec<Candidate>,
    personal_best: Vec<Candidate>,
}

impl Population {
    /// Builds the initial swarm.
    ///
    /// When `start` is given, slot 0 holds exactly those indices (minus
    /// `reserved`) and the random slots begin at 1. Every other slot draws a
    /// bit count `k = |(r mod n) - 1|` (0 promoted to 1) and then `k` random
    /// positions, redrawing any that hit `reserved`. Repeated positions are
    /// simply set again, so a slot may end up with fewer than `k` bits.
    ///
    /// Personal bests start as copies of the current particles.
    pub fn initialize<R: Rng>(
        size: usize,
        num_attributes: usize,
        reserved: Option<usize>,
        start: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<Self> {
        let shape = DatasetShape {
            num_attributes,
            class_index: reserved,
        };
        if shape.selectable() == 0 {
            return Err(SearchError::Initialization(format!(
                "no selectable attribute among {num_attributes}"
            )));
        }

        let mut current = Vec::with_capacity(size);
        if let Some(indices) = start {
            let mut seed = Candidate::new(num_attributes);
            for &i in indices.iter().filter(|&&i| Some(i) != reserved) {
                seed.bits.set(i);
            }
            current.push(seed);
        }

        let n = num_attributes as i64;
        while current.len() < size {
            let mut particle = Candidate::new(num_attributes);
            let mut num_bits = (i64::from(rng.random::<i32>()) % n - 1).abs();
            if num_bits == 0 {
                num_bits = 1;
            }
            for _ in 0..num_bits {
                let bit = draw_bit(n, reserved, rng)?;
                particle.bits.set(bit);
            }
            current.push(particle);
        }
        current.truncate(size);

        let personal_best = current.clone();
        Ok(Self {
            current,
            personal_best,
        })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Returns `true` for an empty swarm.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Current particles.
    pub fn current(&self) -> &[Candidate] {
        &self.current
    }

    /// Mutable access to the current particles.
    pub fn current_mut(&mut self) -> &mut [Candidate] {
        &mut self.current
    }

    /// Personal-best particles.
    pub fn personal_best(&self) -> &[Candidate] {
        &self.personal_best
    }

    /// Current particle and personal best of slot `i`.
    pub fn slot_mut(&mut self, i: usize) -> (&mut Candidate, &Candidate) {
        (&mut self.current[i], &self.personal_best[i])
    }

    /// Replaces slot `i`'s personal best if the current particle beats it.
    ///
    /// Returns `true` when the personal best changed.
    pub fn update_personal_best(&mut self, i: usize) -> bool {
        if self.current[i].beats(&self.personal_best[i]) {
            self.personal_best[i] = self.current[i].clone();
            true
        } else {
            false
        }
    }

    /// Bit vectors of the current particles, in slot order.
    pub fn positions(&self) -> Vec<BitVector> {
        self.current.iter().map(|c| c.bits.clone()).collect()
    }

    /// Objective statistics of the current particles.
    pub fn stats(&self) -> PopulationStats {
        PopulationStats::from_candidates(&self.current)
    }
}

fn draw_bit<R: Rng>(n: i64, reserved: Option<usize>, rng: &mut R) -> Result<usize> {
    for _ in 0..MAX_BIT_DRAWS {
        let bit = (i64::from(rng.random::<i32>()).abs() % n) as usize;
        if Some(bit) != reserved {
            return Ok(bit);
        }
    }
    Err(SearchError::Initialization(
        "could not draw a non-class attribute".into(),
    ))
}

/// Wraps hand-built particles; personal bests start as copies.
impl From<Vec<Candidate>> for Population {
    fn from(current: Vec<Candidate>) -> Self {
        let personal_best = current.clone();
        Self {
            current,
            personal_best,
        }
    }
}
