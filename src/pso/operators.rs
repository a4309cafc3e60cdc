//! Position update operators for bit-vector particles.
//!
//! # Recombination
//!
//! - [`three_parent_crossover`]: geometric PSO move (3PBMCX). Each bit is
//!   kept, copied from the swarm's generation best, or copied from the
//!   particle's personal best, with probabilities given by [`Weights`].
//!
//! # Mutation
//!
//! - [`bit_flip_mutation`]: invert bits with a fixed probability
//! - [`bit_off_mutation`]: clear set bits with a fixed probability
//!
//! All operators draw exactly one uniform number per bit position in
//! `0..len-1`, in ascending order, so the random stream consumed per
//! particle depends only on the vector length. The last position is never
//! touched, and neither is the `protected` (class) position.
//!
//! # References
//!
//! - Moraglio, Di Chio & Poli (2007), "Geometric Particle Swarm Optimisation"
//! - García-Nieto, Alba, Jourdan & Talbi (2009), "Sensitivity and
//!   specificity based multiobjective approach for feature selection"

use super::config::MutationStrategy;
use crate::bitset::BitVector;
use rand::Rng;

/// Mixing weights of the three-parent recombination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Keep the particle's own bit.
    pub inertia: f64,
    /// Copy from the generation best.
    pub social: f64,
    /// Copy from the personal best.
    pub individual: f64,
}

/// Which parent a recombined bit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The particle itself.
    Current,
    /// The generation's best particle.
    Social,
    /// The particle's personal best.
    Personal,
}

impl Weights {
    /// Maps a uniform draw in `[0, 1)` to the parent it selects.
    pub fn pick(&self, p: f64) -> Source {
        if p <= self.inertia {
            Source::Current
        } else if p <= self.inertia + self.social {
            Source::Social
        } else {
            Source::Personal
        }
    }
}

/// Bit positions operators may draw for: every index but the last.
fn positions(len: usize) -> std::ops::Range<usize> {
    0..len.saturating_sub(1)
}

/// Three-parent mask crossover toward `social_best` and `personal_best`.
///
/// # Panics
/// Panics if the parents are shorter than `current`.
pub fn three_parent_crossover<R: Rng>(
    current: &mut BitVector,
    social_best: &BitVector,
    personal_best: &BitVector,
    weights: &Weights,
    protected: Option<usize>,
    rng: &mut R,
) {
    for i in positions(current.len()) {
        let p: f64 = rng.random();
        if Some(i) == protected {
            continue;
        }
        match weights.pick(p) {
            Source::Current => {}
            Source::Social => current.assign(i, social_best.get(i)),
            Source::Personal => current.assign(i, personal_best.get(i)),
        }
    }
}

/// Inverts each eligible bit with probability `rate`.
pub fn bit_flip_mutation<R: Rng>(
    bits: &mut BitVector,
    rate: f64,
    protected: Option<usize>,
    rng: &mut R,
) {
    for i in positions(bits.len()) {
        let p: f64 = rng.random();
        if p < rate && Some(i) != protected {
            bits.flip(i);
        }
    }
}

/// Clears each eligible set bit with probability `rate`.
pub fn bit_off_mutation<R: Rng>(
    bits: &mut BitVector,
    rate: f64,
    protected: Option<usize>,
    rng: &mut R,
) {
    for i in positions(bits.len()) {
        let p: f64 = rng.random();
        if p < rate && Some(i) != protected {
            bits.clear(i);
        }
    }
}

/// Applies the configured mutation strategy.
pub fn mutate<R: Rng>(
    bits: &mut BitVector,
    strategy: MutationStrategy,
    rate: f64,
    protected: Option<usize>,
    rng: &mut R,
) {
    match strategy {
        MutationStrategy::BitFlip => bit_flip_mutation(bits, rate, protected, rng),
        MutationStrategy::BitOff => bit_off_mutation(bits, rate, protected, rng),
    }
}
