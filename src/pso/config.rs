//! PSO search configuration.
//!
//! [`PsoConfig`] holds every parameter that controls the swarm loop.

use crate::error::{Result, SearchError};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Per-bit mutation applied after recombination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MutationStrategy {
    /// Invert each bit with the mutation probability.
    #[default]
    BitFlip,
    /// Clear each set bit with the mutation probability; never sets bits.
    BitOff,
}

impl MutationStrategy {
    /// Numeric selector: `0` is bit-flip, `1` is bit-off.
    pub fn selector(self) -> i32 {
        match self {
            Self::BitFlip => 0,
            Self::BitOff => 1,
        }
    }

    /// Resolves a numeric selector, falling back to bit-flip on unknown ids.
    pub fn from_selector(id: i32) -> Self {
        match id {
            0 => Self::BitFlip,
            1 => Self::BitOff,
            other => {
                log::warn!("unrecognized mutation type {other}: using default bit-flip");
                Self::BitFlip
            }
        }
    }

    /// Resolves a strategy name, falling back to bit-flip on unknown names.
    ///
    /// `"bit-clear"` is accepted as an alias for bit-off.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::warn!("unrecognized mutation type {name:?}: using default bit-flip");
            Self::BitFlip
        })
    }
}

/// Strict parsing: unknown names are a configuration error.
impl FromStr for MutationStrategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bit-flip" | "flip" => Ok(Self::BitFlip),
            "bit-off" | "bit-clear" | "off" | "clear" => Ok(Self::BitOff),
            other => Err(SearchError::config(format!(
                "unknown mutation type {other:?}, expected bit-flip or bit-off"
            ))),
        }
    }
}

impl fmt::Display for MutationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BitFlip => "bit-flip",
            Self::BitOff => "bit-off",
        })
    }
}

/// Configuration for the PSO subset search.
///
/// # Defaults
///
/// ```
/// use u_featsearch::pso::PsoConfig;
///
/// let config = PsoConfig::default();
/// assert_eq!(config.swarm_size, 20);
/// assert_eq!(config.iterations, 20);
/// assert_eq!(config.seed, 1);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_featsearch::pso::{MutationStrategy, PsoConfig};
///
/// let config = PsoConfig::default()
///     .with_swarm_size(40)
///     .with_iterations(100)
///     .with_mutation(MutationStrategy::BitOff)
///     .with_weights(0.25, 0.5, 0.25)
///     .with_start_set("1,3,5-7")
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PsoConfig {
    /// Number of particles in the swarm.
    pub swarm_size: usize,

    /// Number of generations after the initial one.
    pub iterations: usize,

    /// Mutation applied to every particle each generation.
    pub mutation: MutationStrategy,

    /// Per-bit mutation probability, in `[0, 1]`.
    pub mutation_probability: f64,

    /// Probability of keeping a particle's own bit during recombination.
    pub inertia_weight: f64,

    /// Probability of copying the bit from the generation's best particle.
    pub social_weight: f64,

    /// Probability of copying the bit from the particle's personal best.
    ///
    /// The three weights must be non-negative and sum to exactly `1.0`.
    pub individual_weight: f64,

    /// Optional starting subset as 1-based attribute ranges (`"1,3,5-7"`).
    ///
    /// When set, it becomes the first particle of the initial swarm.
    pub start_set: Option<String>,

    /// Emit a population report every this many generations.
    ///
    /// `None` reports only the initial and final generations.
    pub report_frequency: Option<usize>,

    /// Seed of the single random stream driving the run.
    pub seed: u64,

    /// Optional plain-text trace of the best merit per generation.
    pub log_file: Option<PathBuf>,

    /// Initial capacity of the evaluation cache.
    pub cache_capacity: usize,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 20,
            iterations: 20,
            mutation: MutationStrategy::BitFlip,
            mutation_probability: 0.01,
            inertia_weight: 0.33,
            social_weight: 0.33,
            individual_weight: 0.34,
            start_set: None,
            report_frequency: None,
            seed: 1,
            log_file: None,
            cache_capacity: 1001,
        }
    }
}

impl PsoConfig {
    /// Sets the swarm size.
    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    /// Sets the number of generations.
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Sets the mutation strategy.
    pub fn with_mutation(mut self, mutation: MutationStrategy) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the mutation strategy from its numeric selector.
    ///
    /// Unknown selectors fall back to bit-flip with a warning.
    pub fn with_mutation_selector(mut self, id: i32) -> Self {
        self.mutation = MutationStrategy::from_selector(id);
        self
    }

    /// Sets the per-bit mutation probability.
    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p;
        self
    }

    /// Sets the inertia, social and individual weights.
    pub fn with_weights(mut self, inertia: f64, social: f64, individual: f64) -> Self {
        self.inertia_weight = inertia;
        self.social_weight = social;
        self.individual_weight = individual;
        self
    }

    /// Sets the starting subset (1-based ranges).
    pub fn with_start_set(mut self, ranges: impl Into<String>) -> Self {
        let ranges = ranges.into();
        self.start_set = if ranges.trim().is_empty() {
            None
        } else {
            Some(ranges)
        };
        self
    }

    /// Sets the report frequency.
    pub fn with_report_frequency(mut self, every: usize) -> Self {
        self.report_frequency = Some(every);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the trace log path.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Sets the initial cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Report frequency in effect: the configured value or the iteration count.
    pub fn effective_report_frequency(&self) -> usize {
        self.report_frequency.unwrap_or(self.iterations)
    }

    /// Validates the configuration.
    ///
    /// Weight sums are compared exactly, so `(0.33, 0.33, 0.34)` passes and
    /// `(0.3, 0.3, 0.3)` does not.
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size < 1 {
            return Err(SearchError::config(format!(
                "swarm size set to {}, cannot be less than 1",
                self.swarm_size
            )));
        }
        let (w1, w2, w3) = (
            self.inertia_weight,
            self.social_weight,
            self.individual_weight,
        );
        #[allow(clippy::float_cmp)]
        let sums_to_one = w1 + w2 + w3 == 1.0;
        if w1 < 0.0 || w2 < 0.0 || w3 < 0.0 || !sums_to_one {
            return Err(SearchError::config(format!(
                "inertia weight {w1}, social weight {w2}, individual weight {w3}: \
                 weights must be non-negative and sum to 1"
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(SearchError::config(format!(
                "mutation probability set to {}, must lie in [0.0, 1.0]",
                self.mutation_probability
            )));
        }
        if self.iterations < 1 {
            return Err(SearchError::config(format!(
                "iterations set to {}, cannot be less than 1",
                self.iterations
            )));
        }
        if self.report_frequency == Some(0) {
            return Err(SearchError::config("report frequency must be at least 1"));
        }
        Ok(())
    }
}

/// Settings summary, one tab-indented line per parameter.
impl fmt::Display for PsoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\tPSO Search.")?;
        writeln!(
            f,
            "\tStart set: {}",
            self.start_set.as_deref().unwrap_or("no attributes")
        )?;
        writeln!(f, "\tPopulation size: {}", self.swarm_size)?;
        writeln!(f, "\tNumber of iterations: {}", self.iterations)?;
        writeln!(f, "\tMutation type: {}", self.mutation)?;
        writeln!(f, "\tMutation probability: {}", self.mutation_probability)?;
        writeln!(f, "\tInertia weight: {}", self.inertia_weight)?;
        writeln!(f, "\tSocial weight: {}", self.social_weight)?;
        writeln!(f, "\tIndividual weight: {}", self.individual_weight)?;
        writeln!(f, "\tReport frequency: {}", self.effective_report_frequency())?;
        writeln!(f, "\tSeed: {}", self.seed)?;
        match &self.log_file {
            Some(path) => writeln!(f, "\tLog file: {}", path.display()),
            None => writeln!(f, "\tLog file: none"),
        }
    }
}
