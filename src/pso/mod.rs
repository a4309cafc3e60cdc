//! Binary particle swarm search over attribute subsets.
//!
//! A wrapper-style feature selector: each particle is a bit vector over the
//! dataset's attributes, scored by a user-supplied [`SubsetEvaluator`].
//! Particles move by geometric three-parent recombination toward the
//! generation best and their own personal best, followed by mutation.
//!
//! # Core Traits
//!
//! - [`SubsetEvaluator`]: Scores a subset; higher is better
//!
//! # Key Types
//!
//! - [`PsoConfig`]: Swarm size, iterations, mixing weights, mutation
//! - [`PsoRunner`]: Executes the search loop
//! - [`PsoResult`]: Selected attributes, history and reports
//!
//! # Building Blocks
//!
//! - [`Population`]: Current particles and personal bests
//! - [`FitnessScaler`]: Linear fitness scaling
//! - [`BestTracker`]: Generation and all-time best selection
//! - [`operators`]: Three-parent crossover and bit mutations
//!
//! # References
//!
//! - Kennedy & Eberhart (1997), "A discrete binary version of the particle
//!   swarm algorithm"
//! - Moraglio, Di Chio & Poli (2007), "Geometric Particle Swarm Optimisation"
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
pub mod operators;
mod population;
mod report;
mod runner;
mod scaling;
mod tracker;
mod types;

pub use config::{MutationStrategy, PsoConfig};
pub use population::{Population, PopulationStats};
pub use report::{GenerationReport, ReportRow, TraceLog};
pub use runner::{PsoResult, PsoRunner};
pub use scaling::{FitnessScaler, DEFAULT_MULTIPLE};
pub use tracker::{Best, BestTracker, TrackOutcome};
pub use types::{DatasetShape, SubsetEvaluator};
