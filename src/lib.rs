//! Wrapper-style feature subset search with a binary particle swarm.
//!
//! Finds a compact, high-merit subset of a dataset's attributes by letting
//! a swarm of bit-vector particles explore the subset space. Merit comes
//! from a pluggable [`SubsetEvaluator`](pso::SubsetEvaluator); every
//! distinct subset is scored at most once per run.
//!
//! - [`bitset`]: Fixed-length bit vectors and 1-based range lists
//! - [`candidate`]: A scored subset
//! - [`cache`]: Subset → merit memoization
//! - [`pso`]: Swarm, operators and the search loop
//! - [`error`]: Error type shared by the crate
//!
//! # Example
//!
//! ```
//! use u_featsearch::bitset::BitVector;
//! use u_featsearch::error::EvaluatorError;
//! use u_featsearch::pso::{DatasetShape, PsoConfig, PsoRunner, SubsetEvaluator};
//!
//! struct Coverage;
//!
//! impl SubsetEvaluator for Coverage {
//!     fn evaluate_subset(&self, subset: &BitVector) -> Result<f64, EvaluatorError> {
//!         Ok(subset.count_set() as f64)
//!     }
//! }
//!
//! let shape = DatasetShape::with_class(6, 5);
//! let config = PsoConfig::default().with_seed(7);
//! let selected = PsoRunner::search(&Coverage, &shape, &config).unwrap();
//! assert!(!selected.contains(&5));
//! ```
//!
//! # Features
//!
//! - `parallel`: score the distinct uncached subsets of a generation on the
//!   rayon thread pool
//! - `serde`: serialize configurations and bit vectors

pub mod bitset;
pub mod cache;
pub mod candidate;
pub mod error;
pub mod pso;

pub use error::{Result, SearchError};
