//! Error taxonomy for the subset search.
//!
//! Every failure surfaces as a [`SearchError`]. Configuration and evaluator
//! capability problems are detected before the random stream is seeded;
//! evaluator failures abort the run with no partial result.

use thiserror::Error;

/// Boxed error type raised by external subset evaluators.
pub type EvaluatorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Coarse classification of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid search parameters or dataset shape.
    Config,
    /// The evaluator cannot score attribute subsets.
    UnsupportedEvaluator,
    /// The evaluator failed while scoring a subset.
    Evaluation,
    /// The initial population could not be built.
    Initialization,
    /// Writing the trace log failed.
    Io,
}

/// Errors returned by [`PsoRunner`](crate::pso::PsoRunner).
#[derive(Error, Debug)]
pub enum SearchError {
    /// Rejected configuration, raised before any evaluation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The supplied evaluator does not score subsets.
    #[error("{0} is not a subset evaluator")]
    UnsupportedEvaluator(String),

    /// The evaluator failed on a particular subset.
    #[error("evaluation of subset {subset} failed: {source}")]
    Evaluation {
        /// 1-based rendering of the subset being scored.
        subset: String,
        #[source]
        source: EvaluatorError,
    },

    /// The initializer could not place a bit.
    #[error("population initialization failed: {0}")]
    Initialization(String),

    /// Trace log I/O failure.
    #[error("trace log error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::UnsupportedEvaluator(_) => ErrorKind::UnsupportedEvaluator,
            Self::Evaluation { .. } => ErrorKind::Evaluation,
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
