//! Contracts between the search engine and its callers.
//!
//! The engine never sees instance data. It needs a [`SubsetEvaluator`]
//! that turns a subset into a merit score and a [`DatasetShape`] giving
//! the attribute count and the optional class attribute.

use crate::bitset::BitVector;
use crate::error::EvaluatorError;

/// Scores attribute subsets. Higher merit is better.
///
/// This is the only point where the search touches training data. The
/// search calls [`evaluate_subset`](SubsetEvaluator::evaluate_subset) at
/// most once per distinct subset in a run.
///
/// # Implementing
///
/// ```ignore
/// struct Correlation { data: Dataset }
///
/// impl SubsetEvaluator for Correlation {
///     fn evaluate_subset(&self, subset: &BitVector) -> Result<f64, EvaluatorError> {
///         Ok(self.data.cfs_merit(&subset.to_index_list())?)
///     }
/// }
/// ```
///
/// # Thread Safety
///
/// `Send + Sync` because the `parallel` feature scores cache misses with
/// rayon.
pub trait SubsetEvaluator: Send + Sync {
    /// Scores the subset whose set bits are the selected attributes.
    fn evaluate_subset(&self, subset: &BitVector) -> Result<f64, EvaluatorError>;

    /// Human-readable evaluator name used in error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether this evaluator scores whole subsets.
    ///
    /// Single-attribute rankers return `false`; the search rejects them
    /// before doing any work.
    fn scores_subsets(&self) -> bool {
        true
    }

    /// Whether merit depends on the class attribute.
    ///
    /// Unsupervised evaluators return `false`, in which case the dataset's
    /// class index is not reserved and may be selected.
    fn is_supervised(&self) -> bool {
        true
    }
}

/// Attribute layout of the dataset being searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetShape {
    /// Total number of attributes, class attribute included.
    pub num_attributes: usize,
    /// Zero-based index of the class attribute, if any.
    pub class_index: Option<usize>,
}

impl DatasetShape {
    /// Shape with no class attribute.
    pub fn new(num_attributes: usize) -> Self {
        Self {
            num_attributes,
            class_index: None,
        }
    }

    /// Shape whose class attribute sits at `class_index`.
    pub fn with_class(num_attributes: usize, class_index: usize) -> Self {
        Self {
            num_attributes,
            class_index: Some(class_index),
        }
    }

    /// Number of attributes the search may select.
    pub fn selectable(&self) -> usize {
        match self.class_index {
            Some(c) if c < self.num_attributes => self.num_attributes - 1,
            _ => self.num_attributes,
        }
    }
}
