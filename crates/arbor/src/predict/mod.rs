//! Tree evaluation: traversal and accumulation into score buffers.
//!
//! Two paths are provided:
//!
//! - **Binned**: [`Tree::add_prediction_to_score`] and
//!   [`Tree::add_prediction_to_score_subset`] route rows of a [`BinnedData`]
//!   through the binned split features, as the trainer does after each tree.
//! - **Raw**: [`Tree::get_leaf`], [`Tree::predict`] and
//!   [`Tree::add_raw_prediction_to_score`] use the real-space features and
//!   thresholds, as inference does.
//!
//! [`Tree`]: crate::repr::Tree
//! [`Tree::add_prediction_to_score`]: crate::repr::Tree::add_prediction_to_score
//! [`Tree::add_prediction_to_score_subset`]: crate::repr::Tree::add_prediction_to_score_subset
//! [`Tree::add_raw_prediction_to_score`]: crate::repr::Tree::add_raw_prediction_to_score
//! [`Tree::get_leaf`]: crate::repr::Tree::get_leaf
//! [`Tree::predict`]: crate::repr::Tree::predict
//! [`BinnedData`]: crate::data::BinnedData

mod cursor;
mod score;
mod traversal;

pub use cursor::FeatureCursors;

use crate::data::DataError;

/// Errors from scoring a tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("score buffer holds {actual} values, need at least {expected}")]
    ScoreLength { expected: usize, actual: usize },
    #[error("row index {index} out of range ({n_rows} rows)")]
    IndexOutOfRange { index: usize, n_rows: usize },
    #[error("tree is not bound to a binned dataset")]
    UnboundTree,
}
