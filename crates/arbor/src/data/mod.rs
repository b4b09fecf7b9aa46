//! Feature data consumed by tree traversal.
//!
//! Two access paths exist:
//!
//! - **Binned** ([`BinnedData`]): discretized training data, read one feature
//!   at a time through forward-only [`BinIterator`] cursors.
//! - **Raw** ([`SampleAccessor`]): real feature values of a single sample,
//!   used for inference.
//!
//! [`BinnedDataset`] is a dense in-memory implementation of [`BinnedData`].

mod bin_mapper;
mod dataset;

pub use bin_mapper::BinMapper;
pub use dataset::{BinnedDataset, DenseBinIterator};

use ndarray::ArrayView1;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by feature data sources.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("feature {feature} out of bounds ({n_features} features)")]
    FeatureOutOfBounds { feature: usize, n_features: usize },
    #[error("row {row} out of bounds ({n_rows} rows)")]
    RowOutOfBounds { row: usize, n_rows: usize },
    #[error("cursor for feature {feature} is at row {position}, cannot go back to row {row}")]
    CursorRewind {
        feature: usize,
        position: usize,
        row: usize,
    },
    #[error("real feature {real_feature} is not present in the dataset")]
    UnknownFeature { real_feature: usize },
    #[error("threshold {threshold} cannot be expressed in the bins of feature {feature}: {reason}")]
    InvalidThreshold {
        feature: usize,
        threshold: f64,
        reason: &'static str,
    },
}

// =============================================================================
// Binned access
// =============================================================================

/// Forward-only cursor over the bins of one feature.
///
/// A cursor is created at a start row and must be queried with non-decreasing
/// row indices. To go back, build a new cursor.
pub trait BinIterator {
    /// Bin of `row`.
    fn get(&mut self, row: usize) -> Result<u32, DataError>;
}

/// A discretized dataset, one column of bins per feature.
///
/// Feature ids here are *binned* (inner) ids. A dataset may drop features
/// (for example constant ones), so inner ids need not match the real column
/// ids of the raw data; [`BinnedData::inner_feature`] maps between the two.
pub trait BinnedData {
    /// Cursor type handed out by [`BinnedData::iter_at`].
    type Iter<'a>: BinIterator + Send
    where
        Self: 'a;

    fn n_rows(&self) -> usize;

    fn n_features(&self) -> usize;

    /// Cursor over `feature`, positioned at `start_row`.
    fn iter_at(&self, feature: usize, start_row: usize) -> Result<Self::Iter<'_>, DataError>;

    /// Binned id of a real feature, `None` if the dataset does not carry it.
    fn inner_feature(&self, real_feature: usize) -> Option<usize>;

    /// Bin boundaries of a binned feature.
    fn bin_mapper(&self, feature: usize) -> Result<&BinMapper, DataError>;
}

// =============================================================================
// Raw access
// =============================================================================

/// Real feature values of one sample.
///
/// Missing or out-of-range features read as NaN.
pub trait SampleAccessor {
    fn feature(&self, index: usize) -> f64;
}

impl SampleAccessor for [f64] {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self.get(index).copied().unwrap_or(f64::NAN)
    }
}

impl<const N: usize> SampleAccessor for [f64; N] {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self.as_slice().feature(index)
    }
}

impl SampleAccessor for Vec<f64> {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self.as_slice().feature(index)
    }
}

impl SampleAccessor for ArrayView1<'_, f64> {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self.get(index).copied().unwrap_or(f64::NAN)
    }
}

impl<S: SampleAccessor + ?Sized> SampleAccessor for &S {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        (**self).feature(index)
    }
}
