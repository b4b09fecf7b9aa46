//! Accumulating tree outputs into score buffers.
//!
//! Binned scoring runs in two phases. First, each worker routes its own
//! contiguous block of rows with its own [`FeatureCursors`] and records the
//! reached leaf ids. Only when every worker has succeeded are the leaf values
//! added into the score buffer, so a failed pass leaves scores untouched.

use ndarray::ArrayView2;
use tracing::trace;

use crate::data::BinnedData;
use crate::repr::{LeafId, Tree};
use crate::utils::{block_len, Parallelism};

use super::{FeatureCursors, PredictError};

impl Tree {
    /// Add this tree's output to `scores[i]` for every row `i < num_data`.
    ///
    /// # Errors
    ///
    /// Fails if the tree is unbound, if `num_data` exceeds the dataset or the
    /// score buffer, or if reading a bin fails. Scores are unchanged on error.
    pub fn add_prediction_to_score<D: BinnedData + Sync + ?Sized>(
        &self,
        data: &D,
        num_data: usize,
        scores: &mut [f64],
        parallelism: Parallelism,
    ) -> Result<(), PredictError> {
        check_score_len(scores, num_data)?;
        let n_rows = data.n_rows();
        if num_data > n_rows {
            return Err(PredictError::IndexOutOfRange {
                index: num_data - 1,
                n_rows,
            });
        }

        let leaves = self.route_rows(data, num_data, |i| i, parallelism)?;

        let block = block_len(num_data, parallelism.n_workers());
        let blocks: Vec<(&mut [f64], &[LeafId])> = scores[..num_data]
            .chunks_mut(block)
            .zip(leaves.chunks(block))
            .collect();
        parallelism.maybe_par_for_each(blocks, |(scores, leaves)| {
            for (score, &leaf) in scores.iter_mut().zip(leaves) {
                *score += self.leaf_value(leaf);
            }
        });
        Ok(())
    }

    /// Add this tree's output to `scores[row]` for every `row` in
    /// `used_data_indices`.
    ///
    /// Indices need not be sorted or unique; a repeated index receives the
    /// output once per occurrence.
    ///
    /// Routing runs on the workers, but the leaf values are then added on the
    /// calling thread. This pass is therefore slower than the full pass for
    /// large subsets.
    ///
    /// # Errors
    ///
    /// As [`Tree::add_prediction_to_score`], plus
    /// [`PredictError::IndexOutOfRange`] for an index past the dataset.
    pub fn add_prediction_to_score_subset<D: BinnedData + Sync + ?Sized>(
        &self,
        data: &D,
        used_data_indices: &[usize],
        scores: &mut [f64],
        parallelism: Parallelism,
    ) -> Result<(), PredictError> {
        let n_rows = data.n_rows();
        for &index in used_data_indices {
            if index >= n_rows {
                return Err(PredictError::IndexOutOfRange { index, n_rows });
            }
            check_score_len(scores, index + 1)?;
        }

        let leaves = self.route_rows(
            data,
            used_data_indices.len(),
            |i| used_data_indices[i],
            parallelism,
        )?;

        // Indices may repeat, so accumulate sequentially.
        for (&row, &leaf) in used_data_indices.iter().zip(&leaves) {
            scores[row] += self.leaf_value(leaf);
        }
        Ok(())
    }

    /// Add this tree's output to `scores[i]` for every row `i` of a raw
    /// feature matrix (`[n_rows, n_features]`, real feature ids as columns).
    pub fn add_raw_prediction_to_score(
        &self,
        features: ArrayView2<'_, f64>,
        scores: &mut [f64],
        parallelism: Parallelism,
    ) -> Result<(), PredictError> {
        let n_rows = features.nrows();
        check_score_len(scores, n_rows)?;

        let block = block_len(n_rows, parallelism.n_workers());
        let blocks: Vec<(usize, &mut [f64])> = scores[..n_rows].chunks_mut(block).enumerate().collect();
        parallelism.maybe_par_for_each(blocks, |(b, scores)| {
            let start = b * block;
            for (offset, score) in scores.iter_mut().enumerate() {
                *score += self.predict(&features.row(start + offset));
            }
        });
        Ok(())
    }

    /// Leaf reached by each of `n` rows, where the `i`-th row is `row_of(i)`.
    fn route_rows<D: BinnedData + Sync + ?Sized>(
        &self,
        data: &D,
        n: usize,
        row_of: impl Fn(usize) -> usize + Sync,
        parallelism: Parallelism,
    ) -> Result<Vec<LeafId>, PredictError> {
        if !self.is_bound() {
            return Err(PredictError::UnboundTree);
        }
        let mut leaves = vec![LeafId::ROOT; n];
        if n == 0 || self.num_nodes() == 0 {
            return Ok(leaves);
        }

        let block = block_len(n, parallelism.n_workers());
        trace!(n_rows = n, n_blocks = n.div_ceil(block), "routing rows");

        let blocks: Vec<(usize, &mut [LeafId])> = leaves.chunks_mut(block).enumerate().collect();
        parallelism.maybe_par_try_for_each(blocks, |(b, out)| {
            let start = b * block;
            let mut cursors = FeatureCursors::new(data, row_of(start));
            for (offset, leaf) in out.iter_mut().enumerate() {
                *leaf = self.get_leaf_binned(&mut cursors, row_of(start + offset))?;
            }
            Ok::<_, PredictError>(())
        })?;
        Ok(leaves)
    }
}

fn check_score_len(scores: &[f64], expected: usize) -> Result<(), PredictError> {
    if scores.len() < expected {
        return Err(PredictError::ScoreLength {
            expected,
            actual: scores.len(),
        });
    }
    Ok(())
}
