//! Root-to-leaf traversal over binned and raw feature values.

use std::convert::Infallible;

use crate::data::{BinnedData, SampleAccessor};
use crate::repr::{Child, LeafId, NodeId, Tree};

use super::{FeatureCursors, PredictError};

impl Tree {
    /// Walk from the root, asking `goes_right` at every internal node.
    ///
    /// Children always have larger ids than their parent, so this stops
    /// after at most `max_depth` steps.
    #[inline]
    fn descend<E>(&self, mut goes_right: impl FnMut(NodeId) -> Result<bool, E>) -> Result<LeafId, E> {
        let mut node = match self.root() {
            Child::Leaf(leaf) => return Ok(leaf),
            Child::Node(node) => node,
        };
        loop {
            let next = if goes_right(node)? {
                self.right_child(node)
            } else {
                self.left_child(node)
            };
            match next {
                Child::Node(child) => node = child,
                Child::Leaf(leaf) => return Ok(leaf),
            }
        }
    }

    /// Leaf reached by `row` of a binned dataset.
    ///
    /// Uses the binned feature ids and bin thresholds, so the tree must be
    /// bound to the dataset behind `cursors` (see [`Tree::bind_bins`]).
    ///
    /// # Errors
    ///
    /// [`PredictError::UnboundTree`] for a tree restored from text and not
    /// yet bound, or the data error raised while reading a bin.
    pub fn get_leaf_binned<D: BinnedData + ?Sized>(
        &self,
        cursors: &mut FeatureCursors<'_, D>,
        row: usize,
    ) -> Result<LeafId, PredictError> {
        if !self.is_bound() {
            return Err(PredictError::UnboundTree);
        }
        self.descend(|node| {
            let bin = cursors.bin(self.split_feature(node) as usize, row)?;
            Ok::<_, PredictError>(
                self.decision_type(node)
                    .goes_right_bin(bin, self.threshold_in_bin(node)),
            )
        })
    }

    /// Leaf reached by a sample of real feature values.
    pub fn get_leaf<S: SampleAccessor + ?Sized>(&self, sample: &S) -> LeafId {
        let leaf = self.descend(|node| {
            let value = sample.feature(self.split_feature_real(node) as usize);
            Ok::<_, Infallible>(self.decision_type(node).goes_right(value, self.threshold(node)))
        });
        match leaf {
            Ok(leaf) => leaf,
            Err(never) => match never {},
        }
    }

    /// Output value for a sample of real feature values.
    #[inline]
    pub fn predict<S: SampleAccessor + ?Sized>(&self, sample: &S) -> f64 {
        self.leaf_value(self.get_leaf(sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BinMapper, BinnedDataset};
    use crate::repr::decision::categories_to_mask;
    use crate::repr::SplitInfo;
    use ndarray::array;

    /// Feature 0 numerical (<= 1.5), then on the right feature 1 categorical
    /// (categories {0, 2} go left).
    fn tree() -> Tree {
        let mut tree = Tree::new(3);
        tree.split(
            LeafId(0),
            SplitInfo::numerical(0, 1, 1.5).with_outputs((-1.0, 1), (0.0, 1)),
        )
        .unwrap();
        let mask = categories_to_mask(&[0, 2]).unwrap();
        tree.split(
            LeafId(1),
            SplitInfo::categorical(1, mask).with_outputs((2.0, 1), (3.0, 1)),
        )
        .unwrap();
        tree
    }

    #[test]
    fn raw_traversal() {
        let tree = tree();
        assert_eq!(tree.get_leaf(&[1.0, 0.0]), LeafId(0));
        assert_eq!(tree.get_leaf(&[1.5, 9.0]), LeafId(0));
        assert_eq!(tree.get_leaf(&[2.0, 0.0]), LeafId(1));
        assert_eq!(tree.get_leaf(&[2.0, 2.0]), LeafId(1));
        assert_eq!(tree.get_leaf(&[2.0, 1.0]), LeafId(2));
        assert_eq!(tree.get_leaf(&[2.0, f64::NAN]), LeafId(2));
        assert_eq!(tree.predict(&[f64::NAN, 0.0]), 2.0);
        // Missing features read as NaN.
        assert_eq!(tree.predict(&[3.0]), 3.0);
    }

    #[test]
    fn single_leaf_tree() {
        let mut tree = Tree::new(4);
        tree.set_leaf_value(LeafId::ROOT, 0.25);
        assert_eq!(tree.get_leaf(&[1.0, 2.0]), LeafId::ROOT);
        assert_eq!(tree.predict(&[] as &[f64]), 0.25);
    }

    #[test]
    fn binned_traversal_matches_raw() {
        let raw = array![[1.0, 0.0], [2.0, 2.0], [2.0, 1.0], [0.5, 1.0]];
        let data = BinnedDataset::from_raw(
            raw.view(),
            vec![
                (0, BinMapper::numerical(vec![1.0, 1.5, 2.0])),
                (1, BinMapper::categorical(3)),
            ],
        )
        .unwrap();
        let tree = tree();
        let mut cursors = FeatureCursors::new(&data, 0);
        for (row, sample) in raw.rows().into_iter().enumerate() {
            let binned = tree.get_leaf_binned(&mut cursors, row).unwrap();
            assert_eq!(binned, tree.get_leaf(&sample), "row {row}");
        }
    }
}
