//! Per-worker bin cursors.

use crate::data::{BinIterator, BinnedData, DataError};

/// Lazily created [`BinIterator`]s, one slot per binned feature.
///
/// A traversal only touches the features of the nodes it visits, so cursors
/// are created on first use at the row being scored. Queries are expected in
/// non-decreasing row order; a query for an earlier row drops every cursor
/// and starts over from that row.
///
/// Each scoring worker owns its own `FeatureCursors`.
pub struct FeatureCursors<'a, D: BinnedData + ?Sized + 'a> {
    data: &'a D,
    iters: Vec<Option<D::Iter<'a>>>,
    last_row: usize,
}

impl<'a, D: BinnedData + ?Sized + 'a> FeatureCursors<'a, D> {
    /// Empty cursor set positioned at `start_row`.
    pub fn new(data: &'a D, start_row: usize) -> Self {
        let iters = (0..data.n_features()).map(|_| None).collect();
        Self {
            data,
            iters,
            last_row: start_row,
        }
    }

    /// Bin of `feature` at `row`.
    pub fn bin(&mut self, feature: usize, row: usize) -> Result<u32, DataError> {
        if row < self.last_row {
            self.reset();
        }
        self.last_row = row;

        let n_features = self.iters.len();
        let slot = self
            .iters
            .get_mut(feature)
            .ok_or(DataError::FeatureOutOfBounds { feature, n_features })?;
        let iter = match slot.take() {
            Some(iter) => iter,
            None => self.data.iter_at(feature, row)?,
        };
        slot.insert(iter).get(row)
    }

    fn reset(&mut self) {
        self.iters.iter_mut().for_each(|slot| *slot = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BinnedDataset;
    use ndarray::array;

    fn dataset() -> BinnedDataset {
        let raw = array![[0.0, 5.0], [1.0, 6.0], [2.0, 7.0], [3.0, 8.0]];
        BinnedDataset::fit(raw.view(), 16)
    }

    #[test]
    fn reads_forward() {
        let data = dataset();
        let mut cursors = FeatureCursors::new(&data, 1);
        assert_eq!(cursors.bin(0, 1), Ok(1));
        assert_eq!(cursors.bin(1, 2), Ok(2));
        assert_eq!(cursors.bin(0, 3), Ok(3));
    }

    #[test]
    fn rewinds_by_rebuilding() {
        let data = dataset();
        let mut cursors = FeatureCursors::new(&data, 0);
        assert_eq!(cursors.bin(0, 3), Ok(3));
        assert_eq!(cursors.bin(0, 0), Ok(0));
        assert_eq!(cursors.bin(1, 2), Ok(2));
        assert_eq!(cursors.bin(1, 1), Ok(1));
    }

    #[test]
    fn unknown_feature() {
        let data = dataset();
        let mut cursors = FeatureCursors::new(&data, 0);
        assert_eq!(
            cursors.bin(2, 0),
            Err(DataError::FeatureOutOfBounds {
                feature: 2,
                n_features: 2
            })
        );
    }
}
