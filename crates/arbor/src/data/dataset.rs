//! Dense, feature-major binned dataset.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::{BinIterator, BinMapper, BinnedData, DataError};

/// Binned feature matrix stored feature-major (`[n_features, n_rows]`).
///
/// Each binned feature remembers which raw column it was built from, so
/// binned ids and real ids can differ.
#[derive(Debug, Clone)]
pub struct BinnedDataset {
    bins: Array2<u32>,
    mappers: Vec<BinMapper>,
    real_features: Vec<usize>,
    inner_by_real: HashMap<usize, usize>,
}

impl BinnedDataset {
    /// Bin a raw sample-major matrix (`[n_rows, n_columns]`).
    ///
    /// `features` lists, in binned-id order, the raw column each binned
    /// feature is read from and how it is discretized.
    pub fn from_raw(
        raw: ArrayView2<'_, f64>,
        features: Vec<(usize, BinMapper)>,
    ) -> Result<Self, DataError> {
        let n_columns = raw.ncols();
        if let Some(&(real, _)) = features.iter().find(|(real, _)| *real >= n_columns) {
            return Err(DataError::FeatureOutOfBounds {
                feature: real,
                n_features: n_columns,
            });
        }
        Ok(Self::bin_columns(raw, features))
    }

    fn bin_columns(raw: ArrayView2<'_, f64>, features: Vec<(usize, BinMapper)>) -> Self {
        let mut bins = Array2::<u32>::zeros((features.len(), raw.nrows()));
        let mut mappers = Vec::with_capacity(features.len());
        let mut real_features = Vec::with_capacity(features.len());
        let mut inner_by_real = HashMap::with_capacity(features.len());

        for (inner, (real, mapper)) in features.into_iter().enumerate() {
            bins.row_mut(inner)
                .iter_mut()
                .zip(raw.column(real).iter())
                .for_each(|(bin, &value)| *bin = mapper.value_to_bin(value));

            inner_by_real.insert(real, inner);
            real_features.push(real);
            mappers.push(mapper);
        }

        Self {
            bins,
            mappers,
            real_features,
            inner_by_real,
        }
    }

    /// Bin every column of `raw` as a numerical feature with at most
    /// `max_bins` bins. Binned ids equal real ids.
    pub fn fit(raw: ArrayView2<'_, f64>, max_bins: usize) -> Self {
        let features = raw
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(real, column)| {
                let values: Vec<f64> = column.iter().copied().collect();
                (real, BinMapper::from_values(&values, max_bins))
            })
            .collect();
        Self::bin_columns(raw, features)
    }

    /// Raw column a binned feature was built from.
    pub fn real_feature(&self, feature: usize) -> Option<usize> {
        self.real_features.get(feature).copied()
    }

    /// Bins of one feature for all rows.
    pub fn feature_bins(&self, feature: usize) -> Result<ArrayView1<'_, u32>, DataError> {
        self.check_feature(feature)?;
        Ok(self.bins.row(feature))
    }

    fn check_feature(&self, feature: usize) -> Result<(), DataError> {
        if feature < self.mappers.len() {
            Ok(())
        } else {
            Err(DataError::FeatureOutOfBounds {
                feature,
                n_features: self.mappers.len(),
            })
        }
    }
}

impl BinnedData for BinnedDataset {
    type Iter<'a> = DenseBinIterator<'a>;

    #[inline]
    fn n_rows(&self) -> usize {
        self.bins.ncols()
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.mappers.len()
    }

    fn iter_at(&self, feature: usize, start_row: usize) -> Result<DenseBinIterator<'_>, DataError> {
        let column = self.feature_bins(feature)?;
        if start_row > column.len() {
            return Err(DataError::RowOutOfBounds {
                row: start_row,
                n_rows: column.len(),
            });
        }
        Ok(DenseBinIterator {
            feature,
            column,
            position: start_row,
        })
    }

    fn inner_feature(&self, real_feature: usize) -> Option<usize> {
        self.inner_by_real.get(&real_feature).copied()
    }

    fn bin_mapper(&self, feature: usize) -> Result<&BinMapper, DataError> {
        self.check_feature(feature)?;
        Ok(&self.mappers[feature])
    }
}

/// Cursor over one column of a [`BinnedDataset`].
#[derive(Debug, Clone)]
pub struct DenseBinIterator<'a> {
    feature: usize,
    column: ArrayView1<'a, u32>,
    position: usize,
}

impl BinIterator for DenseBinIterator<'_> {
    #[inline]
    fn get(&mut self, row: usize) -> Result<u32, DataError> {
        if row < self.position {
            return Err(DataError::CursorRewind {
                feature: self.feature,
                position: self.position,
                row,
            });
        }
        let bin = *self.column.get(row).ok_or(DataError::RowOutOfBounds {
            row,
            n_rows: self.column.len(),
        })?;
        self.position = row;
        Ok(bin)
    }
}
