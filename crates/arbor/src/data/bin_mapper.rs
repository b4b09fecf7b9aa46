//! Mapping between real feature values and bin indices.

use crate::repr::decision::{threshold_to_mask, DecisionType, MAX_CATEGORIES};

use super::DataError;

/// How a single feature is discretized.
///
/// - Numerical: bin `b` holds values in `(upper_bounds[b-1], upper_bounds[b]]`.
///   The last bound is `+inf`, and NaN also falls into the last bin.
/// - Categorical: category `c` in `0..n_categories` maps to bin `c`; anything
///   else (negative, fractional, NaN, unseen) maps to the extra bin
///   `n_categories`.
#[derive(Clone, Debug, PartialEq)]
pub enum BinMapper {
    Numerical { upper_bounds: Box<[f64]> },
    Categorical { n_categories: u32 },
}

impl BinMapper {
    /// Numerical mapper from ascending bin upper bounds.
    ///
    /// A trailing `+inf` bound is appended if missing.
    pub fn numerical(mut upper_bounds: Vec<f64>) -> Self {
        if upper_bounds.last().map_or(true, |&b| b != f64::INFINITY) {
            upper_bounds.push(f64::INFINITY);
        }
        debug_assert!(
            upper_bounds.windows(2).all(|w| w[0] < w[1]),
            "bin upper bounds must be strictly ascending"
        );
        BinMapper::Numerical {
            upper_bounds: upper_bounds.into_boxed_slice(),
        }
    }

    /// Categorical mapper over categories `0..n_categories`.
    pub fn categorical(n_categories: u32) -> Self {
        BinMapper::Categorical { n_categories }
    }

    /// Numerical mapper with at most `max_bins` bins fitted to `values`.
    ///
    /// Bounds sit halfway between neighbouring distinct values, picked at
    /// evenly spaced ranks when there are more distinct values than bins.
    /// Non-finite values are ignored.
    pub fn from_values(values: &[f64], max_bins: usize) -> Self {
        let mut distinct: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();

        let max_bins = max_bins.max(1);
        let mut bounds = Vec::with_capacity(max_bins);
        if distinct.len() <= max_bins {
            bounds.extend(distinct.windows(2).map(|w| midpoint(w[0], w[1])));
        } else {
            for i in 1..max_bins {
                let idx = i * distinct.len() / max_bins;
                let bound = midpoint(distinct[idx - 1], distinct[idx]);
                if bounds.last().map_or(true, |&last| last < bound) {
                    bounds.push(bound);
                }
            }
        }
        Self::numerical(bounds)
    }

    /// Number of bins.
    pub fn n_bins(&self) -> u32 {
        match self {
            BinMapper::Numerical { upper_bounds } => upper_bounds.len() as u32,
            BinMapper::Categorical { n_categories } => n_categories + 1,
        }
    }

    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self, BinMapper::Categorical { .. })
    }

    /// Bin of a real value.
    #[inline]
    pub fn value_to_bin(&self, value: f64) -> u32 {
        match self {
            BinMapper::Numerical { upper_bounds } => {
                if value.is_nan() {
                    return upper_bounds.len() as u32 - 1;
                }
                let bin = upper_bounds.partition_point(|&bound| bound < value);
                bin.min(upper_bounds.len() - 1) as u32
            }
            BinMapper::Categorical { n_categories } => {
                match crate::repr::decision::float_to_category(value) {
                    Some(category) if category < *n_categories => category,
                    _ => *n_categories,
                }
            }
        }
    }

    /// Upper bound of a numerical bin.
    ///
    /// This is the real threshold that routes exactly like a numerical split
    /// at `bin`. For categorical features this is the category id itself.
    pub fn bin_upper_bound(&self, bin: u32) -> f64 {
        match self {
            BinMapper::Numerical { upper_bounds } => upper_bounds
                .get(bin as usize)
                .copied()
                .unwrap_or(f64::INFINITY),
            BinMapper::Categorical { .. } => bin as f64,
        }
    }

    /// Bin-space threshold for a real-space split on this feature.
    ///
    /// Numerical thresholds map to the bin that contains them, so every value
    /// `<= threshold` lands in a bin `<= result`. Categorical thresholds are
    /// category masks and are carried over unchanged, since categories map to
    /// bins one to one. A mask naming a category past `n_categories` is
    /// rejected, as that bit would also select the shared unknown bin.
    pub fn threshold_to_bin(
        &self,
        feature: usize,
        decision_type: DecisionType,
        threshold: f64,
    ) -> Result<u32, DataError> {
        let invalid = |reason| DataError::InvalidThreshold {
            feature,
            threshold,
            reason,
        };
        match (decision_type, self) {
            (DecisionType::Numerical, BinMapper::Numerical { .. }) => {
                if threshold.is_nan() {
                    return Err(invalid("threshold is NaN"));
                }
                Ok(self.value_to_bin(threshold))
            }
            (DecisionType::Categorical, BinMapper::Categorical { n_categories }) => {
                let mask = threshold_to_mask(threshold).ok_or(invalid("not a 32-bit category mask"))?;
                if *n_categories < MAX_CATEGORIES && mask >> *n_categories != 0 {
                    return Err(invalid("mask holds categories the feature does not have"));
                }
                Ok(mask)
            }
            (DecisionType::Numerical, BinMapper::Categorical { .. }) => {
                Err(invalid("numerical split on a categorical feature"))
            }
            (DecisionType::Categorical, BinMapper::Numerical { .. }) => {
                Err(invalid("categorical split on a numerical feature"))
            }
        }
    }
}

#[inline]
fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numerical_bins_are_upper_inclusive() {
        let mapper = BinMapper::numerical(vec![1.0, 2.0, 3.0]);
        assert_eq!(mapper.n_bins(), 4);
        assert_eq!(mapper.value_to_bin(-5.0), 0);
        assert_eq!(mapper.value_to_bin(1.0), 0);
        assert_eq!(mapper.value_to_bin(1.5), 1);
        assert_eq!(mapper.value_to_bin(2.0), 1);
        assert_eq!(mapper.value_to_bin(3.0), 2);
        assert_eq!(mapper.value_to_bin(100.0), 3);
        assert_eq!(mapper.value_to_bin(f64::NAN), 3);
    }

    #[test]
    fn trailing_infinity_is_not_duplicated() {
        let mapper = BinMapper::numerical(vec![0.0, f64::INFINITY]);
        assert_eq!(mapper.n_bins(), 2);
    }

    #[test]
    fn categorical_unknowns_share_a_bin() {
        let mapper = BinMapper::categorical(4);
        assert_eq!(mapper.n_bins(), 5);
        assert_eq!(mapper.value_to_bin(0.0), 0);
        assert_eq!(mapper.value_to_bin(3.0), 3);
        assert_eq!(mapper.value_to_bin(4.0), 4);
        assert_eq!(mapper.value_to_bin(-1.0), 4);
        assert_eq!(mapper.value_to_bin(1.5), 4);
        assert_eq!(mapper.value_to_bin(f64::NAN), 4);
    }

    #[test]
    fn from_values_small_cardinality() {
        let mapper = BinMapper::from_values(&[3.0, 1.0, 2.0, 2.0, f64::NAN], 16);
        assert_eq!(
            mapper,
            BinMapper::Numerical {
                upper_bounds: vec![1.5, 2.5, f64::INFINITY].into_boxed_slice()
            }
        );
    }

    #[test]
    fn from_values_caps_bins() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let mapper = BinMapper::from_values(&values, 8);
        assert_eq!(mapper.n_bins(), 8);
        // Every value lands in a valid bin and bins are monotone in the value.
        let bins: Vec<u32> = values.iter().map(|&v| mapper.value_to_bin(v)).collect();
        assert!(bins.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*bins.last().unwrap(), 7);
    }

    #[test]
    fn upper_bound_routes_like_its_bin() {
        let mapper = BinMapper::numerical(vec![1.0, 2.0, 3.0]);
        let bin = 1;
        let threshold = mapper.bin_upper_bound(bin);
        for v in [0.5, 1.0, 1.2, 2.0, 2.2, 3.5] {
            let raw_left = v <= threshold;
            let bin_left = mapper.value_to_bin(v) <= bin;
            assert_eq!(raw_left, bin_left, "value {v}");
        }
        assert_eq!(
            mapper.threshold_to_bin(0, DecisionType::Numerical, threshold),
            Ok(bin)
        );
    }

    #[test]
    fn threshold_kind_must_match_feature_kind() {
        let num = BinMapper::numerical(vec![1.0]);
        let cat = BinMapper::categorical(3);
        assert!(num.threshold_to_bin(0, DecisionType::Categorical, 2.0).is_err());
        assert!(cat.threshold_to_bin(0, DecisionType::Numerical, 2.0).is_err());
        assert!(num.threshold_to_bin(0, DecisionType::Numerical, f64::NAN).is_err());
        assert_eq!(cat.threshold_to_bin(0, DecisionType::Categorical, 5.0), Ok(5));
        assert!(cat.threshold_to_bin(0, DecisionType::Categorical, 0.5).is_err());
    }

    #[test]
    fn categorical_mask_must_fit_the_feature() {
        let cat = BinMapper::categorical(3);
        assert_eq!(
            cat.threshold_to_bin(1, DecisionType::Categorical, 8.0),
            Err(DataError::InvalidThreshold {
                feature: 1,
                threshold: 8.0,
                reason: "mask holds categories the feature does not have",
            })
        );
        assert_eq!(cat.threshold_to_bin(1, DecisionType::Categorical, 7.0), Ok(7));

        let wide = BinMapper::categorical(MAX_CATEGORIES);
        assert_eq!(
            wide.threshold_to_bin(0, DecisionType::Categorical, u32::MAX as f64),
            Ok(u32::MAX)
        );
    }
}
