//! Seeded random data and trees for tests and property checks.

use ndarray::{Array2, ArrayView2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{BinMapper, BinnedData, BinnedDataset};
use crate::repr::decision::MAX_CATEGORIES;
use crate::repr::{LeafId, SplitInfo, Tree};

/// Random raw matrix (`[rows, cols]`), values uniform in `[min, max)`.
///
/// About `nan_fraction` of the cells are NaN.
pub fn random_features(rows: usize, cols: usize, seed: u64, min: f64, max: f64, nan_fraction: f64) -> Array2<f64> {
    assert!(max >= min);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let width = max - min;
    Array2::from_shape_simple_fn((rows, cols), || {
        if rng.r#gen::<f64>() < nan_fraction {
            f64::NAN
        } else {
            min + rng.r#gen::<f64>() * width
        }
    })
}

/// Random categorical column values in `0..n_categories`, plus the odd
/// out-of-range or negative value.
pub fn random_categories(rows: usize, n_categories: u32, seed: u64) -> Vec<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..rows)
        .map(|_| match rng.gen_range(0..20) {
            0 => -1.0,
            1 => f64::from(n_categories + 1),
            _ => f64::from(rng.gen_range(0..n_categories.max(1))),
        })
        .collect()
}

/// Bin every column of `raw` numerically with at most `max_bins` bins.
pub fn binned_dataset(raw: ArrayView2<'_, f64>, max_bins: usize) -> BinnedDataset {
    BinnedDataset::fit(raw, max_bins)
}

/// Grow a random tree on `data` with up to `max_leaves` leaves.
///
/// Numerical thresholds are the upper bound of the chosen bin, and
/// categorical masks only hold categories the feature has, so binned and raw
/// traversal agree on every row of the data.
pub fn random_tree(data: &BinnedDataset, max_leaves: usize, seed: u64) -> Tree {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut tree = Tree::new(max_leaves);
    tree.set_leaf_value(LeafId::ROOT, rng.gen_range(-1.0..1.0));

    let splittable: Vec<usize> = (0..data.n_features())
        .filter(|&f| data.bin_mapper(f).is_ok_and(|m| m.n_bins() >= 2))
        .collect();
    if splittable.is_empty() {
        return tree;
    }

    while tree.num_leaves() < tree.max_leaves() {
        let leaf = LeafId(rng.gen_range(0..tree.num_leaves() as u32));
        let feature = splittable[rng.gen_range(0..splittable.len())];
        let Ok(mapper) = data.bin_mapper(feature) else {
            break;
        };
        let real = data.real_feature(feature).unwrap_or(feature) as u32;

        let info = match mapper {
            BinMapper::Numerical { .. } => {
                let bin = rng.gen_range(0..mapper.n_bins() - 1);
                SplitInfo::numerical(feature as u32, bin, mapper.bin_upper_bound(bin))
            }
            BinMapper::Categorical { n_categories } => {
                let known = if *n_categories >= MAX_CATEGORIES {
                    u32::MAX
                } else {
                    (1u32 << *n_categories) - 1
                };
                SplitInfo::categorical(feature as u32, rng.r#gen::<u32>() & known)
            }
        };
        let left = (rng.gen_range(-1.0..1.0), rng.gen_range(1..100));
        let right = (rng.gen_range(-1.0..1.0), rng.gen_range(1..100));
        let info = info
            .with_real_feature(real)
            .with_outputs(left, right)
            .with_gain(rng.r#gen::<f32>() * 10.0);

        if tree.split(leaf, info).is_err() {
            break;
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tree_is_valid_and_full() {
        let raw = random_features(50, 4, 7, -5.0, 5.0, 0.1);
        let data = binned_dataset(raw.view(), 16);
        let tree = random_tree(&data, 12, 3);
        assert_eq!(tree.num_leaves(), 12);
        tree.validate().unwrap();
    }

    #[test]
    fn constant_data_gives_a_single_leaf() {
        let raw = Array2::from_elem((5, 2), 1.0);
        let data = binned_dataset(raw.view(), 16);
        let tree = random_tree(&data, 8, 0);
        assert_eq!(tree.num_leaves(), 1);
    }

    #[test]
    fn seeds_are_deterministic() {
        let a = random_features(10, 3, 42, 0.0, 1.0, 0.2);
        let b = random_features(10, 3, 42, 0.0, 1.0, 0.2);
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
        assert_eq!(random_categories(20, 5, 1), random_categories(20, 5, 1));
    }
}
