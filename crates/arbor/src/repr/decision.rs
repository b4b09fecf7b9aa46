//! Split decision kinds and their routing predicates.
//!
//! # Decision Rule
//!
//! Both kinds route a sample **left** when their predicate holds:
//!
//! - [`DecisionType::Numerical`]: `value <= threshold` goes left,
//!   `value > threshold` goes right. The same operator is applied to bin
//!   indices during training and to real values during inference.
//! - [`DecisionType::Categorical`]: the threshold is a 32-bit category set.
//!   A category that is a member goes left, anything else goes right.
//!
//! A NaN real value fails both predicates and therefore goes right.
//!
//! # Category sets
//!
//! Bit `c` of the mask stands for category `c`, so only categories `0..32`
//! can be members:
//!
//! ```text
//! mask: [cat 31] [cat 30] ... [cat 1] [cat 0]   (LSB = cat 0)
//! ```
//!
//! In bin space the mask is a `u32`. In real space (and in the text format)
//! it is the same mask stored as an integral `f64`, which is exact since
//! `u32::MAX < 2^53`.

use std::fmt;

/// Number of categories a categorical split can address.
pub const MAX_CATEGORIES: u32 = u32::BITS;

/// The kind of test an internal node applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum DecisionType {
    /// Ordered threshold test.
    #[default]
    Numerical = 0,
    /// Category set membership test.
    Categorical = 1,
}

impl DecisionType {
    /// Routing for a binned value.
    #[inline]
    pub fn goes_right_bin(self, bin: u32, threshold_bin: u32) -> bool {
        match self {
            DecisionType::Numerical => bin > threshold_bin,
            DecisionType::Categorical => !mask_contains(threshold_bin, bin),
        }
    }

    /// Routing for a real value.
    #[inline]
    pub fn goes_right(self, value: f64, threshold: f64) -> bool {
        match self {
            DecisionType::Numerical => value > threshold || value.is_nan(),
            DecisionType::Categorical => match (float_to_category(value), threshold_to_mask(threshold)) {
                (Some(category), Some(mask)) => !mask_contains(mask, category),
                _ => true,
            },
        }
    }

    /// Human-readable name, as emitted in the JSON export.
    pub fn name(self) -> &'static str {
        match self {
            DecisionType::Numerical => "<=",
            DecisionType::Categorical => "in",
        }
    }

    /// Integer code used by the text format.
    #[inline]
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Parse an integer code from the text format.
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(DecisionType::Numerical),
            1 => Some(DecisionType::Categorical),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn mask_contains(mask: u32, category: u32) -> bool {
    category < MAX_CATEGORIES && (mask >> category) & 1 != 0
}

/// Convert a real feature value to a category id.
///
/// Returns `None` for NaN, negative, or non-integral values.
#[inline]
pub fn float_to_category(value: f64) -> Option<u32> {
    if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Decode a real-space threshold into a category mask.
///
/// Returns `None` if the value is not an integral number in `u32` range.
#[inline]
pub fn threshold_to_mask(threshold: f64) -> Option<u32> {
    float_to_category(threshold)
}

/// Encode a category mask as a real-space threshold.
#[inline]
pub fn mask_to_threshold(mask: u32) -> f64 {
    mask as f64
}

/// Build a category mask from category ids.
///
/// Returns `None` if any category is `>= MAX_CATEGORIES`.
pub fn categories_to_mask(categories: &[u32]) -> Option<u32> {
    categories.iter().try_fold(0u32, |mask, &cat| {
        (cat < MAX_CATEGORIES).then(|| mask | (1u32 << cat))
    })
}
