//! arbor: a single regression tree of a gradient-boosted ensemble.
//!
//! Trees are grown one split at a time into flat, pre-sized arrays, scored
//! against binned training data or raw feature rows, and stored in a
//! line-oriented text format that round-trips exactly.
//!
//! # Key Types
//!
//! - [`Tree`] - Node/leaf store, grown with [`Tree::split`]
//! - [`SplitInfo`] - A split decided by the trainer
//! - [`DecisionType`] - Numerical threshold or categorical set test
//! - [`BinnedData`] / [`SampleAccessor`] - Binned and raw feature access
//! - [`TreeConfig`] - Capacity and threading
//!
//! # Example
//!
//! ```
//! use arbor::{LeafId, SplitInfo, Tree};
//!
//! let mut tree = Tree::new(4);
//! let right = tree
//!     .split(LeafId::ROOT, SplitInfo::numerical(3, 0, 1.5).with_outputs((-0.2, 10), (0.7, 5)))
//!     .unwrap();
//! assert_eq!(right, LeafId(1));
//!
//! let mut row = [0.0; 4];
//! row[3] = 1.0;
//! assert_eq!(tree.predict(&row), -0.2);
//!
//! let parsed = Tree::from_text(&tree.to_text()).unwrap();
//! row[3] = 2.0;
//! assert_eq!(parsed.predict(&row), 0.7);
//! ```

pub mod config;
pub mod data;
pub mod io;
pub mod predict;
pub mod repr;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use repr::{Child, DecisionType, LeafId, NodeId, SplitInfo, Tree, TreeError, TreeValidationError};

pub use config::{ConfigError, TreeConfig};

pub use data::{BinIterator, BinMapper, BinnedData, BinnedDataset, DataError, SampleAccessor};

pub use io::{JsonError, JsonWriteOptions, ParseError, TreeJson};

pub use predict::{FeatureCursors, PredictError};

pub use utils::{run_with_threads, Parallelism};
