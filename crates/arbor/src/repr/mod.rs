//! Tree representation: typed ids, decision kinds and the tree store.

pub mod decision;
pub mod ids;
pub mod tree;

pub use decision::DecisionType;
pub use ids::{Child, LeafId, NodeId};
pub use tree::{SplitInfo, Tree, TreeError, TreeValidationError};
