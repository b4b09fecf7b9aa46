//! Nested JSON export.
//!
//! The tree is first walked into [`TreeJson`], a plain serde document, and
//! then rendered with `serde_json`. There is no JSON reader: the text format
//! is the lossless one.
//!
//! ```text
//! {
//!   "num_leaves": 2,
//!   "tree_structure": {
//!     "split_index": 0, "split_feature": 3, ..., "decision_type": "<=",
//!     "left_child":  { "leaf_index": 0, "leaf_parent": 0, ... },
//!     "right_child": { "leaf_index": 1, "leaf_parent": 0, ... }
//!   }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::repr::{Child, LeafId, NodeId, Tree};

/// Errors from rendering or writing the JSON export.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Rendering options for the JSON export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonWriteOptions {
    /// Indent the output.
    pub pretty: bool,
}

impl JsonWriteOptions {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

/// Root of the JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeJson {
    pub num_leaves: usize,
    pub tree_structure: NodeJson,
}

/// A node of the nested structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeJson {
    Internal(InternalNodeJson),
    Leaf(LeafJson),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalNodeJson {
    pub split_index: u32,
    pub split_feature: u32,
    pub split_gain: f32,
    pub threshold: f64,
    /// `"<="` or `"in"`.
    pub decision_type: String,
    pub internal_value: f64,
    pub internal_count: u32,
    pub left_child: Box<NodeJson>,
    pub right_child: Box<NodeJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafJson {
    pub leaf_index: u32,
    /// Parent node id, `-1` for the root leaf of an unsplit tree.
    pub leaf_parent: i64,
    pub leaf_value: f64,
    pub leaf_count: u32,
}

impl Tree {
    /// Build the JSON document for this tree.
    pub fn to_json_value(&self) -> TreeJson {
        TreeJson {
            num_leaves: self.num_leaves(),
            tree_structure: self.node_json(self.root()),
        }
    }

    /// Render the JSON document.
    pub fn to_json_string(&self, options: JsonWriteOptions) -> Result<String, JsonError> {
        let doc = self.to_json_value();
        let rendered = if options.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(rendered)
    }

    /// Write the JSON document to a file.
    pub fn save_json(&self, path: impl AsRef<Path>, options: JsonWriteOptions) -> Result<(), JsonError> {
        std::fs::write(path, self.to_json_string(options)?)?;
        Ok(())
    }

    fn node_json(&self, child: Child) -> NodeJson {
        match child {
            Child::Leaf(leaf) => NodeJson::Leaf(self.leaf_json(leaf)),
            Child::Node(node) => NodeJson::Internal(self.internal_json(node)),
        }
    }

    fn internal_json(&self, node: NodeId) -> InternalNodeJson {
        InternalNodeJson {
            split_index: node.0,
            split_feature: self.split_feature_real(node),
            split_gain: self.split_gain(node),
            threshold: self.threshold(node),
            decision_type: self.decision_type(node).name().to_string(),
            internal_value: self.internal_value(node),
            internal_count: self.internal_count(node),
            left_child: Box::new(self.node_json(self.left_child(node))),
            right_child: Box::new(self.node_json(self.right_child(node))),
        }
    }

    fn leaf_json(&self, leaf: LeafId) -> LeafJson {
        LeafJson {
            leaf_index: leaf.0,
            leaf_parent: self.leaf_parent(leaf).map_or(-1, |p| i64::from(p.0)),
            leaf_value: self.leaf_value(leaf),
            leaf_count: self.leaf_count(leaf),
        }
    }
}
