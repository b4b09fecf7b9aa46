//! Line-oriented `key=value` tree format.
//!
//! A tree is written as:
//!
//! ```text
//! num_leaves=3
//! split_feature=3 0
//! split_gain=12.5 0.75
//! threshold=1.5 0.25
//! decision_type=0 0
//! left_child=-1 -2
//! right_child=1 -3
//! leaf_parent=0 1 1
//! leaf_value=-0.2 0.1 0.7
//! leaf_count=10 3 2
//! internal_value=0 0.4
//! internal_count=15 5
//!
//! ```
//!
//! Internal-node arrays hold `num_leaves - 1` values, leaf arrays hold
//! `num_leaves`. Feature ids and thresholds are real-space, so a parsed tree
//! must be bound before binned scoring (see [`Tree::bind_bins`]). Floats use
//! the shortest representation that parses back to the same value.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::repr::tree::{LeafArrays, NodeArrays};
use crate::repr::{DecisionType, Tree, TreeValidationError};

// =============================================================================
// Error types
// =============================================================================

/// Error type for tree text parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("array size mismatch for {field}: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid tree structure: {0}")]
    InvalidTree(#[from] TreeValidationError),
}

/// Keys every tree fragment must carry, in emission order.
const REQUIRED_FIELDS: [&str; 12] = [
    "num_leaves",
    "split_feature",
    "split_gain",
    "threshold",
    "decision_type",
    "left_child",
    "right_child",
    "leaf_parent",
    "leaf_value",
    "leaf_count",
    "internal_value",
    "internal_count",
];

// =============================================================================
// Writing
// =============================================================================

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "num_leaves={}", self.num_leaves())?;
        write_array(f, "split_feature", self.split_features_real())?;
        write_array(f, "split_gain", self.split_gains())?;
        write_array(f, "threshold", self.thresholds())?;
        let codes: Vec<i8> = self.decision_types().iter().map(|d| d.code()).collect();
        write_array(f, "decision_type", &codes)?;
        write_array(f, "left_child", self.raw_left_children())?;
        write_array(f, "right_child", self.raw_right_children())?;
        write_array(f, "leaf_parent", self.raw_leaf_parents())?;
        write_array(f, "leaf_value", self.leaf_values())?;
        write_array(f, "leaf_count", self.leaf_counts())?;
        write_array(f, "internal_value", self.internal_values())?;
        write_array(f, "internal_count", self.internal_counts())?;
        writeln!(f)
    }
}

fn write_array<T: fmt::Display>(f: &mut fmt::Formatter<'_>, key: &str, values: &[T]) -> fmt::Result {
    write!(f, "{key}=")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{value}")?;
    }
    writeln!(f)
}

// =============================================================================
// Tree text API
// =============================================================================

impl Tree {
    /// Render the tree in the text format, including the trailing blank line.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Parse a tree from the text format.
    ///
    /// Lines without `=` and unknown keys are ignored. A key with an empty
    /// value (the node arrays of a one-leaf tree) counts as present.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if a required key is missing, a token does not
    /// parse, an array has the wrong length, or the arrays do not describe a
    /// valid tree.
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        match parse_tree(text) {
            Ok(tree) => {
                debug!(num_leaves = tree.num_leaves(), "parsed tree");
                Ok(tree)
            }
            Err(err) => {
                warn!(%err, "failed to parse tree");
                Err(err)
            }
        }
    }

    /// Write the text format to a file.
    pub fn save_text(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    /// Read a tree from a file in the text format.
    pub fn load_text(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_text(&content)
    }
}

impl FromStr for Tree {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_tree(text: &str) -> Result<Tree, ParseError> {
    let kv: HashMap<&str, &str> = text
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();

    let field = |key: &'static str| kv.get(key).copied().ok_or(ParseError::MissingField(key));
    for key in REQUIRED_FIELDS {
        field(key)?;
    }

    let num_leaves: usize = parse_scalar("num_leaves", field("num_leaves")?)?;
    if num_leaves == 0 {
        return Err(ParseError::InvalidValue {
            field: "num_leaves",
            message: "a tree has at least one leaf".to_string(),
        });
    }
    let n_nodes = num_leaves - 1;

    let decision_type = parse_array::<i8>("decision_type", field("decision_type")?, n_nodes)?
        .into_iter()
        .map(|code| {
            DecisionType::from_code(code).ok_or_else(|| ParseError::InvalidValue {
                field: "decision_type",
                message: format!("unknown decision type code: {code}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let nodes = NodeArrays {
        split_feature_real: parse_array("split_feature", field("split_feature")?, n_nodes)?,
        split_gain: parse_array("split_gain", field("split_gain")?, n_nodes)?,
        threshold: parse_array("threshold", field("threshold")?, n_nodes)?,
        decision_type,
        left_child: parse_array("left_child", field("left_child")?, n_nodes)?,
        right_child: parse_array("right_child", field("right_child")?, n_nodes)?,
        internal_value: parse_array("internal_value", field("internal_value")?, n_nodes)?,
        internal_count: parse_array("internal_count", field("internal_count")?, n_nodes)?,
    };
    let leaves = LeafArrays {
        leaf_parent: parse_array("leaf_parent", field("leaf_parent")?, num_leaves)?,
        leaf_value: parse_array("leaf_value", field("leaf_value")?, num_leaves)?,
        leaf_count: parse_array("leaf_count", field("leaf_count")?, num_leaves)?,
    };

    Ok(Tree::from_arrays(num_leaves, nodes, leaves)?)
}

fn parse_scalar<T: FromStr>(field: &'static str, s: &str) -> Result<T, ParseError> {
    let s = s.trim();
    s.parse().map_err(|_| ParseError::InvalidValue {
        field,
        message: format!("invalid {}: {s}", std::any::type_name::<T>()),
    })
}

fn parse_array<T: FromStr>(field: &'static str, s: &str, expected: usize) -> Result<Vec<T>, ParseError> {
    let values = s
        .split_whitespace()
        .map(|v| parse_scalar(field, v))
        .collect::<Result<Vec<T>, _>>()?;
    validate_array_size(field, &values, expected)?;
    Ok(values)
}

fn validate_array_size<T>(field: &'static str, arr: &[T], expected: usize) -> Result<(), ParseError> {
    if arr.len() != expected {
        return Err(ParseError::ArraySizeMismatch {
            field,
            expected,
            actual: arr.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{Child, LeafId, NodeId, SplitInfo};

    const STUMP: &str = "num_leaves=2
split_feature=3
split_gain=4.5
threshold=1.5
decision_type=0
left_child=-1
right_child=-2
leaf_parent=0 0
leaf_value=-0.2 0.7
leaf_count=10 5
internal_value=0
internal_count=15

";

    #[test]
    fn parse_stump() {
        let tree = Tree::from_text(STUMP).unwrap();
        let root = NodeId::ROOT;
        assert_eq!(tree.num_leaves(), 2);
        assert!(!tree.is_bound());
        assert_eq!(tree.split_feature_real(root), 3);
        assert_eq!(tree.split_feature(root), 3);
        assert_eq!(tree.threshold(root), 1.5);
        assert_eq!(tree.split_gain(root), 4.5);
        assert_eq!(tree.left_child(root), Child::Leaf(LeafId(0)));
        assert_eq!(tree.right_child(root), Child::Leaf(LeafId(1)));
        assert_eq!(tree.leaf_value(LeafId(1)), 0.7);
        assert_eq!(tree.leaf_count(LeafId(0)), 10);
        assert_eq!(tree.internal_count(root), 15);
        assert_eq!(tree.leaf_depth(LeafId(0)), 2);
    }

    #[test]
    fn write_matches_format() {
        let mut tree = Tree::new(2);
        tree.split(
            LeafId::ROOT,
            SplitInfo::numerical(0, 4, 1.5)
                .with_real_feature(3)
                .with_outputs((-0.2, 10), (0.7, 5))
                .with_gain(4.5),
        )
        .unwrap();
        assert_eq!(tree.to_text(), STUMP);
        assert_eq!(format!("{tree}"), STUMP);
    }

    #[test]
    fn single_leaf_has_empty_node_arrays() {
        let mut tree = Tree::new(1);
        tree.set_leaf_value(LeafId::ROOT, 0.125);
        let text = tree.to_text();
        assert!(text.contains("\nsplit_feature=\n"));
        assert!(text.contains("\nleaf_parent=-1\n"));

        let parsed: Tree = text.parse().unwrap();
        assert_eq!(parsed.num_nodes(), 0);
        assert_eq!(parsed.leaf_value(LeafId::ROOT), 0.125);
        assert!(parsed.is_bound());
        assert_eq!(parsed.to_text(), text);
    }

    #[test]
    fn missing_field() {
        let text = STUMP.replace("internal_count=15\n", "");
        let err = Tree::from_text(&text).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("internal_count")));
    }

    #[test]
    fn wrong_token_count() {
        let text = STUMP.replace("leaf_value=-0.2 0.7", "leaf_value=-0.2");
        let err = Tree::from_text(&text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ArraySizeMismatch {
                field: "leaf_value",
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn bad_token() {
        let text = STUMP.replace("threshold=1.5", "threshold=abc");
        let err = Tree::from_text(&text).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { field: "threshold", .. }));

        let text = STUMP.replace("decision_type=0", "decision_type=7");
        let err = Tree::from_text(&text).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { field: "decision_type", .. }));
    }

    #[test]
    fn zero_leaves_rejected() {
        let text = STUMP.replace("num_leaves=2", "num_leaves=0");
        assert!(matches!(
            Tree::from_text(&text),
            Err(ParseError::InvalidValue { field: "num_leaves", .. })
        ));
    }

    #[test]
    fn inconsistent_structure_rejected() {
        let text = STUMP.replace("right_child=-2", "right_child=-1");
        let err = Tree::from_text(&text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidTree(TreeValidationError::DuplicateChild { .. })
        ));

        let text = STUMP.replace("leaf_parent=0 0", "leaf_parent=0 -1");
        let err = Tree::from_text(&text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidTree(TreeValidationError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn extra_lines_are_ignored() {
        let text = format!("Tree=0\n{STUMP}shrinkage=1\n");
        let tree = Tree::from_text(&text).unwrap();
        assert_eq!(tree.to_text(), STUMP);
    }

    #[test]
    fn windows_line_endings() {
        let text = STUMP.replace('\n', "\r\n");
        let tree = Tree::from_text(&text).unwrap();
        assert_eq!(tree.to_text(), STUMP);
    }
    #[test]
    fn padded_keys_and_values() {
        let text = STUMP
            .replace("num_leaves=2", " num_leaves = 2")
            .replace("threshold=1.5", "threshold\t= 1.5 ");
        let tree = Tree::from_text(&text).unwrap();
        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(tree.to_text(), STUMP);
    }
}
