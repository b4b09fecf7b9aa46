//! Typed indices for the two address spaces of a tree.
//!
//! Internal nodes and leaves are numbered independently, both starting at 0.
//! [`NodeId`] and [`LeafId`] keep the two spaces apart at compile time, and
//! [`Child`] is the tagged form of a child reference.
//!
//! # Packed encoding
//!
//! Child references are stored as a single `i32`, the same layout the text
//! format uses:
//!
//! ```text
//!  raw >= 0   ->  Child::Node(NodeId(raw))
//!  raw <  0   ->  Child::Leaf(LeafId(!raw))     (!0 == -1, !1 == -2, ...)
//! ```
//!
//! Only [`Child::to_raw`] and [`Child::from_raw`] perform the complement.

use std::fmt;

/// Index of an internal (split) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Index of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafId(pub u32);

impl NodeId {
    /// The root split of any tree with at least two leaves.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl LeafId {
    /// The single leaf of an unsplit tree.
    pub const ROOT: LeafId = LeafId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf {}", self.0)
    }
}

/// A child reference: either another split node or a terminal leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Child {
    Node(NodeId),
    Leaf(LeafId),
}

impl Child {
    /// Decode a packed child reference.
    #[inline]
    pub fn from_raw(raw: i32) -> Self {
        if raw >= 0 {
            Child::Node(NodeId(raw as u32))
        } else {
            Child::Leaf(LeafId(!raw as u32))
        }
    }

    /// Encode into the packed representation.
    #[inline]
    pub fn to_raw(self) -> i32 {
        match self {
            Child::Node(node) => node.0 as i32,
            Child::Leaf(leaf) => !(leaf.0 as i32),
        }
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        matches!(self, Child::Leaf(_))
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Node(node) => node.fmt(f),
            Child::Leaf(leaf) => leaf.fmt(f),
        }
    }
}

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Child::Node(node)
    }
}

impl From<LeafId> for Child {
    fn from(leaf: LeafId) -> Self {
        Child::Leaf(leaf)
    }
}
