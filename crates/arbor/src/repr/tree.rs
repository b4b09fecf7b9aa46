//! Growable decision tree with flat, pre-sized storage.
//!
//! This module provides:
//! - [`Tree`]: SoA storage for internal nodes and leaves, grown by [`Tree::split`]
//! - [`SplitInfo`]: everything the trainer decided about one split
//! - [`TreeError`] / [`TreeValidationError`]: mutation and structural errors
//!
//! # Layout
//!
//! Internal-node arrays hold `max_leaves - 1` slots and leaf arrays hold
//! `max_leaves` slots. Both are allocated once; a split fills exactly one new
//! node slot and one new leaf slot:
//!
//! ```text
//! before split(leaf 1):        after (returns leaf 2):
//!
//!        node 0                       node 0
//!       /      \                     /      \
//!   leaf 0    leaf 1             leaf 0    node 1
//!                                          /     \
//!                                      leaf 1   leaf 2
//! ```
//!
//! The split leaf keeps its id and becomes the left child; the new leaf is
//! always the right child.

use tracing::debug;

use crate::data::{BinnedData, DataError};

use super::decision::DecisionType;
use super::ids::{Child, LeafId, NodeId};

// ============================================================================
// Errors
// ============================================================================

/// Errors from growing a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The tree already holds `max_leaves` leaves.
    #[error("cannot split: tree is at capacity ({max_leaves} leaves)")]
    CapacityExceeded { max_leaves: usize },
    /// The leaf to split does not exist yet.
    #[error("cannot split {leaf}: tree has {num_leaves} leaves")]
    InvalidLeaf { leaf: LeafId, num_leaves: usize },
}

/// Structural invariant violations found by [`Tree::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no leaves")]
    Empty,
    #[error("{num_leaves} leaves exceed capacity {max_leaves}")]
    OverCapacity { num_leaves: usize, max_leaves: usize },
    #[error("{node} has {side} child {child:?} outside the tree")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: Child,
    },
    #[error("{node} is referenced as a child by {parent}, which does not precede it")]
    ChildNotAfterParent { node: NodeId, parent: NodeId },
    #[error("{child:?} is reachable more than once")]
    DuplicateChild { child: Child },
    #[error("{leaf} records parent {recorded:?} but hangs under {actual:?}")]
    ParentMismatch {
        leaf: LeafId,
        recorded: Option<NodeId>,
        actual: Option<NodeId>,
    },
    #[error("{0} is unreachable from the root")]
    Unreachable(Child),
}

// ============================================================================
// SplitInfo
// ============================================================================

/// A split decided by the trainer, ready to be applied to a leaf.
///
/// `feature` and `threshold_bin` live in the binned space of the training
/// dataset; `real_feature` and `threshold` are the same decision expressed
/// over raw feature values. For numerical splits the real threshold should be
/// the upper bound of `threshold_bin`, so both spaces route every row the
/// binning keeps distinct the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitInfo {
    pub feature: u32,
    pub decision_type: DecisionType,
    pub threshold_bin: u32,
    pub real_feature: u32,
    pub threshold: f64,
    pub left_value: f64,
    pub right_value: f64,
    pub left_count: u32,
    pub right_count: u32,
    pub gain: f32,
}

impl SplitInfo {
    /// Numerical split with identical binned and real feature ids.
    pub fn numerical(feature: u32, threshold_bin: u32, threshold: f64) -> Self {
        Self {
            feature,
            decision_type: DecisionType::Numerical,
            threshold_bin,
            real_feature: feature,
            threshold,
            left_value: 0.0,
            right_value: 0.0,
            left_count: 0,
            right_count: 0,
            gain: 0.0,
        }
    }

    /// Categorical split on a category mask (see [`super::decision`]).
    pub fn categorical(feature: u32, mask: u32) -> Self {
        Self {
            decision_type: DecisionType::Categorical,
            threshold_bin: mask,
            threshold: super::decision::mask_to_threshold(mask),
            ..Self::numerical(feature, 0, 0.0)
        }
    }

    /// Set the real-space feature id.
    pub fn with_real_feature(mut self, real_feature: u32) -> Self {
        self.real_feature = real_feature;
        self
    }

    /// Set the output value and count of both children.
    pub fn with_outputs(mut self, left: (f64, u32), right: (f64, u32)) -> Self {
        (self.left_value, self.left_count) = left;
        (self.right_value, self.right_count) = right;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }
}

// ============================================================================
// Tree
// ============================================================================

/// A single regression tree, grown leaf by leaf.
///
/// Node ids range over `0..num_leaves - 1` and leaf ids over `0..num_leaves`;
/// the two spaces are independent (see [`super::ids`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    max_leaves: usize,
    num_leaves: usize,
    /// Whether `split_feature`/`threshold_in_bin` describe a binned dataset.
    bound: bool,

    // Internal nodes.
    left_child: Box<[i32]>,
    right_child: Box<[i32]>,
    split_feature: Box<[u32]>,
    split_feature_real: Box<[u32]>,
    threshold_in_bin: Box<[u32]>,
    threshold: Box<[f64]>,
    decision_type: Box<[DecisionType]>,
    split_gain: Box<[f32]>,
    internal_value: Box<[f64]>,
    internal_count: Box<[u32]>,

    // Leaves.
    leaf_parent: Box<[i32]>,
    leaf_value: Box<[f64]>,
    leaf_count: Box<[u32]>,
    leaf_depth: Box<[u32]>,
}

/// Raw internal-node arrays, each `num_leaves - 1` long.
#[derive(Debug, Default)]
pub(crate) struct NodeArrays {
    pub left_child: Vec<i32>,
    pub right_child: Vec<i32>,
    pub split_feature_real: Vec<u32>,
    pub threshold: Vec<f64>,
    pub decision_type: Vec<DecisionType>,
    pub split_gain: Vec<f32>,
    pub internal_value: Vec<f64>,
    pub internal_count: Vec<u32>,
}

/// Raw leaf arrays, each `num_leaves` long.
#[derive(Debug, Default)]
pub(crate) struct LeafArrays {
    pub leaf_parent: Vec<i32>,
    pub leaf_value: Vec<f64>,
    pub leaf_count: Vec<u32>,
}

impl Tree {
    /// Create a tree holding only the root leaf.
    ///
    /// Storage for `max_leaves` leaves is allocated up front. A `max_leaves`
    /// of 0 is treated as 1.
    pub fn new(max_leaves: usize) -> Self {
        let max_leaves = max_leaves.max(1);
        let n_nodes = max_leaves - 1;

        let mut leaf_parent = vec![0i32; max_leaves].into_boxed_slice();
        let mut leaf_depth = vec![0u32; max_leaves].into_boxed_slice();
        leaf_parent[0] = -1;
        leaf_depth[0] = 1;

        Self {
            max_leaves,
            num_leaves: 1,
            bound: true,
            left_child: vec![0; n_nodes].into_boxed_slice(),
            right_child: vec![0; n_nodes].into_boxed_slice(),
            split_feature: vec![0; n_nodes].into_boxed_slice(),
            split_feature_real: vec![0; n_nodes].into_boxed_slice(),
            threshold_in_bin: vec![0; n_nodes].into_boxed_slice(),
            threshold: vec![0.0; n_nodes].into_boxed_slice(),
            decision_type: vec![DecisionType::Numerical; n_nodes].into_boxed_slice(),
            split_gain: vec![0.0; n_nodes].into_boxed_slice(),
            internal_value: vec![0.0; n_nodes].into_boxed_slice(),
            internal_count: vec![0; n_nodes].into_boxed_slice(),
            leaf_parent,
            leaf_value: vec![0.0; max_leaves].into_boxed_slice(),
            leaf_count: vec![0; max_leaves].into_boxed_slice(),
            leaf_depth,
        }
    }

    /// Assemble a fully grown tree from raw arrays.
    ///
    /// Capacity equals the leaf count. The binned feature ids are set to the
    /// real ids and bin thresholds are left unset, so the tree is unbound
    /// until [`Tree::bind_bins`] runs. Array lengths are checked by the caller.
    pub(crate) fn from_arrays(
        num_leaves: usize,
        nodes: NodeArrays,
        leaves: LeafArrays,
    ) -> Result<Self, TreeValidationError> {
        if num_leaves == 0 {
            return Err(TreeValidationError::Empty);
        }
        let n_nodes = num_leaves - 1;
        debug_assert_eq!(nodes.left_child.len(), n_nodes);
        debug_assert_eq!(leaves.leaf_value.len(), num_leaves);

        let mut tree = Self {
            max_leaves: num_leaves,
            num_leaves,
            bound: n_nodes == 0,
            left_child: nodes.left_child.into_boxed_slice(),
            right_child: nodes.right_child.into_boxed_slice(),
            split_feature: nodes.split_feature_real.clone().into_boxed_slice(),
            split_feature_real: nodes.split_feature_real.into_boxed_slice(),
            threshold_in_bin: vec![0; n_nodes].into_boxed_slice(),
            threshold: nodes.threshold.into_boxed_slice(),
            decision_type: nodes.decision_type.into_boxed_slice(),
            split_gain: nodes.split_gain.into_boxed_slice(),
            internal_value: nodes.internal_value.into_boxed_slice(),
            internal_count: nodes.internal_count.into_boxed_slice(),
            leaf_parent: leaves.leaf_parent.into_boxed_slice(),
            leaf_value: leaves.leaf_value.into_boxed_slice(),
            leaf_count: leaves.leaf_count.into_boxed_slice(),
            leaf_depth: vec![0; num_leaves].into_boxed_slice(),
        };

        tree.validate()?;
        tree.recompute_depths();
        Ok(tree)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Split `leaf` into an internal node with two leaf children.
    ///
    /// `leaf` keeps its id and becomes the left child; the returned leaf is
    /// the new right child. The pre-split value of `leaf` is kept as the new
    /// node's internal value, and `left_count + right_count` as its internal
    /// count.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidLeaf`] if `leaf` does not exist and
    /// [`TreeError::CapacityExceeded`] if the tree is full. The tree is not
    /// modified on error.
    pub fn split(&mut self, leaf: LeafId, info: SplitInfo) -> Result<LeafId, TreeError> {
        if leaf.index() >= self.num_leaves {
            return Err(TreeError::InvalidLeaf {
                leaf,
                num_leaves: self.num_leaves,
            });
        }
        if self.num_leaves >= self.max_leaves {
            return Err(TreeError::CapacityExceeded {
                max_leaves: self.max_leaves,
            });
        }

        let node = NodeId((self.num_leaves - 1) as u32);
        let new_leaf = LeafId(self.num_leaves as u32);
        let n = node.index();
        let l = leaf.index();
        let r = new_leaf.index();

        // Re-point the parent from the leaf to the new node.
        if let Some(parent) = self.leaf_parent(leaf) {
            let p = parent.index();
            let as_leaf = Child::Leaf(leaf).to_raw();
            if self.left_child[p] == as_leaf {
                self.left_child[p] = Child::Node(node).to_raw();
            } else {
                self.right_child[p] = Child::Node(node).to_raw();
            }
        }

        self.split_feature[n] = info.feature;
        self.split_feature_real[n] = info.real_feature;
        self.threshold_in_bin[n] = info.threshold_bin;
        self.threshold[n] = info.threshold;
        self.decision_type[n] = info.decision_type;
        self.split_gain[n] = info.gain;
        self.left_child[n] = Child::Leaf(leaf).to_raw();
        self.right_child[n] = Child::Leaf(new_leaf).to_raw();

        self.internal_value[n] = self.leaf_value[l];
        self.internal_count[n] = info.left_count.saturating_add(info.right_count);

        self.leaf_value[l] = info.left_value;
        self.leaf_count[l] = info.left_count;
        self.leaf_value[r] = info.right_value;
        self.leaf_count[r] = info.right_count;
        self.leaf_parent[l] = node.0 as i32;
        self.leaf_parent[r] = node.0 as i32;

        self.leaf_depth[r] = self.leaf_depth[l] + 1;
        self.leaf_depth[l] += 1;

        self.num_leaves += 1;

        debug!(
            %leaf,
            %new_leaf,
            %node,
            feature = info.real_feature,
            threshold = info.threshold,
            gain = info.gain,
            "applied split"
        );
        Ok(new_leaf)
    }

    /// Set the output value of a leaf.
    ///
    /// The trainer uses this to assign the root value before the first split
    /// and to apply shrinkage after growth.
    ///
    /// # Panics
    ///
    /// Panics if `leaf` does not exist.
    pub fn set_leaf_value(&mut self, leaf: LeafId, value: f64) {
        assert!(leaf.index() < self.num_leaves, "{leaf} does not exist");
        self.leaf_value[leaf.index()] = value;
    }

    /// Map real feature ids and thresholds onto a binned dataset.
    ///
    /// Trees restored from text only carry real-space splits. Binding looks up
    /// each node's binned feature id and bin threshold so the tree can be
    /// scored against `data` with per-feature bin cursors.
    ///
    /// # Errors
    ///
    /// [`DataError::UnknownFeature`] if a split feature is not present in
    /// `data`, or the bin mapper's error if a threshold has no bin. The tree is
    /// not modified on error.
    pub fn bind_bins<D: BinnedData + ?Sized>(&mut self, data: &D) -> Result<(), DataError> {
        let n_nodes = self.num_nodes();
        let mut features = Vec::with_capacity(n_nodes);
        let mut bins = Vec::with_capacity(n_nodes);

        for n in 0..n_nodes {
            let real = self.split_feature_real[n] as usize;
            let inner = data
                .inner_feature(real)
                .ok_or(DataError::UnknownFeature { real_feature: real })?;
            let mapper = data.bin_mapper(inner)?;
            bins.push(mapper.threshold_to_bin(inner, self.decision_type[n], self.threshold[n])?);
            features.push(inner as u32);
        }

        self.split_feature[..n_nodes].copy_from_slice(&features);
        self.threshold_in_bin[..n_nodes].copy_from_slice(&bins);
        self.bound = true;
        debug!(n_nodes, "bound tree to binned dataset");
        Ok(())
    }

    // =========================================================================
    // Shape
    // =========================================================================

    /// Number of leaves.
    #[inline]
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Number of internal nodes (always `num_leaves - 1`).
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_leaves - 1
    }

    /// Leaf capacity fixed at construction.
    #[inline]
    pub fn max_leaves(&self) -> usize {
        self.max_leaves
    }

    /// Whether the tree can be scored against binned data.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Largest leaf depth (1 for an unsplit tree).
    pub fn max_depth(&self) -> u32 {
        self.leaf_depth[..self.num_leaves]
            .iter()
            .copied()
            .max()
            .unwrap_or(1)
    }

    /// Ids of all current internal nodes, in split order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeId> {
        (0..self.num_nodes() as u32).map(NodeId)
    }

    /// Ids of all current leaves, in creation order.
    pub fn leaves(&self) -> impl ExactSizeIterator<Item = LeafId> {
        (0..self.num_leaves as u32).map(LeafId)
    }

    /// Entry point of a traversal: node 0, or leaf 0 for an unsplit tree.
    #[inline]
    pub fn root(&self) -> Child {
        if self.num_leaves > 1 {
            Child::Node(NodeId::ROOT)
        } else {
            Child::Leaf(LeafId::ROOT)
        }
    }

    // =========================================================================
    // Node accessors
    // =========================================================================

    #[inline]
    pub fn left_child(&self, node: NodeId) -> Child {
        Child::from_raw(self.left_child[node.index()])
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> Child {
        Child::from_raw(self.right_child[node.index()])
    }

    /// Feature id in the binned training dataset.
    #[inline]
    pub fn split_feature(&self, node: NodeId) -> u32 {
        self.split_feature[node.index()]
    }

    /// Feature id over raw feature values.
    #[inline]
    pub fn split_feature_real(&self, node: NodeId) -> u32 {
        self.split_feature_real[node.index()]
    }

    #[inline]
    pub fn threshold_in_bin(&self, node: NodeId) -> u32 {
        self.threshold_in_bin[node.index()]
    }

    /// Real-space threshold (a category mask for categorical nodes).
    #[inline]
    pub fn threshold(&self, node: NodeId) -> f64 {
        self.threshold[node.index()]
    }

    #[inline]
    pub fn decision_type(&self, node: NodeId) -> DecisionType {
        self.decision_type[node.index()]
    }

    #[inline]
    pub fn split_gain(&self, node: NodeId) -> f32 {
        self.split_gain[node.index()]
    }

    /// Value the node held as a leaf before it was split.
    #[inline]
    pub fn internal_value(&self, node: NodeId) -> f64 {
        self.internal_value[node.index()]
    }

    /// Number of samples that reached the node during training.
    #[inline]
    pub fn internal_count(&self, node: NodeId) -> u32 {
        self.internal_count[node.index()]
    }

    // =========================================================================
    // Leaf accessors
    // =========================================================================

    /// Parent node, `None` for the root leaf of an unsplit tree.
    #[inline]
    pub fn leaf_parent(&self, leaf: LeafId) -> Option<NodeId> {
        let raw = self.leaf_parent[leaf.index()];
        (raw >= 0).then_some(NodeId(raw as u32))
    }

    #[inline]
    pub fn leaf_value(&self, leaf: LeafId) -> f64 {
        self.leaf_value[leaf.index()]
    }

    #[inline]
    pub fn leaf_count(&self, leaf: LeafId) -> u32 {
        self.leaf_count[leaf.index()]
    }

    /// Depth of a leaf, the root leaf being at depth 1.
    #[inline]
    pub fn leaf_depth(&self, leaf: LeafId) -> u32 {
        self.leaf_depth[leaf.index()]
    }

    // =========================================================================
    // Raw slices (serialization)
    // =========================================================================

    pub(crate) fn raw_left_children(&self) -> &[i32] {
        &self.left_child[..self.num_nodes()]
    }

    pub(crate) fn raw_right_children(&self) -> &[i32] {
        &self.right_child[..self.num_nodes()]
    }

    pub(crate) fn raw_leaf_parents(&self) -> &[i32] {
        &self.leaf_parent[..self.num_leaves]
    }

    pub(crate) fn split_features_real(&self) -> &[u32] {
        &self.split_feature_real[..self.num_nodes()]
    }

    pub(crate) fn split_gains(&self) -> &[f32] {
        &self.split_gain[..self.num_nodes()]
    }

    pub(crate) fn thresholds(&self) -> &[f64] {
        &self.threshold[..self.num_nodes()]
    }

    pub(crate) fn decision_types(&self) -> &[DecisionType] {
        &self.decision_type[..self.num_nodes()]
    }

    pub(crate) fn internal_values(&self) -> &[f64] {
        &self.internal_value[..self.num_nodes()]
    }

    pub(crate) fn internal_counts(&self) -> &[u32] {
        &self.internal_count[..self.num_nodes()]
    }

    pub(crate) fn leaf_values(&self) -> &[f64] {
        &self.leaf_value[..self.num_leaves]
    }

    pub(crate) fn leaf_counts(&self) -> &[u32] {
        &self.leaf_count[..self.num_leaves]
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check the structural invariants of the tree.
    ///
    /// Every node and leaf must be reached exactly once from the root, every
    /// child must point at a later node (so traversal always terminates), and
    /// every leaf's recorded parent must be the node it hangs under.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let num_leaves = self.num_leaves;
        if num_leaves == 0 {
            return Err(TreeValidationError::Empty);
        }
        if num_leaves > self.max_leaves {
            return Err(TreeValidationError::OverCapacity {
                num_leaves,
                max_leaves: self.max_leaves,
            });
        }
        let n_nodes = num_leaves - 1;

        let mut node_parent: Vec<Option<Option<NodeId>>> = vec![None; n_nodes];
        let mut leaf_parent: Vec<Option<Option<NodeId>>> = vec![None; num_leaves];
        match self.root() {
            Child::Node(root) => node_parent[root.index()] = Some(None),
            Child::Leaf(root) => leaf_parent[root.index()] = Some(None),
        }

        // Children always point forward, so a single pass in id order visits
        // every parent before its children.
        for node in self.nodes() {
            if node_parent[node.index()].is_none() {
                return Err(TreeValidationError::Unreachable(Child::Node(node)));
            }
            for (side, child) in [("left", self.left_child(node)), ("right", self.right_child(node))] {
                match child {
                    Child::Node(c) => {
                        if c.index() >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds { node, side, child });
                        }
                        if c <= node {
                            return Err(TreeValidationError::ChildNotAfterParent {
                                node: c,
                                parent: node,
                            });
                        }
                        if node_parent[c.index()].replace(Some(node)).is_some() {
                            return Err(TreeValidationError::DuplicateChild { child });
                        }
                    }
                    Child::Leaf(l) => {
                        if l.index() >= num_leaves {
                            return Err(TreeValidationError::ChildOutOfBounds { node, side, child });
                        }
                        if leaf_parent[l.index()].replace(Some(node)).is_some() {
                            return Err(TreeValidationError::DuplicateChild { child });
                        }
                    }
                }
            }
        }

        for leaf in self.leaves() {
            let actual = leaf_parent[leaf.index()]
                .ok_or(TreeValidationError::Unreachable(Child::Leaf(leaf)))?;
            let recorded = self.leaf_parent(leaf);
            if recorded != actual {
                return Err(TreeValidationError::ParentMismatch {
                    leaf,
                    recorded,
                    actual,
                });
            }
        }

        Ok(())
    }

    /// Rebuild leaf depths from the structure of a validated tree.
    fn recompute_depths(&mut self) {
        let mut node_depth = vec![1u32; self.num_nodes()];
        for n in 0..self.num_nodes() {
            let depth = node_depth[n];
            for raw in [self.left_child[n], self.right_child[n]] {
                match Child::from_raw(raw) {
                    Child::Node(c) => node_depth[c.index()] = depth + 1,
                    Child::Leaf(l) => self.leaf_depth[l.index()] = depth + 1,
                }
            }
        }
        if self.num_leaves == 1 {
            self.leaf_depth[0] = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        let mut tree = Tree::new(4);
        tree.set_leaf_value(LeafId::ROOT, 0.1);
        tree.split(
            LeafId::ROOT,
            SplitInfo::numerical(0, 3, 0.5)
                .with_outputs((-1.0, 6), (1.0, 4))
                .with_gain(2.5),
        )
        .unwrap();
        tree
    }

    #[test]
    fn new_tree_is_single_root_leaf() {
        let tree = Tree::new(8);
        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.num_nodes(), 0);
        assert_eq!(tree.max_leaves(), 8);
        assert_eq!(tree.root(), Child::Leaf(LeafId::ROOT));
        assert_eq!(tree.leaf_parent(LeafId::ROOT), None);
        assert_eq!(tree.leaf_depth(LeafId::ROOT), 1);
        assert_eq!(tree.leaf_count(LeafId::ROOT), 0);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let tree = Tree::new(0);
        assert_eq!(tree.max_leaves(), 1);
        assert_eq!(tree.num_leaves(), 1);
    }

    #[test]
    fn split_root() {
        let tree = stump();
        let root = NodeId::ROOT;

        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(tree.root(), Child::Node(root));
        assert_eq!(tree.left_child(root), Child::Leaf(LeafId(0)));
        assert_eq!(tree.right_child(root), Child::Leaf(LeafId(1)));
        assert_eq!(tree.threshold_in_bin(root), 3);
        assert_eq!(tree.threshold(root), 0.5);
        assert_eq!(tree.split_gain(root), 2.5);

        // Pre-split snapshot.
        assert_eq!(tree.internal_value(root), 0.1);
        assert_eq!(tree.internal_count(root), 10);

        assert_eq!(tree.leaf_value(LeafId(0)), -1.0);
        assert_eq!(tree.leaf_count(LeafId(0)), 6);
        assert_eq!(tree.leaf_value(LeafId(1)), 1.0);
        assert_eq!(tree.leaf_count(LeafId(1)), 4);
        assert_eq!(tree.leaf_parent(LeafId(0)), Some(root));
        assert_eq!(tree.leaf_parent(LeafId(1)), Some(root));
        assert_eq!(tree.leaf_depth(LeafId(0)), 2);
        assert_eq!(tree.leaf_depth(LeafId(1)), 2);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn split_rewires_parent_right_child() {
        let mut tree = stump();
        let new_leaf = tree
            .split(LeafId(1), SplitInfo::numerical(1, 0, 0.0).with_outputs((0.5, 2), (1.5, 2)))
            .unwrap();

        assert_eq!(new_leaf, LeafId(2));
        assert_eq!(tree.right_child(NodeId(0)), Child::Node(NodeId(1)));
        assert_eq!(tree.left_child(NodeId(0)), Child::Leaf(LeafId(0)));
        assert_eq!(tree.left_child(NodeId(1)), Child::Leaf(LeafId(1)));
        assert_eq!(tree.right_child(NodeId(1)), Child::Leaf(LeafId(2)));
        assert_eq!(tree.internal_value(NodeId(1)), 1.0);
        assert_eq!(tree.leaf_depth(LeafId(0)), 2);
        assert_eq!(tree.leaf_depth(LeafId(1)), 3);
        assert_eq!(tree.leaf_depth(LeafId(2)), 3);
        assert_eq!(tree.max_depth(), 3);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn split_rewires_parent_left_child() {
        let mut tree = stump();
        tree.split(LeafId(0), SplitInfo::numerical(1, 0, 0.0)).unwrap();

        assert_eq!(tree.left_child(NodeId(0)), Child::Node(NodeId(1)));
        assert_eq!(tree.right_child(NodeId(0)), Child::Leaf(LeafId(1)));
        assert_eq!(tree.leaf_parent(LeafId(1)), Some(NodeId(0)));
        assert_eq!(tree.leaf_parent(LeafId(0)), Some(NodeId(1)));
        assert_eq!(tree.leaf_parent(LeafId(2)), Some(NodeId(1)));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn capacity_is_checked() {
        let mut tree = Tree::new(2);
        tree.split(LeafId::ROOT, SplitInfo::numerical(0, 0, 0.0)).unwrap();
        let before = tree.clone();

        let err = tree.split(LeafId(1), SplitInfo::numerical(0, 0, 0.0)).unwrap_err();
        assert_eq!(err, TreeError::CapacityExceeded { max_leaves: 2 });
        assert_eq!(tree, before);
    }

    #[test]
    fn unknown_leaf_is_rejected() {
        let mut tree = Tree::new(4);
        let err = tree.split(LeafId(1), SplitInfo::numerical(0, 0, 0.0)).unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidLeaf {
                leaf: LeafId(1),
                num_leaves: 1
            }
        );
        assert_eq!(tree.num_leaves(), 1);
    }

    #[test]
    fn invariants_hold_after_every_split() {
        let mut tree = Tree::new(16);
        for i in 0..15u32 {
            // Alternate between splitting the newest and the oldest leaf.
            let leaf = if i % 2 == 0 { LeafId(i) } else { LeafId(i / 3) };
            tree.split(leaf, SplitInfo::numerical(i % 3, i, i as f64)).unwrap();
            assert_eq!(tree.num_leaves(), tree.num_nodes() + 1);
            tree.validate().unwrap();
        }
        assert_eq!(tree.num_leaves(), 16);
    }

    #[test]
    fn validate_detects_parent_mismatch() {
        let mut tree = stump();
        tree.leaf_parent[1] = -1;
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::ParentMismatch { leaf: LeafId(1), .. })
        ));
    }

    #[test]
    fn validate_detects_duplicate_leaf() {
        let mut tree = stump();
        tree.right_child[0] = Child::Leaf(LeafId(0)).to_raw();
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn validate_detects_backward_edge() {
        let mut tree = stump();
        tree.split(LeafId(1), SplitInfo::numerical(0, 0, 0.0)).unwrap();
        tree.right_child[1] = Child::Node(NodeId(0)).to_raw();
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::ChildNotAfterParent { .. })
        ));
    }
}
