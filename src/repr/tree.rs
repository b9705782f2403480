//! Tree node and immutable tree structures.
//!
//! - [`TreeNode`]: A single tree node (split or leaf)
//! - [`Tree`]: An immutable trained regression tree
//! - [`TreeBuilder`]: Incremental construction during training
//! - [`NodeId`]: Type alias for tree node indices

use crate::data::Dataset;

/// Type alias for tree node indices.
pub type NodeId = u32;

/// Sentinel value for "no child" (leaf nodes).
pub const NO_CHILD: NodeId = u32::MAX;

/// A single tree node.
///
/// Uses struct layout (not enum) for cache-friendly fixed-size nodes.
/// The `is_leaf` flag distinguishes split vs leaf nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    // Split information (only valid when is_leaf=false)
    /// Feature index for split.
    pub feature: u32,
    /// Values `<= threshold` go left.
    pub threshold: f32,
    /// Direction for missing values.
    pub default_left: bool,
    /// Left child node index.
    pub left: NodeId,
    /// Right child node index.
    pub right: NodeId,

    // Leaf information (only valid when is_leaf=true)
    /// Leaf prediction value.
    pub value: f32,

    /// Whether this is a leaf node.
    pub is_leaf: bool,
}

impl Default for TreeNode {
    fn default() -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            default_left: false,
            left: NO_CHILD,
            right: NO_CHILD,
            value: 0.0,
            is_leaf: true,
        }
    }
}

/// An immutable trained regression tree.
///
/// Nodes are stored in a contiguous array. Root is always at index 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    n_leaves: u32,
    max_depth: u16,
}

impl Tree {
    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    #[inline]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves as usize
    }

    /// Depth of the deepest leaf (a single-leaf tree has depth 0).
    #[inline]
    pub fn depth(&self) -> usize {
        self.max_depth as usize
    }

    /// Node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id as usize]
    }

    /// Walk from the root to a leaf, reading feature values through `value_of`.
    #[inline]
    fn traverse(&self, value_of: impl Fn(usize) -> f32) -> f32 {
        let mut node = &self.nodes[0];
        while !node.is_leaf {
            let v = value_of(node.feature as usize);
            let go_left = if v.is_nan() {
                node.default_left
            } else {
                v <= node.threshold
            };
            let next = if go_left { node.left } else { node.right };
            node = &self.nodes[next as usize];
        }
        node.value
    }

    /// Predict one sample given its feature values.
    #[inline]
    pub fn predict_row(&self, features: &[f32]) -> f32 {
        self.traverse(|f| features[f])
    }

    /// Predict sample `row` of `dataset`.
    #[inline]
    pub fn predict_sample(&self, dataset: &Dataset, row: usize) -> f32 {
        self.traverse(|f| dataset.value(row, f))
    }

    /// Add this tree's prediction for rows `start..start + out.len()` into `out`.
    pub fn predict_into(&self, dataset: &Dataset, start: usize, out: &mut [f32]) {
        debug_assert!(start + out.len() <= dataset.n_samples());
        for (i, slot) in out.iter_mut().enumerate() {
            *slot += self.predict_sample(dataset, start + i);
        }
    }
}

/// Mutable tree builder for use during training.
///
/// Provides methods to construct the tree incrementally during the growth process.
#[derive(Clone, Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
    depths: Vec<u16>,
    n_leaves: u32,
    max_depth: u16,
}

impl TreeBuilder {
    /// Create a new tree builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            depths: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Initialize the root node.
    ///
    /// Returns the root node ID (always 0).
    pub fn init_root(&mut self) -> NodeId {
        self.reset();
        self.nodes.push(TreeNode::default());
        self.depths.push(0);
        0
    }

    /// Turn `node` into a split, allocating its two children.
    ///
    /// Returns (left_id, right_id).
    pub fn apply_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f32,
        default_left: bool,
    ) -> (NodeId, NodeId) {
        let left_id = self.nodes.len() as NodeId;
        let right_id = left_id + 1;
        let child_depth = self.depths[node as usize] + 1;

        self.nodes.push(TreeNode::default());
        self.nodes.push(TreeNode::default());
        self.depths.push(child_depth);
        self.depths.push(child_depth);

        let node_ref = &mut self.nodes[node as usize];
        node_ref.is_leaf = false;
        node_ref.feature = feature;
        node_ref.threshold = threshold;
        node_ref.default_left = default_left;
        node_ref.left = left_id;
        node_ref.right = right_id;

        self.max_depth = self.max_depth.max(child_depth);
        (left_id, right_id)
    }

    /// Set a node as a leaf with the given value.
    pub fn make_leaf(&mut self, node: NodeId, value: f32) {
        let node_ref = &mut self.nodes[node as usize];
        node_ref.is_leaf = true;
        node_ref.value = value;
        node_ref.left = NO_CHILD;
        node_ref.right = NO_CHILD;
        self.n_leaves += 1;
    }

    /// Depth of a node (root = 0).
    #[inline]
    pub fn depth(&self, node: NodeId) -> u16 {
        self.depths[node as usize]
    }

    /// Get current number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Finalize the tree.
    pub fn finish(self) -> Tree {
        Tree {
            nodes: self.nodes,
            n_leaves: self.n_leaves,
            max_depth: self.max_depth,
        }
    }

    /// Reset the builder for reuse.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.depths.clear();
        self.n_leaves = 0;
        self.max_depth = 0;
    }
}
