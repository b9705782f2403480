//! Trained model representations.

mod tree;

pub use tree::{NodeId, Tree, TreeBuilder, TreeNode, NO_CHILD};
