//! Canonical tree and forest representations.

/// Node identifier: an index into a tree's SoA arrays. The root is 0.
///
/// A leaf's `NodeId` is the "leaf identifier" consumed by the embedding
/// encoders.
pub type NodeId = u32;

mod forest;
mod tree;

pub use forest::{Forest, ForestValidationError};
pub use tree::{MutableTree, Tree, TreeValidationError, TreeView};
