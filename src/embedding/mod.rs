//! Supervised leaf embeddings.
//!
//! A fitted tree ensemble assigns every sample one leaf per tree. Giving each
//! observed leaf of each tree its own column yields a sparse, high-dimensional
//! binary representation — the concatenation of per-tree one-hot indicators,
//! in ensemble order. That embedding is what this module produces, as input
//! for the linear models in [`crate::linear`].
//!
//! The state machine is two types: [`LeafEmbedder`] (unfit configuration)
//! and [`LeafEmbedding`] (fitted, read-only, transform-capable).

mod encoder;
mod sparse;
mod transform;

pub use encoder::{LeafEncoder, UnknownLeafPolicy};
pub use sparse::{SparseRow, SparseRowMatrix};
pub use transform::{LeafEmbedder, LeafEmbedding};

use crate::repr::NodeId;
use crate::training::TrainError;

/// Errors from fitting or applying a leaf embedding.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Ensemble-fitting collaborator failure, surfaced as-is.
    #[error(transparent)]
    Train(#[from] TrainError),

    /// Transform input width differs from the fitted width.
    #[error("expected {expected} feature columns, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A sample reached a leaf unseen during fitting, under
    /// [`UnknownLeafPolicy::Error`].
    #[error("leaf {leaf} of tree {tree_index} was not observed during fitting")]
    UnknownLeaf { tree_index: usize, leaf: NodeId },

    /// Encoders cannot be fitted over an ensemble with no trees.
    #[error("ensemble has no trees")]
    EmptyEnsemble,

    /// Encoders cannot be fitted without samples.
    #[error("no samples to fit encoders on")]
    NoFitSamples,
}
