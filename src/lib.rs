//! treelin: tree-leaf embeddings with linear models for tabular data.
//!
//! A gradient-boosted ensemble partitions the feature space; encoding which
//! leaf each sample reaches in every tree yields a supervised, sparse,
//! high-dimensional embedding that linear classifiers handle well.
//!
//! # Key Types
//!
//! - [`LeafEmbedder`] / [`LeafEmbedding`] - fit/transform the leaf embedding
//! - [`GBDTTrainer`] / [`GBDTParams`] - gradient-boosted tree training
//! - [`LinearTrainer`] / [`LinearModel`] - sparse-input linear classifiers
//! - [`Dataset`] - data handling, CSV ingestion, splitting
//! - [`ConfusionMatrix`], [`F1`], [`Auc`], ... - evaluation metrics
//!
//! # Pipeline
//!
//! Load a dataset, split it, fit an embedder on the training side, and feed
//! the embedded rows to a linear model:
//!
//! ```no_run
//! use treelin::data::{read_classification_csv, train_test_split, CsvOptions};
//! use treelin::embedding::LeafEmbedder;
//! use treelin::linear::{LinearParams, LinearTrainer};
//! use treelin::training::{GBDTParams, LogisticLoss};
//! use treelin::utils::Parallelism;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = read_classification_csv("adult.csv", &CsvOptions::default())?;
//! let (train, test) = train_test_split(&data, 0.2, 0)?;
//!
//! let embedder = LeafEmbedder::new(GBDTParams::default());
//! let (embedding, train_rows) = embedder.fit_transform(&train, Parallelism::Parallel)?;
//!
//! let model = LinearTrainer::new(LogisticLoss, LinearParams::default())
//!     .train(&train_rows, train.labels())?;
//!
//! let test_rows = embedding.transform(&test.features())?;
//! let scores = model.positive_scores(&test_rows);
//! # let _ = scores;
//! # Ok(())
//! # }
//! ```

// Re-export approx traits for users comparing predictions in tests.
pub use approx;

pub mod data;
pub mod embedding;
pub mod linear;
pub mod model_selection;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// The embedding transform and its collaborators
pub use embedding::{LeafEmbedder, LeafEmbedding, LeafEncoder, SparseRowMatrix, UnknownLeafPolicy};

// Data handling
pub use data::{Dataset, DataError, SamplesView};

// Training
pub use training::{
    Accuracy, Auc, ConfusionMatrix, F1, GBDTParams, GBDTTrainer, HingeLoss, LogisticLoss,
    MetricFn, ObjectiveFn, Precision, Recall, TrainingHistory,
};

// Linear models
pub use linear::{LinearModel, LinearParams, LinearTrainer};

// Forest representation
pub use repr::{Forest, NodeId, Tree, TreeView};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
