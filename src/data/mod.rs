//! Data handling: matrix views, the owned [`Dataset`] container, CSV
//! ingestion with categorical factorization, and train/test splitting.
//!
//! # Layouts
//!
//! Training code wants feature-major storage (contiguous per-feature scans);
//! prediction and transform inputs arrive sample-major. [`DataAccessor`]
//! papers over the difference for per-sample consumers such as tree
//! traversal.

mod csv;
mod dataset;
mod matrix;
mod split;

pub use csv::{read_classification_csv, CsvOptions};
pub use dataset::Dataset;
pub use matrix::{DataAccessor, FeaturesView, SampleAccessor, SampleRef, SamplesView};
pub use split::train_test_split;

/// Errors from dataset construction and ingestion.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Underlying CSV or I/O failure.
    #[error(transparent)]
    Csv(#[from] ::csv::Error),

    /// Flat buffer length does not match the requested shape.
    #[error("buffer of length {got} cannot form the requested shape ({expected} values)")]
    ShapeMismatch { expected: usize, got: usize },

    /// Label vector is not aligned with the sample count.
    #[error("expected {expected} labels, got {got}")]
    LabelLength { expected: usize, got: usize },

    /// No rows or no feature columns.
    #[error("table has no usable rows or columns")]
    EmptyTable,

    /// A data row has a different width than the first row.
    #[error("row {line} has {got} fields, expected {expected}")]
    RaggedRow { line: usize, expected: usize, got: usize },

    /// Provided column names do not match the table width.
    #[error("expected {expected} column names, got {got}")]
    ColumnCount { expected: usize, got: usize },

    /// The requested target column does not exist.
    #[error("target column {0:?} not found")]
    MissingColumn(String),

    /// Split fraction outside `(0, 1)`.
    #[error("fraction must be in (0, 1), got {0}")]
    InvalidFraction(f32),
}
