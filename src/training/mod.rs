//! Training infrastructure: objectives, metrics, logging, and the GBDT
//! boosting trainer.
//!
//! The sparse linear trainer lives in [`crate::linear`] but shares the
//! [`ObjectiveFn`] and error types defined here.

pub mod gbdt;
mod logger;
mod metrics;
mod objectives;

pub use gbdt::{GBDTParams, GBDTTrainer, GainParams, SplitCandidate, TrainingHistory};
pub use logger::{TrainingLogger, Verbosity};
pub use metrics::{
    Accuracy, Auc, ConfusionMatrix, F1, LogLoss, MetricFn, Precision, Recall,
};
pub use objectives::{
    GradsTuple, HingeLoss, LogisticLoss, ObjectiveFn, OutputTransform, ScoreKind, SquaredLoss,
};

// =============================================================================
// Errors
// =============================================================================

/// Parameter validation error, raised before any training work starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamValidationError {
    #[error("n_trees must be > 0, got {0}")]
    InvalidNTrees(u32),

    #[error("n_rounds must be > 0, got {0}")]
    InvalidNRounds(u32),

    #[error("learning_rate must be > 0, got {0}")]
    InvalidLearningRate(f32),

    #[error("max_depth must be > 0, got {0}")]
    InvalidMaxDepth(u32),

    #[error("subsample must be in (0, 1], got {0}")]
    InvalidSubsample(f32),

    #[error("lambda must be >= 0, got {0}")]
    InvalidLambda(f32),

    #[error("alpha must be >= 0, got {0}")]
    InvalidAlpha(f32),

    #[error("min_child_weight must be >= 0, got {0}")]
    InvalidMinChildWeight(f32),

    #[error("min_gain must be >= 0, got {0}")]
    InvalidMinGain(f32),
}

/// Errors from model training.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Params(#[from] ParamValidationError),

    #[error("training set has no samples")]
    EmptyTrainingSet,

    #[error("expected {expected} targets, got {got}")]
    TargetLength { expected: usize, got: usize },
}
