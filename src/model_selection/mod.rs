//! K-fold cross-validation and grid search.
//!
//! Candidates are scored by mean validation metric across folds; the
//! experiment binaries search GBDT and linear hyperparameters with F1, the
//! way the surrounding scripts always have. Candidate evaluation runs in
//! parallel when allowed.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::Dataset;
use crate::embedding::SparseRowMatrix;
use crate::linear::{LinearParams, LinearTrainer};
use crate::training::gbdt::{GBDTParams, GBDTTrainer};
use crate::training::{MetricFn, ObjectiveFn, TrainError};
use crate::utils::Parallelism;

/// Errors from cross-validation and grid search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{n_samples} samples cannot form {n_splits} folds")]
    TooFewSamples { n_samples: usize, n_splits: usize },

    #[error("candidate grid is empty")]
    EmptyGrid,

    #[error(transparent)]
    Train(#[from] TrainError),
}

// =============================================================================
// KFold
// =============================================================================

/// Seeded shuffled K-fold splitter.
///
/// Every sample lands in exactly one validation fold; folds differ in size by
/// at most one. Deterministic for a fixed seed.
#[derive(Clone, Debug)]
pub struct KFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        debug_assert!(n_splits >= 2, "need at least two folds");
        Self { n_splits, seed }
    }

    /// Produce `(train_indices, validation_indices)` pairs.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, SearchError> {
        if n_samples < self.n_splits || self.n_splits < 2 {
            return Err(SearchError::TooFewSamples { n_samples, n_splits: self.n_splits });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let folds = (0..self.n_splits)
            .map(|fold| {
                let start = fold * n_samples / self.n_splits;
                let end = (fold + 1) * n_samples / self.n_splits;
                let validation = indices[start..end].to_vec();
                let train = indices[..start].iter().chain(&indices[end..]).copied().collect();
                (train, validation)
            })
            .collect();
        Ok(folds)
    }
}

// =============================================================================
// Grid Search
// =============================================================================

/// Outcome of a grid search: the winning candidate plus every mean score.
#[derive(Clone, Debug)]
pub struct GridSearchReport<P> {
    pub best_params: P,
    pub best_score: f64,
    /// `(candidate, mean validation score)` in grid order.
    pub results: Vec<(P, f64)>,
}

fn pick_best<P: Clone>(
    results: Vec<(P, f64)>,
    higher_is_better: bool,
) -> Result<GridSearchReport<P>, SearchError> {
    let best = results
        .iter()
        .enumerate()
        .filter(|(_, (_, score))| !score.is_nan())
        .max_by(|(_, (_, a)), (_, (_, b))| {
            let ordering = a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
            if higher_is_better { ordering } else { ordering.reverse() }
        })
        .map(|(idx, _)| idx)
        .ok_or(SearchError::EmptyGrid)?;

    let (best_params, best_score) = results[best].clone();
    Ok(GridSearchReport { best_params, best_score, results })
}

/// Cross-validated grid search over GBDT parameters.
///
/// Each fold trains on the fold-train subset, scores objective-transformed
/// margins on the fold-validation subset with `metric`, and candidates are
/// ranked by mean score. Pick a metric whose threshold matches the
/// objective's score kind (0.5 for probabilities, 0.0 for margins).
pub fn grid_search_gbdt<O, M>(
    candidates: &[GBDTParams],
    objective: &O,
    metric: &M,
    data: &Dataset,
    kfold: &KFold,
    parallelism: Parallelism,
) -> Result<GridSearchReport<GBDTParams>, SearchError>
where
    O: ObjectiveFn + Clone,
    M: MetricFn,
{
    if candidates.is_empty() {
        return Err(SearchError::EmptyGrid);
    }
    let folds = kfold.split(data.n_samples())?;

    let scored: Vec<Result<(GBDTParams, f64), SearchError>> =
        parallelism.maybe_par_map(candidates.to_vec(), |params| {
            let mut total = 0.0f64;
            for (train_idx, val_idx) in &folds {
                let train = data.select(train_idx);
                let validation = data.select(val_idx);

                let trainer = GBDTTrainer::new(objective.clone(), params.clone());
                let (forest, _) = trainer.train(&train, None, Parallelism::Sequential)?;

                let mut scores =
                    forest.predict_margins(&validation.features(), Parallelism::Sequential);
                objective.output_transform().apply_inplace(&mut scores);
                total += metric.compute(&scores, validation.labels());
            }
            Ok((params, total / folds.len() as f64))
        });

    let results = scored.into_iter().collect::<Result<Vec<_>, _>>()?;
    pick_best(results, metric.higher_is_better())
}

/// Cross-validated grid search over linear-model parameters, on sparse rows.
pub fn grid_search_linear<O, M>(
    candidates: &[LinearParams],
    objective: &O,
    metric: &M,
    rows: &SparseRowMatrix,
    targets: &[f32],
    kfold: &KFold,
    parallelism: Parallelism,
) -> Result<GridSearchReport<LinearParams>, SearchError>
where
    O: ObjectiveFn + Clone,
    M: MetricFn,
{
    if candidates.is_empty() {
        return Err(SearchError::EmptyGrid);
    }
    let folds = kfold.split(rows.n_rows())?;

    let scored: Vec<Result<(LinearParams, f64), SearchError>> =
        parallelism.maybe_par_map(candidates.to_vec(), |params| {
            let mut total = 0.0f64;
            for (train_idx, val_idx) in &folds {
                let train_rows = rows.select_rows(train_idx);
                let train_targets: Vec<f32> = train_idx.iter().map(|&i| targets[i]).collect();
                let val_rows = rows.select_rows(val_idx);
                let val_targets: Vec<f32> = val_idx.iter().map(|&i| targets[i]).collect();

                let trainer = LinearTrainer::new(objective.clone(), params.clone());
                let model = trainer.train(&train_rows, &train_targets)?;

                let (scores, _) = model.predict_scores(&val_rows);
                total += metric.compute(&scores, &val_targets);
            }
            Ok((params, total / folds.len() as f64))
        });

    let results = scored.into_iter().collect::<Result<Vec<_>, _>>()?;
    pick_best(results, metric.higher_is_better())
}
