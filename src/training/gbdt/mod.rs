//! Gradient-boosted decision tree training.
//!
//! [`GBDTTrainer`] runs the boosting loop: compute gradients against the
//! current margins, grow one tree, fold its leaf weights back into the
//! margins, and record per-round losses. The ensemble it produces is the
//! "ensemble-fitting collaborator" behind [`crate::embedding::LeafEmbedder`].

mod grower;
mod split;

pub use split::{GainParams, SplitCandidate};

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::Dataset;
use crate::repr::{Forest, TreeView};
use crate::training::logger::{TrainingLogger, Verbosity};
use crate::training::objectives::{GradsTuple, ObjectiveFn};
use crate::training::{ParamValidationError, TrainError};
use crate::utils::Parallelism;

use grower::{presort_features, GrowerParams, TreeGrower};

// =============================================================================
// GBDTParams
// =============================================================================

/// Parameters for GBDT training.
#[derive(Clone, Debug)]
pub struct GBDTParams {
    /// Number of boosting rounds (trees).
    pub n_trees: u32,
    /// Shrinkage applied to every leaf weight.
    pub learning_rate: f32,
    /// Maximum number of split levels per tree.
    pub max_depth: u32,
    /// Fraction of rows contributing gradients each round, in `(0, 1]`.
    pub subsample: f32,
    /// Gain computation and regularization parameters.
    pub gain: GainParams,
    /// Seed for row subsampling.
    pub seed: u64,
    /// Training progress verbosity.
    pub verbosity: Verbosity,
}

impl Default for GBDTParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
            gain: GainParams::default(),
            seed: 42,
            verbosity: Verbosity::default(),
        }
    }
}

impl GBDTParams {
    /// Validate all parameter ranges.
    pub fn validate(&self) -> Result<(), ParamValidationError> {
        if self.n_trees == 0 {
            return Err(ParamValidationError::InvalidNTrees(self.n_trees));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ParamValidationError::InvalidLearningRate(self.learning_rate));
        }
        if self.max_depth == 0 {
            return Err(ParamValidationError::InvalidMaxDepth(self.max_depth));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ParamValidationError::InvalidSubsample(self.subsample));
        }
        if self.gain.reg_lambda < 0.0 {
            return Err(ParamValidationError::InvalidLambda(self.gain.reg_lambda));
        }
        if self.gain.reg_alpha < 0.0 {
            return Err(ParamValidationError::InvalidAlpha(self.gain.reg_alpha));
        }
        if self.gain.min_child_weight < 0.0 {
            return Err(ParamValidationError::InvalidMinChildWeight(self.gain.min_child_weight));
        }
        if self.gain.min_gain < 0.0 {
            return Err(ParamValidationError::InvalidMinGain(self.gain.min_gain));
        }
        Ok(())
    }

    fn to_grower_params(&self) -> GrowerParams {
        GrowerParams {
            gain: self.gain.clone(),
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
        }
    }
}

// =============================================================================
// TrainingHistory
// =============================================================================

/// Per-round loss curves recorded during boosting.
///
/// `eval_loss` is empty when no evaluation set was supplied; otherwise both
/// vectors have one entry per trained tree.
#[derive(Clone, Debug, Default)]
pub struct TrainingHistory {
    pub train_loss: Vec<f64>,
    pub eval_loss: Vec<f64>,
}

// =============================================================================
// GBDTTrainer
// =============================================================================

/// Boosting trainer, generic over the objective.
pub struct GBDTTrainer<O: ObjectiveFn> {
    objective: O,
    params: GBDTParams,
}

impl<O: ObjectiveFn> GBDTTrainer<O> {
    pub fn new(objective: O, params: GBDTParams) -> Self {
        Self { objective, params }
    }

    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    /// Train a forest.
    ///
    /// Feature orders are presorted once and shared by every round. When an
    /// evaluation set is supplied, its loss is tracked per round (the staged
    /// loss curve); it never influences training.
    ///
    /// Deterministic: identical inputs, parameters and seed produce an
    /// identical forest.
    pub fn train(
        &self,
        train: &Dataset,
        eval: Option<&Dataset>,
        parallelism: Parallelism,
    ) -> Result<(Forest, TrainingHistory), TrainError> {
        self.params.validate()?;

        let n_samples = train.n_samples();
        if n_samples == 0 {
            return Err(TrainError::EmptyTrainingSet);
        }

        let targets = train.labels();
        let features = train.features();
        let sorted_orders = presort_features(&features);
        let grower = TreeGrower::new(features, &sorted_orders, self.params.to_grower_params());

        let base_score = self.objective.base_score(targets);
        let mut margins = vec![base_score; n_samples];
        let mut grad_hess = vec![GradsTuple::default(); n_samples];
        let mut eval_margins = eval.map(|e| vec![base_score; e.n_samples()]);

        let mut forest = Forest::new().with_base_score(base_score);
        let mut history = TrainingHistory::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.params.seed);

        let logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(self.objective.name(), self.params.n_trees as usize);

        for round in 0..self.params.n_trees {
            self.objective.compute_gradients_into(&margins, targets, &mut grad_hess);

            if self.params.subsample < 1.0 {
                // Unsampled rows contribute nothing to split finding or leaf
                // weights; the grown tree is still applied to every row.
                for pair in grad_hess.iter_mut() {
                    if rng.gen::<f32>() >= self.params.subsample {
                        *pair = GradsTuple::default();
                    }
                }
            }

            let (tree, leaf_of) = grower.grow(&grad_hess);

            for (margin, &leaf) in margins.iter_mut().zip(&leaf_of) {
                *margin += tree.leaf_value(leaf);
            }

            if let (Some(eval), Some(eval_margins)) = (eval, eval_margins.as_mut()) {
                tree.predict_into(&eval.features(), eval_margins, parallelism);
            }

            let train_loss = self.objective.loss(&margins, targets);
            history.train_loss.push(train_loss);
            let eval_loss = eval.zip(eval_margins.as_ref()).map(|(eval, eval_margins)| {
                let loss = self.objective.loss(eval_margins, eval.labels());
                history.eval_loss.push(loss);
                loss
            });
            logger.log_round(round as usize, train_loss, eval_loss);

            forest.push_tree(tree);
        }

        logger.finish_training(forest.n_trees());
        Ok((forest, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::TreeView;
    use crate::testing::two_cluster_dataset;
    use crate::training::objectives::{LogisticLoss, OutputTransform};
    use crate::training::metrics::{Accuracy, MetricFn};

    #[test]
    fn rejects_bad_params() {
        let bad = GBDTParams { n_trees: 0, ..Default::default() };
        let trainer = GBDTTrainer::new(LogisticLoss, bad);
        let data = two_cluster_dataset(20, 2, 0);
        assert!(matches!(
            trainer.train(&data, None, Parallelism::Sequential),
            Err(TrainError::Params(ParamValidationError::InvalidNTrees(0)))
        ));

        let bad = GBDTParams { subsample: 1.5, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = GBDTParams { learning_rate: 0.0, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn learns_separable_clusters() {
        let data = two_cluster_dataset(200, 3, 7);
        let params = GBDTParams { n_trees: 20, max_depth: 3, ..Default::default() };
        let trainer = GBDTTrainer::new(LogisticLoss, params);

        let (forest, history) = trainer.train(&data, None, Parallelism::Sequential).unwrap();
        assert_eq!(forest.n_trees(), 20);
        assert_eq!(history.train_loss.len(), 20);
        assert!(history.eval_loss.is_empty());

        let mut scores = forest.predict_margins(&data.features(), Parallelism::Sequential);
        OutputTransform::Sigmoid.apply_inplace(&mut scores);
        let acc = Accuracy::default().compute(&scores, data.labels());
        assert!(acc > 0.95, "accuracy {acc}");
    }

    #[test]
    fn train_loss_decreases() {
        let data = two_cluster_dataset(150, 2, 3);
        let params = GBDTParams { n_trees: 15, ..Default::default() };
        let trainer = GBDTTrainer::new(LogisticLoss, params);

        let (_, history) = trainer.train(&data, None, Parallelism::Sequential).unwrap();
        let first = history.train_loss[0];
        let last = *history.train_loss.last().unwrap();
        assert!(last < first, "loss did not improve: {first} -> {last}");
    }

    #[test]
    fn eval_history_tracks_eval_set() {
        let train = two_cluster_dataset(120, 2, 1);
        let eval = two_cluster_dataset(40, 2, 2);
        let params = GBDTParams { n_trees: 10, ..Default::default() };
        let trainer = GBDTTrainer::new(LogisticLoss, params);

        let (_, history) = trainer.train(&train, Some(&eval), Parallelism::Sequential).unwrap();
        assert_eq!(history.eval_loss.len(), 10);
        // Clusters are shared, so eval loss should improve too.
        assert!(history.eval_loss.last().unwrap() < &history.eval_loss[0]);
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let data = two_cluster_dataset(100, 2, 5);
        let params = GBDTParams { n_trees: 8, subsample: 0.5, seed: 11, ..Default::default() };

        let (forest_a, _) =
            GBDTTrainer::new(LogisticLoss, params.clone()).train(&data, None, Parallelism::Sequential).unwrap();
        let (forest_b, _) =
            GBDTTrainer::new(LogisticLoss, params).train(&data, None, Parallelism::Sequential).unwrap();

        let margins_a = forest_a.predict_margins(&data.features(), Parallelism::Sequential);
        let margins_b = forest_b.predict_margins(&data.features(), Parallelism::Sequential);
        assert_eq!(margins_a, margins_b);
    }

    #[test]
    fn subsampling_changes_trees() {
        let data = two_cluster_dataset(100, 2, 5);
        let full = GBDTParams { n_trees: 5, ..Default::default() };
        let sampled = GBDTParams { n_trees: 5, subsample: 0.4, ..Default::default() };

        let (forest_full, _) =
            GBDTTrainer::new(LogisticLoss, full).train(&data, None, Parallelism::Sequential).unwrap();
        let (forest_sub, _) =
            GBDTTrainer::new(LogisticLoss, sampled).train(&data, None, Parallelism::Sequential).unwrap();

        let a = forest_full.predict_margins(&data.features(), Parallelism::Sequential);
        let b = forest_sub.predict_margins(&data.features(), Parallelism::Sequential);
        assert_ne!(a, b);
    }

    #[test]
    fn forest_structure_is_valid() {
        let data = two_cluster_dataset(80, 3, 9);
        let params = GBDTParams { n_trees: 6, max_depth: 4, ..Default::default() };
        let (forest, _) =
            GBDTTrainer::new(LogisticLoss, params).train(&data, None, Parallelism::Sequential).unwrap();

        assert!(forest.validate().is_ok());
        for tree in forest.trees() {
            assert!(tree.n_leaves() >= 1);
            assert!(tree.n_leaves() <= 1 << 4);
        }
    }
}
