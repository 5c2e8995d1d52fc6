//! Sparse-input linear classifiers.
//!
//! [`LinearTrainer`] fits a weight vector by full-batch Newton-style
//! coordinate updates over CSR rows, reusing the same [`ObjectiveFn`]
//! gradients as the tree trainer: logistic loss gives regularized logistic
//! regression, hinge loss a linear SVM.
//!
//! The fitted [`LinearModel`] knows whether its margins admit a probability
//! reading ([`OutputTransform`]); callers that need a `[0, 1]` score
//! regardless can use [`LinearModel::positive_scores`], which falls back to
//! min-max normalization of the decision scores.

use crate::embedding::SparseRowMatrix;
use crate::training::{
    GradsTuple, ObjectiveFn, OutputTransform, ParamValidationError, ScoreKind, TrainError,
    TrainingLogger, Verbosity,
};

// =============================================================================
// LinearParams
// =============================================================================

/// Parameters for linear-model training.
#[derive(Clone, Debug)]
pub struct LinearParams {
    /// Number of full-batch update rounds.
    pub n_rounds: u32,
    /// Step size applied to every coordinate update.
    pub learning_rate: f32,
    /// L1 regularization (alpha); encourages sparse weights.
    pub alpha: f32,
    /// L2 regularization (lambda); shrinks weights.
    pub lambda: f32,
    /// Training progress verbosity.
    pub verbosity: Verbosity,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.5,
            alpha: 0.0,
            lambda: 1.0,
            verbosity: Verbosity::default(),
        }
    }
}

impl LinearParams {
    /// Validate all parameter ranges.
    pub fn validate(&self) -> Result<(), ParamValidationError> {
        if self.n_rounds == 0 {
            return Err(ParamValidationError::InvalidNRounds(self.n_rounds));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ParamValidationError::InvalidLearningRate(self.learning_rate));
        }
        if self.alpha < 0.0 {
            return Err(ParamValidationError::InvalidAlpha(self.alpha));
        }
        if self.lambda < 0.0 {
            return Err(ParamValidationError::InvalidLambda(self.lambda));
        }
        Ok(())
    }
}

// =============================================================================
// LinearModel
// =============================================================================

/// A fitted linear classifier over sparse rows.
#[derive(Clone, Debug)]
pub struct LinearModel {
    weights: Vec<f32>,
    bias: f32,
    transform: OutputTransform,
}

impl LinearModel {
    /// Number of input columns.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Fitted weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Fitted bias term.
    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// How margins become scores.
    #[inline]
    pub fn output_transform(&self) -> OutputTransform {
        self.transform
    }

    /// Raw decision scores: `bias + row . weights`.
    ///
    /// # Panics
    ///
    /// Panics if the input column count differs from the fitted count.
    pub fn decision_function(&self, rows: &SparseRowMatrix) -> Vec<f32> {
        assert_eq!(
            rows.n_cols(),
            self.weights.len(),
            "input has {} columns, model was fitted on {}",
            rows.n_cols(),
            self.weights.len()
        );
        rows.iter_rows().map(|row| self.bias + row.dot(&self.weights)).collect()
    }

    /// Transformed scores plus their semantic kind.
    pub fn predict_scores(&self, rows: &SparseRowMatrix) -> (Vec<f32>, ScoreKind) {
        let mut scores = self.decision_function(rows);
        self.transform.apply_inplace(&mut scores);
        (scores, self.transform.kind())
    }

    /// Positive-class probabilities, when this model produces them.
    ///
    /// `None` for margin-only models (hinge loss); use
    /// [`positive_scores`](Self::positive_scores) for a `[0, 1]` score that
    /// always exists.
    pub fn predict_proba(&self, rows: &SparseRowMatrix) -> Option<Vec<f32>> {
        match self.transform.kind() {
            ScoreKind::Probability => Some(self.predict_scores(rows).0),
            ScoreKind::Margin => None,
        }
    }

    /// A `[0, 1]` positive-class score for every model.
    ///
    /// Probability models return probabilities; margin models fall back to
    /// min-max normalizing the decision scores of this batch.
    pub fn positive_scores(&self, rows: &SparseRowMatrix) -> Vec<f32> {
        match self.predict_proba(rows) {
            Some(probs) => probs,
            None => {
                let mut scores = self.decision_function(rows);
                min_max_normalize(&mut scores);
                scores
            }
        }
    }

    /// Hard labels: margin `>= 0` predicts the positive class.
    pub fn predict(&self, rows: &SparseRowMatrix) -> Vec<f32> {
        self.decision_function(rows)
            .into_iter()
            .map(|margin| if margin >= 0.0 { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Scale scores into `[0, 1]` by min-max. A constant batch maps to 0.5.
pub fn min_max_normalize(scores: &mut [f32]) {
    let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
    for &s in scores.iter() {
        min = min.min(s);
        max = max.max(s);
    }

    let range = max - min;
    if scores.is_empty() || !range.is_finite() || range <= 0.0 {
        scores.iter_mut().for_each(|s| *s = 0.5);
        return;
    }
    for s in scores.iter_mut() {
        *s = (*s - min) / range;
    }
}

// =============================================================================
// LinearTrainer
// =============================================================================

/// Full-batch coordinate-descent trainer, generic over the objective.
pub struct LinearTrainer<O: ObjectiveFn> {
    objective: O,
    params: LinearParams,
}

impl<O: ObjectiveFn> LinearTrainer<O> {
    pub fn new(objective: O, params: LinearParams) -> Self {
        Self { objective, params }
    }

    pub fn params(&self) -> &LinearParams {
        &self.params
    }

    /// Train a linear model on sparse rows.
    ///
    /// Each round takes one Newton step on the bias, recomputes gradients,
    /// then updates every coordinate from accumulated per-column gradient and
    /// hessian sums (L2 folded into both, L1 via soft thresholding). Margins
    /// are maintained incrementally.
    pub fn train(&self, rows: &SparseRowMatrix, targets: &[f32]) -> Result<LinearModel, TrainError> {
        self.params.validate()?;

        let n_samples = rows.n_rows();
        if n_samples == 0 {
            return Err(TrainError::EmptyTrainingSet);
        }
        if targets.len() != n_samples {
            return Err(TrainError::TargetLength { expected: n_samples, got: targets.len() });
        }

        let n_cols = rows.n_cols();
        let mut weights = vec![0.0f32; n_cols];
        let mut bias = self.objective.base_score(targets);
        let mut margins = vec![bias; n_samples];
        let mut grad_hess = vec![GradsTuple::default(); n_samples];

        let mut grad_sums = vec![0.0f64; n_cols];
        let mut hess_sums = vec![0.0f64; n_cols];
        let mut deltas = vec![0.0f32; n_cols];

        let logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(self.objective.name(), self.params.n_rounds as usize);

        for round in 0..self.params.n_rounds {
            // Bias step.
            self.objective.compute_gradients_into(&margins, targets, &mut grad_hess);
            let (grad_total, hess_total) = grad_hess.iter().fold((0.0f64, 0.0f64), |(g, h), gh| {
                (g + gh.grad as f64, h + gh.hess as f64)
            });
            if hess_total > 0.0 {
                let bias_delta = (-self.params.learning_rate as f64 * grad_total / hess_total) as f32;
                bias += bias_delta;
                margins.iter_mut().for_each(|m| *m += bias_delta);
            }

            // Coordinate pass against fresh gradients.
            self.objective.compute_gradients_into(&margins, targets, &mut grad_hess);
            grad_sums.fill(0.0);
            hess_sums.fill(0.0);
            for (row, gh) in rows.iter_rows().zip(&grad_hess) {
                for (col, val) in row.iter() {
                    let col = col as usize;
                    grad_sums[col] += gh.grad as f64 * val as f64;
                    hess_sums[col] += gh.hess as f64 * (val as f64) * (val as f64);
                }
            }

            let lambda = self.params.lambda as f64;
            let alpha = self.params.alpha as f64;
            let learning_rate = self.params.learning_rate as f64;
            for col in 0..n_cols {
                let h_total = hess_sums[col] + lambda;
                if h_total < 1e-12 {
                    deltas[col] = 0.0;
                    continue;
                }
                let w = weights[col] as f64;
                let g_total = grad_sums[col] + lambda * w;

                // Unconstrained Newton optimum, then L1 soft thresholding.
                let unpenalized = w - g_total / h_total;
                let shrunk = unpenalized.signum() * (unpenalized.abs() - alpha / h_total).max(0.0);
                deltas[col] = (learning_rate * (shrunk - w)) as f32;
            }

            for (col, &delta) in deltas.iter().enumerate() {
                weights[col] += delta;
            }
            for (row, margin) in rows.iter_rows().zip(margins.iter_mut()) {
                for (col, val) in row.iter() {
                    *margin += deltas[col as usize] * val;
                }
            }

            logger.log_round(round as usize, self.objective.loss(&margins, targets), None);
        }

        logger.finish_training(self.params.n_rounds as usize);

        Ok(LinearModel { weights, bias, transform: self.objective.output_transform() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SamplesView;
    use crate::training::{HingeLoss, LogisticLoss};

    /// Separable data: column 0 marks the positive class, column 1 negative.
    fn indicator_rows() -> (SparseRowMatrix, Vec<f32>) {
        let mut rows = SparseRowMatrix::new(2);
        for _ in 0..10 {
            rows.push_row([(0u32, 1.0)]);
            rows.push_row([(1u32, 1.0)]);
        }
        let targets: Vec<f32> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        (rows, targets)
    }

    #[test]
    fn logistic_separates_indicators() {
        let (rows, targets) = indicator_rows();
        let params = LinearParams { n_rounds: 50, lambda: 0.1, ..Default::default() };
        let model = LinearTrainer::new(LogisticLoss, params).train(&rows, &targets).unwrap();

        assert_eq!(model.predict(&rows), targets);
        assert!(model.weights()[0] > 0.0);
        assert!(model.weights()[1] < 0.0);

        let probs = model.predict_proba(&rows).expect("logistic model yields probabilities");
        assert!(probs[0] > 0.5);
        assert!(probs[1] < 0.5);
    }

    #[test]
    fn hinge_has_no_probabilities_but_scores_normalize() {
        let (rows, targets) = indicator_rows();
        let params = LinearParams { n_rounds: 50, lambda: 0.1, ..Default::default() };
        let model = LinearTrainer::new(HingeLoss, params).train(&rows, &targets).unwrap();

        assert_eq!(model.output_transform(), OutputTransform::Identity);
        assert!(model.predict_proba(&rows).is_none());

        let scores = model.positive_scores(&rows);
        assert!(scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
        // Positive rows outscore negative rows after normalization.
        assert!(scores[0] > scores[1]);

        assert_eq!(model.predict(&rows), targets);
    }

    #[test]
    fn l2_shrinks_weights() {
        let (rows, targets) = indicator_rows();
        let light = LinearTrainer::new(LogisticLoss, LinearParams { lambda: 0.01, ..Default::default() })
            .train(&rows, &targets)
            .unwrap();
        let heavy = LinearTrainer::new(LogisticLoss, LinearParams { lambda: 10.0, ..Default::default() })
            .train(&rows, &targets)
            .unwrap();
        assert!(heavy.weights()[0].abs() < light.weights()[0].abs());
    }

    #[test]
    fn l1_zeroes_uninformative_columns() {
        // Column 2 is constant noise present in every row.
        let mut rows = SparseRowMatrix::new(3);
        for i in 0..20 {
            if i % 2 == 0 {
                rows.push_row([(0u32, 1.0), (2u32, 1.0)]);
            } else {
                rows.push_row([(1u32, 1.0), (2u32, 1.0)]);
            }
        }
        let targets: Vec<f32> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();

        let params = LinearParams { alpha: 1.0, lambda: 0.0, n_rounds: 60, ..Default::default() };
        let model = LinearTrainer::new(LogisticLoss, params).train(&rows, &targets).unwrap();
        assert_eq!(model.weights()[2], 0.0);
    }

    #[test]
    fn dense_features_work_via_csr() {
        let data = [1.0f32, 0.0, 0.0, 1.0, 1.0, 0.5, 0.0, 0.8];
        let view = SamplesView::from_slice(&data, 4, 2).unwrap();
        let rows = SparseRowMatrix::from_dense(&view);
        let targets = [1.0f32, 0.0, 1.0, 0.0];

        let params = LinearParams { n_rounds: 80, lambda: 0.1, ..Default::default() };
        let model = LinearTrainer::new(LogisticLoss, params).train(&rows, &targets).unwrap();
        assert_eq!(model.predict(&rows), targets);
    }

    #[test]
    fn rejects_bad_inputs() {
        let (rows, _) = indicator_rows();
        let trainer = LinearTrainer::new(LogisticLoss, LinearParams::default());
        assert!(matches!(
            trainer.train(&rows, &[1.0]),
            Err(TrainError::TargetLength { expected: 20, got: 1 })
        ));

        let bad = LinearParams { n_rounds: 0, ..Default::default() };
        assert!(matches!(
            LinearTrainer::new(LogisticLoss, bad).train(&rows, &[0.0; 20]),
            Err(TrainError::Params(ParamValidationError::InvalidNRounds(0)))
        ));
    }

    #[test]
    fn min_max_normalize_cases() {
        let mut scores = [2.0f32, 4.0, 3.0];
        min_max_normalize(&mut scores);
        assert_eq!(scores, [0.0, 1.0, 0.5]);

        let mut constant = [1.0f32, 1.0];
        min_max_normalize(&mut constant);
        assert_eq!(constant, [0.5, 0.5]);

        let mut empty: [f32; 0] = [];
        min_max_normalize(&mut empty);
    }
}
