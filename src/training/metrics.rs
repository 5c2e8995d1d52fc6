//! Binary classification metrics.
//!
//! Threshold metrics (accuracy, precision, recall, F1) are all derived from
//! [`ConfusionMatrix`]. [`Auc`] ranks scores and is threshold-free;
//! [`LogLoss`] expects probabilities.

use super::objectives::ScoreKind;

// =============================================================================
// MetricFn
// =============================================================================

/// An evaluation metric over per-sample scores and binary targets.
pub trait MetricFn: Send + Sync {
    /// Compute the metric. Scores and targets are aligned by sample.
    fn compute(&self, scores: &[f32], targets: &[f32]) -> f64;

    /// Whether larger values are better.
    fn higher_is_better(&self) -> bool;

    /// Score kind this metric expects.
    fn expected_score_kind(&self) -> ScoreKind {
        ScoreKind::Probability
    }

    /// Name for logging and reports.
    fn name(&self) -> &'static str;
}

// =============================================================================
// ConfusionMatrix
// =============================================================================

/// Binary confusion matrix counts at a fixed decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
}

impl ConfusionMatrix {
    /// Count outcomes: `score >= threshold` predicts the positive class.
    ///
    /// # Panics
    ///
    /// Panics if `scores` and `targets` lengths disagree.
    pub fn from_scores(scores: &[f32], targets: &[f32], threshold: f32) -> Self {
        assert_eq!(scores.len(), targets.len(), "scores and targets must align");

        let mut cm = Self {
            true_positives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_negatives: 0,
        };

        for (&score, &target) in scores.iter().zip(targets) {
            let predicted_pos = score >= threshold;
            let actual_pos = target > 0.5;
            match (predicted_pos, actual_pos) {
                (true, true) => cm.true_positives += 1,
                (true, false) => cm.false_positives += 1,
                (false, true) => cm.false_negatives += 1,
                (false, false) => cm.true_negatives += 1,
            }
        }

        cm
    }

    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    /// Fraction of correct predictions. 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / total as f64
    }

    /// TP / (TP + FP). 0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    /// TP / (TP + FN). 0 when there are no positives.
    pub fn recall(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    /// Harmonic mean of precision and recall. 0 when both are 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}

// =============================================================================
// Threshold Metrics
// =============================================================================

macro_rules! threshold_metric {
    ($(#[$doc:meta])* $name:ident, $method:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub threshold: f32,
        }

        impl Default for $name {
            fn default() -> Self {
                Self { threshold: 0.5 }
            }
        }

        impl $name {
            /// Use a non-default decision threshold (e.g. 0.0 for margins).
            pub fn with_threshold(threshold: f32) -> Self {
                Self { threshold }
            }
        }

        impl MetricFn for $name {
            fn compute(&self, scores: &[f32], targets: &[f32]) -> f64 {
                ConfusionMatrix::from_scores(scores, targets, self.threshold).$method()
            }

            fn higher_is_better(&self) -> bool {
                true
            }

            fn name(&self) -> &'static str {
                $label
            }
        }
    };
}

threshold_metric!(
    /// Fraction of correct predictions at a fixed threshold.
    Accuracy,
    accuracy,
    "accuracy"
);
threshold_metric!(
    /// Positive predictive value at a fixed threshold.
    Precision,
    precision,
    "precision"
);
threshold_metric!(
    /// True positive rate at a fixed threshold.
    Recall,
    recall,
    "recall"
);
threshold_metric!(
    /// F1 score at a fixed threshold.
    F1,
    f1,
    "f1"
);

// =============================================================================
// LogLoss
// =============================================================================

/// Binary cross-entropy over probability scores. Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLoss;

impl MetricFn for LogLoss {
    fn compute(&self, scores: &[f32], targets: &[f32]) -> f64 {
        assert_eq!(scores.len(), targets.len(), "scores and targets must align");
        if scores.is_empty() {
            return 0.0;
        }

        const EPS: f64 = 1e-15;

        let total: f64 = scores
            .iter()
            .zip(targets)
            .map(|(&p, &y)| {
                let p = (p as f64).clamp(EPS, 1.0 - EPS);
                let y = y as f64;
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum();
        total / scores.len() as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "logloss"
    }
}

// =============================================================================
// AUC
// =============================================================================

/// Area under the ROC curve. Rank-based with tie averaging, so it works on
/// margins as well as probabilities. Degenerate label sets score 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct Auc;

impl MetricFn for Auc {
    fn compute(&self, scores: &[f32], targets: &[f32]) -> f64 {
        assert_eq!(scores.len(), targets.len(), "scores and targets must align");

        let n = scores.len();
        let n_pos = targets.iter().filter(|&&t| t > 0.5).count();
        let n_neg = n - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return 0.5;
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[a].partial_cmp(&scores[b]).unwrap_or(std::cmp::Ordering::Equal)
        });

        // Sum the (tie-averaged) ascending ranks of the positive samples.
        let mut rank_sum_pos = 0.0f64;
        let mut i = 0;
        while i < n {
            let mut j = i + 1;
            while j < n && (scores[order[i]] - scores[order[j]]).abs() < 1e-10 {
                j += 1;
            }

            let avg_rank = (i + j + 1) as f64 / 2.0;
            for &idx in &order[i..j] {
                if targets[idx] > 0.5 {
                    rank_sum_pos += avg_rank;
                }
            }

            i = j;
        }

        let n_pos = n_pos as f64;
        let n_neg = n_neg as f64;
        (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "auc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn confusion_matrix_counts() {
        let scores = [0.9f32, 0.8, 0.4, 0.2];
        let targets = [1.0f32, 0.0, 1.0, 0.0];
        let cm = ConfusionMatrix::from_scores(&scores, &targets, 0.5);

        assert_eq!(cm.true_positives, 1);
        assert_eq!(cm.false_positives, 1);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.true_negatives, 1);
        assert_abs_diff_eq!(cm.accuracy(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.precision(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.recall(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.f1(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_matrix_is_zero_not_nan() {
        let cm = ConfusionMatrix::from_scores(&[0.1, 0.2], &[0.0, 0.0], 0.5);
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
    }

    #[rstest]
    #[case(&[0.9, 0.1, 0.8, 0.2], &[1.0, 0.0, 1.0, 0.0], 1.0)]
    #[case(&[0.9, 0.9, 0.1, 0.1], &[1.0, 0.0, 1.0, 0.0], 0.5)]
    fn accuracy_cases(#[case] scores: &[f32], #[case] targets: &[f32], #[case] expected: f64) {
        let acc = Accuracy::default().compute(scores, targets);
        assert_abs_diff_eq!(acc, expected, epsilon = 1e-12);
    }

    #[test]
    fn f1_matches_hand_computation() {
        // TP=2, FP=1, FN=1 -> precision 2/3, recall 2/3, f1 2/3.
        let scores = [0.9f32, 0.8, 0.7, 0.1, 0.9];
        let targets = [1.0f32, 1.0, 0.0, 1.0, 0.0];
        assert_abs_diff_eq!(F1::default().compute(&scores, &targets), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn margin_threshold_variant() {
        let margins = [1.5f32, -0.5, 0.5, -2.0];
        let targets = [1.0f32, 0.0, 1.0, 0.0];
        let acc = Accuracy::with_threshold(0.0).compute(&margins, &targets);
        assert_abs_diff_eq!(acc, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn logloss_bounds() {
        let perfect = LogLoss.compute(&[0.9999, 0.0001], &[1.0, 0.0]);
        assert!(perfect < 0.01);

        let uniform = LogLoss.compute(&[0.5, 0.5], &[1.0, 0.0]);
        assert_abs_diff_eq!(uniform, std::f64::consts::LN_2, epsilon = 1e-6);
    }

    #[test]
    fn auc_perfect_and_worst() {
        let targets = [1.0f32, 1.0, 0.0, 0.0];
        assert_abs_diff_eq!(Auc.compute(&[0.9, 0.8, 0.3, 0.2], &targets), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Auc.compute(&[0.2, 0.3, 0.8, 0.9], &targets), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn auc_ties_average() {
        let targets = [1.0f32, 0.0, 1.0, 0.0];
        assert_abs_diff_eq!(Auc.compute(&[0.5, 0.5, 0.5, 0.5], &targets), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn auc_degenerate_labels() {
        assert_eq!(Auc.compute(&[0.1, 0.9], &[1.0, 1.0]), 0.5);
    }

    #[test]
    fn metric_directions_and_names() {
        assert!(Accuracy::default().higher_is_better());
        assert!(F1::default().higher_is_better());
        assert!(!LogLoss.higher_is_better());
        assert!(Auc.higher_is_better());
        assert_eq!(F1::default().name(), "f1");
        assert_eq!(Precision::default().name(), "precision");
        assert_eq!(Recall::default().name(), "recall");
        assert_eq!(Auc.name(), "auc");
    }
}
