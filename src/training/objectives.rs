//! Objective (loss) functions.
//!
//! Objectives compute first and second derivatives of the loss with respect
//! to the raw margin, which both the tree trainer (Newton leaf weights) and
//! the linear trainer (Newton coordinate steps) consume. They also know how
//! to turn margins into final scores via [`OutputTransform`].

// =============================================================================
// Gradient Storage
// =============================================================================

/// One sample's `(gradient, hessian)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradsTuple {
    pub grad: f32,
    pub hess: f32,
}

// =============================================================================
// Score Transforms
// =============================================================================

/// Semantic kind of transformed scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Raw margins (unbounded decision scores).
    Margin,
    /// Probabilities in (0, 1).
    Probability,
}

/// Inference-time margin transformation.
///
/// Persisted with fitted models so scoring does not need the training
/// objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTransform {
    /// No transformation; score = margin.
    #[default]
    Identity,

    /// Logistic sigmoid: score = 1 / (1 + exp(-margin)).
    Sigmoid,
}

impl OutputTransform {
    /// Apply the transformation in-place.
    ///
    /// Sigmoid clamps input to `[-500, 500]`; NaN propagates.
    pub fn apply_inplace(&self, scores: &mut [f32]) {
        match self {
            OutputTransform::Identity => {}
            OutputTransform::Sigmoid => {
                for x in scores.iter_mut() {
                    *x = sigmoid(*x);
                }
            }
        }
    }

    /// Semantic kind of the transformed scores.
    pub fn kind(&self) -> ScoreKind {
        match self {
            OutputTransform::Identity => ScoreKind::Margin,
            OutputTransform::Sigmoid => ScoreKind::Probability,
        }
    }
}

/// Numerically stable sigmoid.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    let clamped = x.clamp(-500.0, 500.0);
    if clamped >= 0.0 {
        1.0 / (1.0 + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (1.0 + e)
    }
}

// =============================================================================
// ObjectiveFn
// =============================================================================

/// An objective function for gradient-based training.
///
/// Targets are binary `{0, 1}` for the classification objectives and
/// continuous for [`SquaredLoss`]. All slices are indexed by sample.
pub trait ObjectiveFn: Send + Sync {
    /// Compute `(grad, hess)` for every sample into `grad_hess`.
    ///
    /// # Panics
    ///
    /// Panics if slice lengths disagree.
    fn compute_gradients_into(&self, margins: &[f32], targets: &[f32], grad_hess: &mut [GradsTuple]);

    /// Optimal constant margin before any model terms.
    fn base_score(&self, targets: &[f32]) -> f32;

    /// Mean loss of the given margins (used for learning curves).
    fn loss(&self, margins: &[f32], targets: &[f32]) -> f64;

    /// How margins become final scores.
    fn output_transform(&self) -> OutputTransform;

    /// Name for logging.
    fn name(&self) -> &'static str;
}

fn check_lengths(margins: &[f32], targets: &[f32], grad_hess: &[GradsTuple]) {
    assert_eq!(margins.len(), targets.len(), "margins and targets must align");
    assert_eq!(margins.len(), grad_hess.len(), "gradient buffer must align with margins");
}

// =============================================================================
// LogisticLoss
// =============================================================================

/// Binary logistic loss (deviance). Labels in `{0, 1}`, margins are log-odds.
///
/// - Gradient: `sigmoid(m) - y`
/// - Hessian: `sigmoid(m) * (1 - sigmoid(m))`, floored for Newton stability
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticLoss;

impl ObjectiveFn for LogisticLoss {
    fn compute_gradients_into(&self, margins: &[f32], targets: &[f32], grad_hess: &mut [GradsTuple]) {
        check_lengths(margins, targets, grad_hess);

        const HESS_MIN: f32 = 1e-6;

        for ((pair, &m), &y) in grad_hess.iter_mut().zip(margins).zip(targets) {
            let p = sigmoid(m);
            pair.grad = p - y;
            pair.hess = (p * (1.0 - p)).max(HESS_MIN);
        }
    }

    fn base_score(&self, targets: &[f32]) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }
        let pos: f64 = targets.iter().map(|&t| t as f64).sum();
        let p = (pos / targets.len() as f64).clamp(1e-7, 1.0 - 1e-7);
        (p / (1.0 - p)).ln() as f32
    }

    fn loss(&self, margins: &[f32], targets: &[f32]) -> f64 {
        if margins.is_empty() {
            return 0.0;
        }
        // Stable binary cross-entropy from margins:
        // max(m, 0) - m*y + ln(1 + exp(-|m|))
        let total: f64 = margins
            .iter()
            .zip(targets)
            .map(|(&m, &y)| {
                let m = m as f64;
                let y = y as f64;
                m.max(0.0) - m * y + (-m.abs()).exp().ln_1p()
            })
            .sum();
        total / margins.len() as f64
    }

    fn output_transform(&self) -> OutputTransform {
        OutputTransform::Sigmoid
    }

    fn name(&self) -> &'static str {
        "logistic"
    }
}

// =============================================================================
// HingeLoss
// =============================================================================

/// Hinge loss for SVM-style binary classification. Labels in `{0, 1}` are
/// converted to `{-1, +1}` internally.
///
/// - Gradient: `-y` when `y * m < 1`, else `0`
/// - Hessian: `1` (constant, keeps Newton steps bounded)
#[derive(Debug, Clone, Copy, Default)]
pub struct HingeLoss;

impl ObjectiveFn for HingeLoss {
    fn compute_gradients_into(&self, margins: &[f32], targets: &[f32], grad_hess: &mut [GradsTuple]) {
        check_lengths(margins, targets, grad_hess);

        for ((pair, &m), &t) in grad_hess.iter_mut().zip(margins).zip(targets) {
            let y = if t > 0.5 { 1.0f32 } else { -1.0 };
            pair.grad = if y * m < 1.0 { -y } else { 0.0 };
            pair.hess = 1.0;
        }
    }

    fn base_score(&self, _targets: &[f32]) -> f32 {
        0.0
    }

    fn loss(&self, margins: &[f32], targets: &[f32]) -> f64 {
        if margins.is_empty() {
            return 0.0;
        }
        let total: f64 = margins
            .iter()
            .zip(targets)
            .map(|(&m, &t)| {
                let y = if t > 0.5 { 1.0f64 } else { -1.0 };
                (1.0 - y * m as f64).max(0.0)
            })
            .sum();
        total / margins.len() as f64
    }

    fn output_transform(&self) -> OutputTransform {
        OutputTransform::Identity
    }

    fn name(&self) -> &'static str {
        "hinge"
    }
}

// =============================================================================
// SquaredLoss
// =============================================================================

/// Squared error for regression. Kept as the non-classification baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredLoss;

impl ObjectiveFn for SquaredLoss {
    fn compute_gradients_into(&self, margins: &[f32], targets: &[f32], grad_hess: &mut [GradsTuple]) {
        check_lengths(margins, targets, grad_hess);

        for ((pair, &m), &t) in grad_hess.iter_mut().zip(margins).zip(targets) {
            pair.grad = m - t;
            pair.hess = 1.0;
        }
    }

    fn base_score(&self, targets: &[f32]) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }
        let sum: f64 = targets.iter().map(|&t| t as f64).sum();
        (sum / targets.len() as f64) as f32
    }

    fn loss(&self, margins: &[f32], targets: &[f32]) -> f64 {
        if margins.is_empty() {
            return 0.0;
        }
        let total: f64 = margins
            .iter()
            .zip(targets)
            .map(|(&m, &t)| {
                let d = (m - t) as f64;
                d * d
            })
            .sum();
        total / margins.len() as f64
    }

    fn output_transform(&self) -> OutputTransform {
        OutputTransform::Identity
    }

    fn name(&self) -> &'static str {
        "squared"
    }
}
