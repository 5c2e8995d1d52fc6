//! Split gain computation and regularization parameters.

/// Parameters for split gain and leaf weight computation.
///
/// Static for the lifetime of training; control regularization and split
/// admissibility.
#[derive(Clone, Debug)]
pub struct GainParams {
    /// L2 regularization (lambda).
    pub reg_lambda: f32,
    /// L1 regularization (alpha), applied to leaf weights by soft
    /// thresholding.
    pub reg_alpha: f32,
    /// Minimum gain for a split to be kept (gamma).
    pub min_gain: f32,
    /// Minimum hessian sum per child.
    pub min_child_weight: f32,
    /// Minimum samples per child.
    pub min_samples_leaf: u32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            min_gain: 0.0,
            min_child_weight: 1.0,
            min_samples_leaf: 1,
        }
    }
}

impl GainParams {
    /// Split gain:
    ///
    /// ```text
    /// gain = 0.5 * [G_L^2/(H_L + lambda) + G_R^2/(H_R + lambda) - G_P^2/(H_P + lambda)] - gamma
    /// ```
    #[inline]
    pub fn split_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
        grad_parent: f64,
        hess_parent: f64,
    ) -> f32 {
        let lambda = self.reg_lambda as f64;

        let score_left = grad_left * grad_left / (hess_left + lambda);
        let score_right = grad_right * grad_right / (hess_right + lambda);
        let score_parent = grad_parent * grad_parent / (hess_parent + lambda);

        (0.5 * (score_left + score_right - score_parent) - self.min_gain as f64) as f32
    }

    /// Whether both children satisfy the hessian and sample-count floors.
    #[inline]
    pub fn is_admissible(
        &self,
        hess_left: f64,
        hess_right: f64,
        count_left: u32,
        count_right: u32,
    ) -> bool {
        hess_left >= self.min_child_weight as f64
            && hess_right >= self.min_child_weight as f64
            && count_left >= self.min_samples_leaf
            && count_right >= self.min_samples_leaf
    }

    /// Regularized Newton leaf weight:
    ///
    /// ```text
    /// weight = -sign(G) * max(0, |G| - alpha) / (H + lambda)
    /// ```
    #[inline]
    pub fn leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f32 {
        let lambda = self.reg_lambda as f64;
        let alpha = self.reg_alpha as f64;

        if alpha == 0.0 {
            (-grad_sum / (hess_sum + lambda)) as f32
        } else {
            let abs_grad = grad_sum.abs();
            if abs_grad <= alpha {
                0.0
            } else {
                let sign = if grad_sum > 0.0 { -1.0 } else { 1.0 };
                (sign * (abs_grad - alpha) / (hess_sum + lambda)) as f32
            }
        }
    }
}

/// Best split found for a node, if any.
#[derive(Clone, Copy, Debug)]
pub struct SplitCandidate {
    pub feature: u32,
    /// Midpoint between the adjacent distinct values around the cut.
    pub threshold: f32,
    pub gain: f32,
}

impl SplitCandidate {
    /// Keep the better of two candidates. Ties keep the incumbent, so lower
    /// feature indices win (features are scanned in order).
    pub fn better_of(current: Option<SplitCandidate>, challenger: SplitCandidate) -> Option<SplitCandidate> {
        match current {
            Some(best) if best.gain >= challenger.gain => Some(best),
            _ => Some(challenger),
        }
    }
}
