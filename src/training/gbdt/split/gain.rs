//! Gain computation and regularization parameters.

// =============================================================================
// Gain Parameters
// =============================================================================

/// Parameters for split gain computation and leaf weight calculation.
///
/// These parameters are static for the lifetime of training and control
/// regularization and splitting constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct GainParams {
    /// L2 regularization (lambda).
    pub reg_lambda: f32,
    /// Minimum split gain (gamma).
    pub min_gain: f32,
    /// Minimum sum of hessians per child.
    pub min_child_weight: f32,
    /// Minimum samples per child.
    pub min_samples_leaf: u32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 0.0,
            min_gain: 0.0,
            min_child_weight: 1e-3,
            min_samples_leaf: 1,
        }
    }
}

impl GainParams {
    /// Compute the split gain.
    ///
    /// ```text
    /// gain = 0.5 * [G_L²/(H_L + λ) + G_R²/(H_R + λ) - G_P²/(H_P + λ)] - γ
    /// ```
    ///
    /// Where:
    /// - G_L, G_R, G_P = gradient sums for left, right, parent
    /// - H_L, H_R, H_P = hessian sums for left, right, parent
    /// - λ = L2 regularization (reg_lambda)
    /// - γ = minimum gain threshold (min_gain)
    ///
    /// With squared error and λ = 0 this is half the reduction in sum of
    /// squared errors, i.e. the variance-reduction criterion of CART.
    #[inline]
    pub fn compute_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
        grad_parent: f64,
        hess_parent: f64,
    ) -> f64 {
        let score_left = self.score(grad_left, hess_left);
        let score_right = self.score(grad_right, hess_right);
        let score_parent = self.score(grad_parent, hess_parent);

        0.5 * (score_left + score_right - score_parent) - self.min_gain as f64
    }

    #[inline]
    fn score(&self, grad: f64, hess: f64) -> f64 {
        let denom = hess + self.reg_lambda as f64;
        if denom <= 0.0 {
            0.0
        } else {
            grad * grad / denom
        }
    }

    /// Check if a split satisfies minimum constraints.
    #[inline]
    pub fn is_valid_split(
        &self,
        hess_left: f64,
        hess_right: f64,
        count_left: u32,
        count_right: u32,
    ) -> bool {
        let min_weight = self.min_child_weight as f64;
        let min_samples = self.min_samples_leaf.max(1);

        hess_left >= min_weight
            && hess_right >= min_weight
            && count_left >= min_samples
            && count_right >= min_samples
    }

    /// Newton-step leaf weight, `-G / (H + λ)`.
    #[inline]
    pub fn compute_leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f32 {
        let denom = hess_sum + self.reg_lambda as f64;
        if denom <= 0.0 {
            return 0.0;
        }
        (-grad_sum / denom) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gain_computation() {
        let params = GainParams {
            reg_lambda: 1.0,
            ..Default::default()
        };

        let gain = params.compute_gain(
            10.0, 5.0,  // left: G=10, H=5
            -10.0, 5.0, // right: G=-10, H=5
            0.0, 10.0,  // parent: G=0, H=10
        );

        // score_left = score_right = 100/6, score_parent = 0
        assert_abs_diff_eq!(gain, 100.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gain_is_half_sse_reduction() {
        // targets [1, 1, 3, 3], predictions 0: grad = -y, hess = 1
        let params = GainParams::default();
        let gain = params.compute_gain(-2.0, 2.0, -6.0, 2.0, -8.0, 4.0);
        // SSE around parent mean 2: 4; children are pure: 0
        assert_abs_diff_eq!(gain, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_min_gain_is_subtracted() {
        let params = GainParams {
            min_gain: 0.5,
            ..Default::default()
        };
        let gain = params.compute_gain(-2.0, 2.0, -6.0, 2.0, -8.0, 4.0);
        assert_abs_diff_eq!(gain, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_valid_split_check() {
        let params = GainParams {
            min_child_weight: 5.0,
            min_samples_leaf: 10,
            ..Default::default()
        };

        assert!(params.is_valid_split(5.0, 5.0, 10, 10));
        assert!(!params.is_valid_split(4.0, 5.0, 10, 10)); // left hess too small
        assert!(!params.is_valid_split(5.0, 5.0, 9, 10)); // left count too small
    }

    #[test]
    fn test_empty_child_is_never_valid() {
        let params = GainParams {
            min_child_weight: 0.0,
            min_samples_leaf: 0,
            ..Default::default()
        };
        assert!(!params.is_valid_split(0.0, 3.0, 0, 3));
    }

    #[test]
    fn test_leaf_weight() {
        let params = GainParams {
            reg_lambda: 1.0,
            ..Default::default()
        };
        // -(-10) / (5 + 1)
        assert_abs_diff_eq!(params.compute_leaf_weight(-10.0, 5.0), 10.0 / 6.0, epsilon = 1e-6);
        // λ = 0, zero hessian
        assert_eq!(GainParams::default().compute_leaf_weight(1.0, 0.0), 0.0);
    }
}
