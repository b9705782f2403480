//! Regression objectives.

use super::ObjectiveFn;
use crate::training::Gradients;

/// Squared error loss, `½ (pred − y)²`.
///
/// Gradient is `pred − y`, hessian is `1`. With zero predictions the optimal
/// leaf value is the mean target of the leaf, which is what a bagged
/// regression tree needs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SquaredLoss;

impl ObjectiveFn for SquaredLoss {
    fn compute_gradients(&self, predictions: &[f32], targets: &[f32], gradients: &mut Gradients) {
        debug_assert_eq!(predictions.len(), targets.len());
        debug_assert_eq!(gradients.n_samples(), targets.len());

        let (grad, hess) = gradients.as_mut_slices();
        for ((g, &p), &y) in grad.iter_mut().zip(predictions).zip(targets) {
            *g = p - y;
        }
        hess.fill(1.0);
    }

    fn base_score(&self, targets: &[f32]) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }
        let sum: f64 = targets.iter().map(|&y| y as f64).sum();
        (sum / targets.len() as f64) as f32
    }

    fn loss(&self, predictions: &[f32], targets: &[f32]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let sum: f64 = predictions
            .iter()
            .zip(targets)
            .map(|(&p, &y)| {
                let d = p as f64 - y as f64;
                0.5 * d * d
            })
            .sum();
        sum / targets.len() as f64
    }

    fn name(&self) -> &'static str {
        "squared_error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_squared_loss_gradients() {
        let mut grads = Gradients::new(3);
        SquaredLoss.compute_gradients(&[1.0, 2.0, 0.0], &[0.5, 2.0, 1.0], &mut grads);
        assert_eq!(grads.grads(), &[0.5, 0.0, -1.0]);
        assert_eq!(grads.hess(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_squared_loss_base_score_is_mean() {
        assert_abs_diff_eq!(SquaredLoss.base_score(&[1.0, 2.0, 6.0]), 3.0);
        assert_eq!(SquaredLoss.base_score(&[]), 0.0);
    }

    #[test]
    fn test_squared_loss_value() {
        // ½ * (1² + 2²) / 2 = 1.25
        assert_abs_diff_eq!(SquaredLoss.loss(&[1.0, 2.0], &[0.0, 0.0]), 1.25);
    }
}
