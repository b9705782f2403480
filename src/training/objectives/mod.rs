//! Objective (loss) functions for gradient boosting.
//!
//! An objective turns current predictions and targets into per-sample
//! gradients and hessians, and supplies the constant initial prediction.
//!
//! # Available Objectives
//!
//! - [`SquaredLoss`]: Standard squared error (L2 loss)

mod regression;

pub use regression::SquaredLoss;

use crate::training::Gradients;

/// A differentiable training objective.
pub trait ObjectiveFn: Send + Sync {
    /// Fill `gradients` for the given predictions and targets.
    fn compute_gradients(&self, predictions: &[f32], targets: &[f32], gradients: &mut Gradients);

    /// Constant prediction minimizing the loss over `targets`.
    fn base_score(&self, targets: &[f32]) -> f32;

    /// Mean loss of `predictions` against `targets`.
    fn loss(&self, predictions: &[f32], targets: &[f32]) -> f64;

    /// Name of the objective (for logging).
    fn name(&self) -> &'static str;
}
