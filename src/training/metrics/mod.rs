//! Evaluation metrics for model quality.
//!
//! Metrics are separate from loss functions: a model is trained with one loss
//! but may be evaluated with different metrics.
//!
//! # Available Metrics
//!
//! - [`R2`]: Coefficient of determination
//! - [`Rmse`]: Root Mean Squared Error
//! - [`Mae`]: Mean Absolute Error

mod regression;

pub use regression::{r2_score, Mae, Rmse, R2};

/// A metric for evaluating model quality.
///
/// - Higher is better for some metrics (R²), lower for others (RMSE, MAE).
///   Use `higher_is_better()` to determine the direction.
pub trait MetricFn: Send + Sync {
    /// Compute the metric value over paired predictions and targets.
    fn compute(&self, predictions: &[f32], targets: &[f32]) -> f64;

    /// Whether higher values indicate better performance.
    fn higher_is_better(&self) -> bool;

    /// Name of the metric (for logging).
    fn name(&self) -> &'static str;
}
