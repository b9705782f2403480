//! Regression metrics.

use super::MetricFn;

// =============================================================================
// R²
// =============================================================================

/// Coefficient of determination, `1 − SS_res / SS_tot`.
///
/// Returns `NaN` for empty input. When the targets are constant
/// (`SS_tot = 0`) the score is `1.0` for perfect predictions and `0.0`
/// otherwise.
pub fn r2_score(predictions: &[f32], targets: &[f32]) -> f64 {
    debug_assert_eq!(predictions.len(), targets.len());
    if targets.is_empty() {
        return f64::NAN;
    }

    let n = targets.len() as f64;
    let mean = targets.iter().map(|&y| y as f64).sum::<f64>() / n;

    let (ss_res, ss_tot) = predictions
        .iter()
        .zip(targets)
        .fold((0.0f64, 0.0f64), |(res, tot), (&p, &y)| {
            let y = y as f64;
            let r = y - p as f64;
            let t = y - mean;
            (res + r * r, tot + t * t)
        });

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Coefficient of determination (see [`r2_score`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct R2;

impl MetricFn for R2 {
    fn compute(&self, predictions: &[f32], targets: &[f32]) -> f64 {
        r2_score(predictions, targets)
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}

// =============================================================================
// RMSE / MAE
// =============================================================================

/// Root Mean Squared Error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rmse;

impl MetricFn for Rmse {
    fn compute(&self, predictions: &[f32], targets: &[f32]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let sse: f64 = predictions
            .iter()
            .zip(targets)
            .map(|(&p, &y)| {
                let d = p as f64 - y as f64;
                d * d
            })
            .sum();
        (sse / targets.len() as f64).sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

/// Mean Absolute Error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mae;

impl MetricFn for Mae {
    fn compute(&self, predictions: &[f32], targets: &[f32]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let sae: f64 = predictions
            .iter()
            .zip(targets)
            .map(|(&p, &y)| (p as f64 - y as f64).abs())
            .sum();
        sae / targets.len() as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}
