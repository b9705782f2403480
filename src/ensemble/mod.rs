//! Tree-ensemble regressors.
//!
//! - [`RandomForestRegressor`]: bootstrap-aggregated trees
//! - [`HistGradientBoostingRegressor`]: least-squares histogram boosting
//!
//! Both implement [`Regressor`] for fitting and scoring and [`Estimator`] for
//! name-based parameter access, which is all grid search needs.

mod boosting;
mod forest;
mod params;

pub use boosting::{
    EarlyStoppingMode, HistBoostParams, HistGradientBoostingRegressor, AUTO_EARLY_STOPPING_THRESHOLD,
};
pub use forest::{ForestParams, MaxFeatures, RandomForestRegressor};
pub use params::{ParamError, ParamSet, ParamValue, RandomState};

use ndarray::Array1;

use crate::data::{Dataset, DatasetError};
use crate::training::{MetricFn, R2};

/// Rows per prediction task.
pub(crate) const PREDICT_BLOCK: usize = 1024;

/// Errors raised by [`Regressor::fit`] and [`Regressor::predict`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// `predict` or `score` before `fit`.
    #[error("estimator is not fitted")]
    NotFitted,

    /// Training data without samples or features.
    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    /// Prediction data has a different feature count than the training data.
    #[error("estimator was fitted on {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Param(#[from] ParamError),
}

/// A regression model.
pub trait Regressor {
    /// Train on `dataset`, replacing any previous fit.
    fn fit(&mut self, dataset: &Dataset) -> Result<(), FitError>;

    /// Predict every sample of `dataset`.
    fn predict(&self, dataset: &Dataset) -> Result<Array1<f32>, FitError>;

    /// R² of the predictions on `dataset`.
    fn score(&self, dataset: &Dataset) -> Result<f64, FitError> {
        let predictions = self.predict(dataset)?;
        let predictions = predictions.to_vec();
        Ok(R2.compute(&predictions, dataset.target_slice()))
    }
}

/// A regressor that can be cloned and re-parameterized by name.
pub trait Estimator: Regressor + Clone + Send + Sync {
    /// Display name.
    fn name(&self) -> &'static str;

    /// Current values of every tunable parameter.
    fn params(&self) -> ParamSet;

    /// Unfitted copy with one parameter changed.
    fn with_param(&self, name: &str, value: &ParamValue) -> Result<Self, ParamError>;

    /// Unfitted copy with several parameters changed.
    fn with_params(&self, params: &ParamSet) -> Result<Self, ParamError> {
        params
            .iter()
            .try_fold(self.clone(), |est, (name, value)| est.with_param(name, value))
    }
}

/// Check that a fitted model can predict `dataset`.
pub(crate) fn check_features(fitted: Option<usize>, dataset: &Dataset) -> Result<(), FitError> {
    let expected = fitted.ok_or(FitError::NotFitted)?;
    if dataset.n_features() != expected {
        return Err(FitError::FeatureMismatch {
            expected,
            got: dataset.n_features(),
        });
    }
    Ok(())
}
