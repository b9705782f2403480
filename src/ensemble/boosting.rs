//! Histogram gradient boosting regressor.
//!
//! Least-squares gradient boosting: starting from the mean target, each
//! iteration fits one best-first histogram tree to the current gradients and
//! adds its shrunk output to the predictions.

use bon::Builder;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::params::{ParamError, ParamSet, ParamValue, RandomState};
use super::{check_features, Estimator, FitError, Regressor, PREDICT_BLOCK};
use crate::data::{BinnedDatasetBuilder, Dataset};
use crate::repr::Tree;
use crate::training::gbdt::{GainParams, GrowerParams, TreeGrower, DEFAULT_HISTOGRAM_CACHE};
use crate::training::{
    EarlyStopping, Gradients, Mae, MetricFn, ObjectiveFn, Rmse, SquaredLoss, TrainingLogger, Verbosity,
};
use crate::utils::{resolve_threads, run_with_threads};

/// Sample count above which `EarlyStoppingMode::Auto` turns early stopping on.
pub const AUTO_EARLY_STOPPING_THRESHOLD: usize = 10_000;

// =============================================================================
// EarlyStoppingMode
// =============================================================================

/// Whether boosting holds out a validation split and stops on a plateau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarlyStoppingMode {
    /// On when the training set has more than 10 000 samples.
    #[default]
    Auto,
    On,
    Off,
}

impl EarlyStoppingMode {
    /// Resolve for a training set of `n_samples`.
    pub fn enabled(self, n_samples: usize) -> bool {
        match self {
            EarlyStoppingMode::Auto => n_samples > AUTO_EARLY_STOPPING_THRESHOLD,
            EarlyStoppingMode::On => true,
            EarlyStoppingMode::Off => false,
        }
    }

    fn from_param(name: &str, value: &ParamValue) -> Result<Self, ParamError> {
        match value {
            ParamValue::Bool(true) => Ok(EarlyStoppingMode::On),
            ParamValue::Bool(false) => Ok(EarlyStoppingMode::Off),
            ParamValue::Str(s) if s.eq_ignore_ascii_case("auto") => Ok(EarlyStoppingMode::Auto),
            _ => Err(value.type_error(name, "a boolean or \"auto\"")),
        }
    }
}

impl From<EarlyStoppingMode> for ParamValue {
    fn from(v: EarlyStoppingMode) -> Self {
        match v {
            EarlyStoppingMode::Auto => ParamValue::Str("auto".into()),
            EarlyStoppingMode::On => ParamValue::Bool(true),
            EarlyStoppingMode::Off => ParamValue::Bool(false),
        }
    }
}

// =============================================================================
// HistBoostParams
// =============================================================================

/// Histogram gradient boosting hyper-parameters.
///
/// # Example
///
/// ```
/// use ensemble_bench::ensemble::{EarlyStoppingMode, HistBoostParams};
///
/// let params = HistBoostParams::builder()
///     .max_iter(300)
///     .max_leaf_nodes(15)
///     .early_stopping(EarlyStoppingMode::Off)
///     .build()
///     .unwrap();
/// assert_eq!(params.max_leaves(), Some(15));
///
/// assert!(HistBoostParams::builder().learning_rate(0.0).build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct HistBoostParams {
    /// Boosting iterations (one tree each). Default: 100.
    #[builder(default = 100)]
    pub max_iter: usize,

    /// Shrinkage applied to every tree. Default: 0.1.
    #[builder(default = 0.1)]
    pub learning_rate: f32,

    /// Leaves per tree; 0 means unlimited. Default: 31.
    #[builder(default = 31)]
    pub max_leaf_nodes: u32,

    /// Maximum tree depth. `None` = unlimited.
    pub max_depth: Option<u32>,

    /// Minimum samples in each leaf. Default: 20.
    #[builder(default = 20)]
    pub min_samples_leaf: u32,

    /// L2 regularization on leaf values. Default: 0.
    #[builder(default = 0.0)]
    pub l2_regularization: f32,

    /// Value bins per feature. Default: 255.
    #[builder(default = 255)]
    pub max_bins: u32,

    /// Early stopping mode. Default: auto.
    #[builder(default)]
    pub early_stopping: EarlyStoppingMode,

    /// Share of the training data held out for early stopping. Default: 0.1.
    #[builder(default = 0.1)]
    pub validation_fraction: f32,

    /// Iterations without improvement before stopping. Default: 10.
    #[builder(default = 10)]
    pub n_iter_no_change: usize,

    /// Minimum validation loss improvement. Default: 1e-7.
    #[builder(default = 1e-7)]
    pub tol: f64,

    /// Worker threads (0 = all cores).
    #[builder(default)]
    pub n_jobs: usize,

    /// Seed source. Default: seed 0.
    #[builder(default)]
    pub random_state: RandomState,

    /// Training progress output. Default: silent.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: hist_boost_params_builder::IsComplete> HistBoostParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<HistBoostParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl Default for HistBoostParams {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

impl HistBoostParams {
    /// Leaf limit for the grower.
    pub fn max_leaves(&self) -> Option<u32> {
        (self.max_leaf_nodes > 0).then_some(self.max_leaf_nodes)
    }

    /// Check every parameter range.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.max_iter == 0 {
            return Err(ParamError::out_of_range("max_iter", "must be at least 1", 0));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ParamError::out_of_range("learning_rate", "must be positive", self.learning_rate));
        }
        if self.max_leaf_nodes == 1 {
            return Err(ParamError::out_of_range("max_leaf_nodes", "must be at least 2 (or 0)", 1));
        }
        if self.max_depth == Some(0) {
            return Err(ParamError::out_of_range("max_depth", "must be at least 1", 0));
        }
        if self.min_samples_leaf == 0 {
            return Err(ParamError::out_of_range("min_samples_leaf", "must be at least 1", 0));
        }
        if !(self.l2_regularization >= 0.0) {
            return Err(ParamError::out_of_range(
                "l2_regularization",
                "must be non-negative",
                self.l2_regularization,
            ));
        }
        if !(2..=255).contains(&self.max_bins) {
            return Err(ParamError::out_of_range("max_bins", "must be in 2..=255", self.max_bins));
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(ParamError::out_of_range(
                "validation_fraction",
                "must be in (0, 1)",
                self.validation_fraction,
            ));
        }
        if self.n_iter_no_change == 0 {
            return Err(ParamError::out_of_range("n_iter_no_change", "must be at least 1", 0));
        }
        if !(self.tol >= 0.0) {
            return Err(ParamError::out_of_range("tol", "must be non-negative", self.tol));
        }
        Ok(())
    }

    fn grower_params(&self) -> GrowerParams {
        GrowerParams {
            gain: GainParams {
                reg_lambda: self.l2_regularization,
                min_samples_leaf: self.min_samples_leaf,
                ..GainParams::default()
            },
            learning_rate: self.learning_rate,
            max_leaves: self.max_leaves(),
            max_depth: self.max_depth,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

// =============================================================================
// HistGradientBoostingRegressor
// =============================================================================

/// Least-squares gradient boosting over histogram trees.
///
/// # Example
///
/// ```
/// use ensemble_bench::ensemble::{HistBoostParams, HistGradientBoostingRegressor, Regressor};
/// use ensemble_bench::testing::synthetic_regression;
///
/// let data = synthetic_regression(300, 4, 0.1, 7);
/// let params = HistBoostParams::builder().max_iter(50).build().unwrap();
/// let mut model = HistGradientBoostingRegressor::new(params);
/// model.fit(&data).unwrap();
/// assert_eq!(model.n_iter(), 50);
/// assert!(model.score(&data).unwrap() > 0.8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistGradientBoostingRegressor {
    params: HistBoostParams,
    base_score: f32,
    trees: Vec<Tree>,
    validation_losses: Vec<f64>,
    n_features: Option<usize>,
}

impl HistGradientBoostingRegressor {
    /// Unfitted model with the given parameters.
    pub fn new(params: HistBoostParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
            validation_losses: Vec::new(),
            n_features: None,
        }
    }

    /// Parameters of this model.
    pub fn boost_params(&self) -> &HistBoostParams {
        &self.params
    }

    /// Number of boosting iterations actually run.
    pub fn n_iter(&self) -> usize {
        self.trees.len()
    }

    /// Fitted trees, in boosting order.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Initial prediction (mean training target).
    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    /// Validation loss before the first and after every iteration
    /// (empty when early stopping was off).
    pub fn validation_losses(&self) -> &[f64] {
        &self.validation_losses
    }
}

/// Shuffle `0..n` and cut off `n_validation` indices; both parts sorted.
fn train_validation_split(n: usize, n_validation: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let mut validation = indices[..n_validation].to_vec();
    let mut train = indices[n_validation..].to_vec();
    validation.sort_unstable();
    train.sort_unstable();
    (train, validation)
}

impl Regressor for HistGradientBoostingRegressor {
    fn fit(&mut self, dataset: &Dataset) -> Result<(), FitError> {
        if dataset.is_empty() || dataset.n_features() == 0 {
            return Err(FitError::EmptyDataset);
        }
        self.params.validate()?;
        let params = self.params.clone();
        let seed = params.random_state.seed();
        let n_samples = dataset.n_samples();

        // Hold out a validation split; too small sets cannot afford one.
        let n_validation = ((n_samples as f64) * params.validation_fraction as f64).ceil() as usize;
        let early_stopping = params.early_stopping.enabled(n_samples) && n_validation < n_samples;
        let split = if early_stopping {
            let (train, validation) = train_validation_split(n_samples, n_validation.max(1), seed);
            Some((dataset.select(&train)?, dataset.select(&validation)?))
        } else {
            None
        };
        let (train, validation) = match &split {
            Some((train, validation)) => (train, Some(validation)),
            None => (dataset, None),
        };

        let _span = tracing::debug_span!(
            "hist_boosting_fit",
            max_iter = params.max_iter,
            n_samples = train.n_samples(),
            early_stopping
        )
        .entered();

        let binned = BinnedDatasetBuilder::new(params.max_bins).seed(seed).build(train)?;
        let targets = train.target_slice();
        let n_train = targets.len();

        let objective = SquaredLoss;
        let base_score = objective.base_score(targets);
        let mut predictions = vec![base_score; n_train];
        let mut gradients = Gradients::new(n_train);

        let mut validation_predictions = validation.map(|v| vec![base_score; v.n_samples()]);
        let mut stopper = EarlyStopping::new(params.n_iter_no_change, params.tol, false);
        let mut validation_losses = Vec::new();
        if let (Some(v), Some(preds)) = (validation, &validation_predictions) {
            let loss = objective.loss(preds, v.target_slice());
            stopper.should_stop(loss);
            validation_losses.push(loss);
        }

        let mut logger = TrainingLogger::new("hist_gradient_boosting", params.verbosity);
        logger.start_training(params.max_iter, n_train, train.n_features());

        let n_jobs = resolve_threads(params.n_jobs);
        let trees = run_with_threads(n_jobs, |parallelism| {
            let mut grower = TreeGrower::new(
                &binned,
                params.grower_params(),
                DEFAULT_HISTOGRAM_CACHE,
                parallelism,
                seed,
            );
            let mut trees = Vec::with_capacity(params.max_iter);

            for iteration in 0..params.max_iter {
                objective.compute_gradients(&predictions, targets, &mut gradients);
                let tree = grower.grow(&binned, &gradients, None);
                grower.update_predictions(&mut predictions);

                let n_leaves = tree.n_leaves();
                logger.log_round(iteration, n_leaves);

                if let (Some(v), Some(preds)) = (validation, validation_predictions.as_mut()) {
                    tree.predict_into(v, 0, preds);
                }
                trees.push(tree);

                if n_leaves == 1 {
                    logger.info("tree has a single leaf, nothing left to fit");
                    break;
                }

                if let (Some(v), Some(preds)) = (validation, &validation_predictions) {
                    let loss = objective.loss(preds, v.target_slice());
                    validation_losses.push(loss);
                    if logger.logs_metrics(iteration) {
                        let valid_targets = v.target_slice();
                        logger.log_metrics(
                            iteration,
                            &[
                                ("train_loss", objective.loss(&predictions, targets)),
                                ("valid_loss", loss),
                                (Rmse.name(), Rmse.compute(preds, valid_targets)),
                                (Mae.name(), Mae.compute(preds, valid_targets)),
                            ],
                        );
                    }
                    if stopper.should_stop(loss) {
                        logger.log_early_stopping(
                            iteration,
                            stopper.best_round(),
                            stopper.best_value().unwrap_or(loss),
                        );
                        break;
                    }
                }
            }
            trees
        });

        logger.finish_training(trees.len());

        self.base_score = base_score;
        self.trees = trees;
        self.validation_losses = validation_losses;
        self.n_features = Some(dataset.n_features());
        Ok(())
    }

    fn predict(&self, dataset: &Dataset) -> Result<Array1<f32>, FitError> {
        check_features(self.n_features, dataset)?;
        let mut out = vec![self.base_score; dataset.n_samples()];

        let trees = &self.trees;
        run_with_threads(resolve_threads(self.params.n_jobs), |parallelism| {
            parallelism.maybe_par_chunks_mut(&mut out, PREDICT_BLOCK, |block, chunk| {
                let start = block * PREDICT_BLOCK;
                for tree in trees {
                    tree.predict_into(dataset, start, chunk);
                }
            })
        });

        Ok(Array1::from(out))
    }
}

impl Estimator for HistGradientBoostingRegressor {
    fn name(&self) -> &'static str {
        "HistGradientBoostingRegressor"
    }

    fn params(&self) -> ParamSet {
        let p = &self.params;
        [
            ("max_iter", ParamValue::from(p.max_iter)),
            ("learning_rate", p.learning_rate.into()),
            ("max_leaf_nodes", p.max_leaves().into()),
            ("max_depth", p.max_depth.into()),
            ("min_samples_leaf", p.min_samples_leaf.into()),
            ("l2_regularization", p.l2_regularization.into()),
            ("max_bins", p.max_bins.into()),
            ("early_stopping", p.early_stopping.into()),
            ("n_jobs", p.n_jobs.into()),
            ("random_state", p.random_state.into()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn with_param(&self, name: &str, value: &ParamValue) -> Result<Self, ParamError> {
        let mut p = self.params.clone();
        match name {
            "max_iter" => p.max_iter = value.as_usize(name)?,
            "learning_rate" => p.learning_rate = value.as_f64(name)? as f32,
            "max_leaf_nodes" => {
                p.max_leaf_nodes = if value.is_none() { 0 } else { value.as_u32(name)? }
            }
            "max_depth" => {
                p.max_depth = if value.is_none() {
                    None
                } else {
                    Some(value.as_u32(name)?)
                }
            }
            "min_samples_leaf" => p.min_samples_leaf = value.as_u32(name)?,
            "l2_regularization" => p.l2_regularization = value.as_f64(name)? as f32,
            "max_bins" => p.max_bins = value.as_u32(name)?,
            "early_stopping" => p.early_stopping = EarlyStoppingMode::from_param(name, value)?,
            "validation_fraction" => p.validation_fraction = value.as_f64(name)? as f32,
            "n_iter_no_change" => p.n_iter_no_change = value.as_usize(name)?,
            "tol" => p.tol = value.as_f64(name)?,
            "n_jobs" => p.n_jobs = value.as_usize(name)?,
            "random_state" => p.random_state = RandomState::from_param(name, value)?,
            _ => {
                return Err(ParamError::Unknown {
                    estimator: self.name(),
                    name: name.to_string(),
                })
            }
        }
        p.validate()?;
        Ok(Self::new(p))
    }
}
