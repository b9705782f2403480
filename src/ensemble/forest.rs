//! Random forest regressor.
//!
//! Bootstrap-aggregated regression trees: each tree is grown to purity (within
//! the configured limits) on its own bootstrap sample, choosing among a random
//! subset of features at every node. Predictions are the mean over trees.

use bon::Builder;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::params::{ParamError, ParamSet, ParamValue, RandomState};
use super::{check_features, Estimator, FitError, Regressor, PREDICT_BLOCK};
use crate::data::{BinnedDataset, BinnedDatasetBuilder, Dataset};
use crate::repr::Tree;
use crate::training::gbdt::{bootstrap_indices, GainParams, GrowerParams, TreeGrower, DEFAULT_HISTOGRAM_CACHE};
use crate::training::{Gradients, ObjectiveFn, SquaredLoss};
use crate::utils::{resolve_threads, run_with_threads, Parallelism};

// =============================================================================
// MaxFeatures
// =============================================================================

/// Number of features considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Every feature.
    #[default]
    All,
    /// `floor(sqrt(n_features))`.
    Sqrt,
    /// `floor(log2(n_features))`.
    Log2,
    /// A fixed count (capped at `n_features`).
    Count(usize),
    /// A fraction of `n_features`, in `(0, 1]`.
    Fraction(f32),
}

impl MaxFeatures {
    /// Concrete feature count for a dataset with `n_features` features (at least 1).
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::Count(c) => c,
            MaxFeatures::Fraction(f) => (f as f64 * n).floor() as usize,
        };
        k.clamp(1, n_features.max(1))
    }

    fn validate(self) -> Result<(), ParamError> {
        match self {
            MaxFeatures::Count(0) => Err(ParamError::out_of_range("max_features", "must be at least 1", 0)),
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(ParamError::out_of_range("max_features", "must be in (0, 1]", f))
            }
            _ => Ok(()),
        }
    }

    fn from_param(name: &str, value: &ParamValue) -> Result<Self, ParamError> {
        if value.is_none() {
            return Ok(MaxFeatures::All);
        }
        match value {
            ParamValue::Str(s) => match s.to_ascii_lowercase().as_str() {
                "all" => Ok(MaxFeatures::All),
                "sqrt" => Ok(MaxFeatures::Sqrt),
                "log2" => Ok(MaxFeatures::Log2),
                _ => Err(value.type_error(name, "\"sqrt\", \"log2\", \"all\", a count or a fraction")),
            },
            ParamValue::Int(_) => Ok(MaxFeatures::Count(value.as_usize(name)?)),
            ParamValue::Float(f) => Ok(MaxFeatures::Fraction(*f as f32)),
            _ => Err(value.type_error(name, "\"sqrt\", \"log2\", \"all\", a count or a fraction")),
        }
    }
}

impl From<MaxFeatures> for ParamValue {
    fn from(v: MaxFeatures) -> Self {
        match v {
            MaxFeatures::All => ParamValue::None,
            MaxFeatures::Sqrt => ParamValue::Str("sqrt".into()),
            MaxFeatures::Log2 => ParamValue::Str("log2".into()),
            MaxFeatures::Count(c) => c.into(),
            MaxFeatures::Fraction(f) => f.into(),
        }
    }
}

// =============================================================================
// ForestParams
// =============================================================================

/// Random forest hyper-parameters.
///
/// # Example
///
/// ```
/// use ensemble_bench::ensemble::{ForestParams, MaxFeatures};
///
/// let params = ForestParams::builder()
///     .n_estimators(50)
///     .min_samples_leaf(5)
///     .max_features(MaxFeatures::Sqrt)
///     .build()
///     .unwrap();
/// assert!(params.bootstrap);
///
/// assert!(ForestParams::builder().n_estimators(0).build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct ForestParams {
    /// Number of trees. Default: 100.
    #[builder(default = 100)]
    pub n_estimators: usize,

    /// Maximum tree depth. `None` grows until leaves are pure or too small.
    pub max_depth: Option<u32>,

    /// Minimum samples a node needs to be split. Default: 2.
    #[builder(default = 2)]
    pub min_samples_split: u32,

    /// Minimum samples in each leaf. Default: 1.
    #[builder(default = 1)]
    pub min_samples_leaf: u32,

    /// Features considered per split. Default: all.
    #[builder(default)]
    pub max_features: MaxFeatures,

    /// Train each tree on a bootstrap sample. Default: true.
    #[builder(default = true)]
    pub bootstrap: bool,

    /// Bootstrap sample size. `None` draws `n_samples` rows.
    pub max_samples: Option<usize>,

    /// Value bins per feature. Default: 255.
    #[builder(default = 255)]
    pub max_bins: u32,

    /// Worker threads (0 = all cores).
    #[builder(default)]
    pub n_jobs: usize,

    /// Seed source. Default: seed 0.
    #[builder(default)]
    pub random_state: RandomState,
}

impl<S: forest_params_builder::IsComplete> ForestParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> Result<ForestParams, ParamError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

impl ForestParams {
    /// Check every parameter range.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.n_estimators == 0 {
            return Err(ParamError::out_of_range("n_estimators", "must be at least 1", 0));
        }
        if self.max_depth == Some(0) {
            return Err(ParamError::out_of_range("max_depth", "must be at least 1", 0));
        }
        if self.min_samples_split < 2 {
            return Err(ParamError::out_of_range(
                "min_samples_split",
                "must be at least 2",
                self.min_samples_split,
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ParamError::out_of_range("min_samples_leaf", "must be at least 1", 0));
        }
        if self.max_samples == Some(0) {
            return Err(ParamError::out_of_range("max_samples", "must be at least 1", 0));
        }
        if !(2..=255).contains(&self.max_bins) {
            return Err(ParamError::out_of_range("max_bins", "must be in 2..=255", self.max_bins));
        }
        self.max_features.validate()
    }

    fn grower_params(&self, n_features: usize) -> GrowerParams {
        let k = self.max_features.resolve(n_features);
        GrowerParams {
            gain: GainParams {
                reg_lambda: 0.0,
                min_gain: 0.0,
                min_child_weight: 0.0,
                min_samples_leaf: self.min_samples_leaf,
            },
            learning_rate: 1.0,
            max_leaves: None,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: (k < n_features).then_some(k),
        }
    }
}

// =============================================================================
// RandomForestRegressor
// =============================================================================

/// Bagged regression trees.
///
/// # Example
///
/// ```
/// use ensemble_bench::ensemble::{ForestParams, RandomForestRegressor, Regressor};
/// use ensemble_bench::testing::synthetic_regression;
///
/// let data = synthetic_regression(200, 4, 0.1, 7);
/// let params = ForestParams::builder().n_estimators(10).build().unwrap();
/// let mut forest = RandomForestRegressor::new(params);
/// forest.fit(&data).unwrap();
/// assert_eq!(forest.n_trees(), 10);
/// assert!(forest.score(&data).unwrap() > 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RandomForestRegressor {
    params: ForestParams,
    trees: Vec<Tree>,
    n_features: Option<usize>,
}

impl RandomForestRegressor {
    /// Unfitted forest with the given parameters.
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_features: None,
        }
    }

    /// Parameters of this forest.
    pub fn forest_params(&self) -> &ForestParams {
        &self.params
    }

    /// Fitted trees (empty before `fit`).
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Grow one bagged tree. The tree's RNG decides both its bootstrap sample
/// and its feature-sampling seed.
fn grow_bagged_tree(
    binned: &BinnedDataset,
    gradients: &Gradients,
    params: &ForestParams,
    grower_params: &GrowerParams,
    tree_seed: u64,
) -> Tree {
    let mut rng = StdRng::seed_from_u64(tree_seed);
    let n_samples = binned.n_rows();
    let rows = params.bootstrap.then(|| {
        let n_draws = params.max_samples.map_or(n_samples, |m| m.min(n_samples));
        bootstrap_indices(n_samples, n_draws, &mut rng)
    });

    let mut grower = TreeGrower::new(
        binned,
        grower_params.clone(),
        DEFAULT_HISTOGRAM_CACHE,
        Parallelism::Sequential,
        rng.gen(),
    );
    grower.grow(binned, gradients, rows.as_deref())
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, dataset: &Dataset) -> Result<(), FitError> {
        if dataset.is_empty() || dataset.n_features() == 0 {
            return Err(FitError::EmptyDataset);
        }
        self.params.validate()?;
        let params = &self.params;
        let n_samples = dataset.n_samples();
        let n_features = dataset.n_features();
        let seed = params.random_state.seed();

        let _span = tracing::debug_span!(
            "forest_fit",
            n_estimators = params.n_estimators,
            n_samples,
            n_features
        )
        .entered();

        let binned = BinnedDatasetBuilder::new(params.max_bins).seed(seed).build(dataset)?;

        // With zero predictions, squared-loss leaf weights are leaf means.
        let mut gradients = Gradients::new(n_samples);
        SquaredLoss.compute_gradients(&vec![0.0; n_samples], dataset.target_slice(), &mut gradients);

        let grower_params = params.grower_params(n_features);
        let mut rng = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..params.n_estimators).map(|_| rng.gen()).collect();

        let n_jobs = resolve_threads(params.n_jobs);
        let trees = run_with_threads(n_jobs, |parallelism| {
            parallelism.maybe_par_map(tree_seeds, |tree_seed| {
                grow_bagged_tree(&binned, &gradients, params, &grower_params, tree_seed)
            })
        });

        let total_leaves: usize = trees.iter().map(Tree::n_leaves).sum();
        tracing::debug!(
            n_trees = trees.len(),
            mean_leaves = total_leaves as f64 / trees.len() as f64,
            "forest fitted"
        );

        self.trees = trees;
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict(&self, dataset: &Dataset) -> Result<Array1<f32>, FitError> {
        check_features(self.n_features, dataset)?;
        let n_trees = self.trees.len();
        let mut out = vec![0.0f32; dataset.n_samples()];

        let trees = &self.trees;
        run_with_threads(resolve_threads(self.params.n_jobs), |parallelism| {
            parallelism.maybe_par_chunks_mut(&mut out, PREDICT_BLOCK, |block, chunk| {
                let start = block * PREDICT_BLOCK;
                for tree in trees {
                    tree.predict_into(dataset, start, chunk);
                }
                let scale = 1.0 / n_trees as f32;
                chunk.iter_mut().for_each(|v| *v *= scale);
            })
        });

        Ok(Array1::from(out))
    }
}

impl Estimator for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "RandomForestRegressor"
    }

    fn params(&self) -> ParamSet {
        let p = &self.params;
        [
            ("n_estimators", ParamValue::from(p.n_estimators)),
            ("max_depth", p.max_depth.into()),
            ("min_samples_split", p.min_samples_split.into()),
            ("min_samples_leaf", p.min_samples_leaf.into()),
            ("max_features", p.max_features.into()),
            ("bootstrap", p.bootstrap.into()),
            ("max_samples", p.max_samples.into()),
            ("max_bins", p.max_bins.into()),
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
            "n_estimators" => p.n_estimators = value.as_usize(name)?,
            "max_depth" => {
                p.max_depth = if value.is_none() {
                    None
                } else {
                    Some(value.as_u32(name)?)
                }
            }
            "min_samples_split" => p.min_samples_split = value.as_u32(name)?,
            "min_samples_leaf" => p.min_samples_leaf = value.as_u32(name)?,
            "max_features" => p.max_features = MaxFeatures::from_param(name, value)?,
            "bootstrap" => p.bootstrap = value.as_bool(name)?,
            "max_samples" => p.max_samples = value.as_optional_usize(name)?,
            "max_bins" => p.max_bins = value.as_u32(name)?,
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
