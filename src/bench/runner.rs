//! Run a [`BenchmarkConfig`] end to end.

use std::time::Instant;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::{BenchmarkConfig, DatasetConfig, ModelConfig, ModelKind};
use crate::data::io::{load_california_housing, load_csv};
use crate::data::Dataset;
use crate::ensemble::{Estimator, HistGradientBoostingRegressor, ParamSet, ParamValue, RandomForestRegressor};
use crate::error::Result;
use crate::model_selection::{CvResults, GridSearchCv};
use crate::testing::synthetic_housing;
use crate::utils::{available_cores, mean_std, resolve_threads};

/// Shape and target statistics of the benchmark data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub source: String,
    pub n_samples: usize,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub target_mean: f64,
    pub target_std: f64,
}

impl DatasetSummary {
    pub fn new(source: String, dataset: &Dataset) -> Self {
        let targets: Vec<f64> = dataset.target_slice().iter().map(|&y| y as f64).collect();
        let (target_mean, target_std) = mean_std(&targets);
        Self {
            source,
            n_samples: dataset.n_samples(),
            n_features: dataset.n_features(),
            feature_names: dataset.feature_names().to_vec(),
            target_mean,
            target_std,
        }
    }
}

/// Grid-search outcome for one model entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Display name from the config.
    pub model: String,
    pub kind: ModelKind,
    /// Swept parameter name(s).
    pub param_name: String,
    pub cv_results: CvResults,
    pub best_params: ParamSet,
    pub best_score: f64,
    /// Worker threads the estimator trained with.
    pub n_jobs: usize,
    /// Wall time of the whole search in seconds.
    pub search_time: f64,
    pub refit_time: Option<f64>,
}

impl ModelResult {
    /// Label of a candidate: the swept parameter values, comma separated.
    pub fn candidate_label(&self, index: usize) -> String {
        self.cv_results
            .get(index)
            .map(|c| {
                self.param_name
                    .split(", ")
                    .filter_map(|name| c.params.get(name))
                    .map(ParamValue::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }
}

/// Everything a report needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub dataset: DatasetSummary,
    pub n_splits: usize,
    pub shuffle: bool,
    pub quick: bool,
    /// Cores available to the process.
    pub n_cores: usize,
    pub models: Vec<ModelResult>,
    pub total_time: f64,
}

/// Load the configured dataset, applying the quick-mode reduction.
pub fn load_dataset(config: &BenchmarkConfig) -> Result<Dataset> {
    let dataset = match &config.dataset {
        DatasetConfig::Synthetic { rows, seed } => {
            return Ok(synthetic_housing(config.effective_rows(*rows), *seed));
        }
        DatasetConfig::California { path } => load_california_housing(path)?,
        DatasetConfig::Csv { path, target } => load_csv(path, target)?,
        DatasetConfig::Parquet { path, target } => load_parquet(path, target)?,
    };

    let n = dataset.n_samples();
    let keep = config.effective_rows(n);
    if keep == n {
        return Ok(dataset);
    }
    let mut rng = StdRng::seed_from_u64(config.cv.random_state);
    let mut rows = rand::seq::index::sample(&mut rng, n, keep).into_vec();
    rows.sort_unstable();
    Ok(dataset.select(&rows)?)
}

#[cfg(feature = "io-parquet")]
fn load_parquet(path: &std::path::Path, target: &str) -> Result<Dataset> {
    Ok(crate::data::io::load_parquet(path, target)?)
}

#[cfg(not(feature = "io-parquet"))]
fn load_parquet(_path: &std::path::Path, _target: &str) -> Result<Dataset> {
    Err(super::config::ConfigError::ParquetDisabled.into())
}

/// Load the data and run one grid search per configured model.
pub fn run_benchmark(config: &BenchmarkConfig) -> Result<BenchmarkReport> {
    config.validate()?;
    let start = Instant::now();

    let dataset = load_dataset(config)?;
    let summary = DatasetSummary::new(config.dataset.describe(), &dataset);
    tracing::info!(
        source = %summary.source,
        n_samples = summary.n_samples,
        n_features = summary.n_features,
        quick = config.quick,
        "dataset loaded"
    );

    let models = config
        .models
        .iter()
        .map(|model| {
            let _span = tracing::info_span!("model", name = %model.name).entered();
            match model.kind {
                ModelKind::RandomForest => run_model(config, model, RandomForestRegressor::default(), &dataset),
                ModelKind::HistGradientBoosting => {
                    run_model(config, model, HistGradientBoostingRegressor::default(), &dataset)
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BenchmarkReport {
        dataset: summary,
        n_splits: config.cv.n_splits,
        shuffle: config.cv.shuffle,
        quick: config.quick,
        n_cores: available_cores(),
        models,
        total_time: start.elapsed().as_secs_f64(),
    })
}

fn run_model<E: Estimator>(
    config: &BenchmarkConfig,
    model: &ModelConfig,
    template: E,
    dataset: &Dataset,
) -> Result<ModelResult> {
    let mut params = model.params.clone();
    params
        .entry("n_jobs".to_string())
        .or_insert_with(|| ParamValue::from(resolve_threads(config.n_jobs)));
    let estimator = template.with_params(&params)?;
    let n_jobs = match estimator.params().get("n_jobs") {
        Some(value) => resolve_threads(value.as_usize("n_jobs")?),
        None => 1,
    };

    let grid = config.effective_grid(model);
    tracing::info!(
        estimator = estimator.name(),
        swept = %model.swept(),
        n_candidates = grid.len(),
        n_jobs,
        "running grid search"
    );

    let start = Instant::now();
    let search = GridSearchCv::builder()
        .estimator(estimator)
        .param_grid(grid)
        .cv(config.cv.kfold())
        .return_train_score(config.return_train_score)
        .refit(config.cv.refit)
        .build();
    let result = search.fit(dataset)?;
    let search_time = start.elapsed().as_secs_f64();

    for candidate in result.cv_results.iter() {
        tracing::debug!(
            params = ?candidate.params,
            mean_fit_time = candidate.mean_fit_time,
            mean_score_time = candidate.mean_score_time,
            mean_test_score = candidate.mean_test_score,
            "candidate"
        );
    }
    tracing::info!(
        best_score = result.best_score,
        best_params = ?result.best_params,
        search_time,
        "grid search done"
    );

    Ok(ModelResult {
        model: model.name.clone(),
        kind: model.kind,
        param_name: model.swept(),
        cv_results: result.cv_results,
        best_params: result.best_params,
        best_score: result.best_score,
        n_jobs,
        search_time,
        refit_time: result.refit_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_selection::ParamGrid;

    fn tiny_config() -> BenchmarkConfig {
        let mut config = BenchmarkConfig::default();
        config.dataset = DatasetConfig::Synthetic { rows: 300, seed: 1 };
        config.cv.n_splits = 3;
        config.cv.refit = false;
        config.n_jobs = 1;
        config.models[0].grid = ParamGrid::new().with("n_estimators", [2, 4]);
        config.models[1].grid = ParamGrid::new().with("max_iter", [5, 10]);
        config
    }

    #[test]
    fn test_run_benchmark_collects_every_model() {
        let report = run_benchmark(&tiny_config()).unwrap();
        assert_eq!(report.dataset.n_samples, 300);
        assert_eq!(report.dataset.n_features, 8);
        assert_eq!(report.models.len(), 2);

        let forest = &report.models[0];
        assert_eq!(forest.model, "Random Forest");
        assert_eq!(forest.param_name, "n_estimators");
        assert_eq!(forest.n_jobs, 1);
        assert_eq!(forest.cv_results.len(), 2);
        assert_eq!(forest.candidate_label(1), "4");
        assert!(forest.refit_time.is_none());

        let boosting = &report.models[1];
        assert_eq!(boosting.cv_results.get(0).unwrap().split_test_scores.len(), 3);
        assert!(boosting.cv_results.get(0).unwrap().split_train_scores.is_some());
        assert!(boosting.best_score.is_finite());
    }

    #[test]
    fn test_quick_mode_reduces_rows() {
        let mut config = tiny_config();
        config.dataset = DatasetConfig::Synthetic { rows: 1000, seed: 1 };
        let dataset = load_dataset(&config.clone().quick()).unwrap();
        assert_eq!(dataset.n_samples(), 100);
    }

    #[test]
    fn test_quick_flag_truncates_grids_and_rows() {
        let mut config = BenchmarkConfig::from_toml_str(
            r#"
quick = true
n_jobs = 1

[dataset]
kind = "synthetic"
rows = 600
seed = 1

[cv]
n_splits = 3
refit = false

[[models]]
name = "Forest"
kind = "random_forest"
grid = { n_estimators = [2, 3, 4, 5] }

[[models]]
name = "Boosting"
kind = "hist_gradient_boosting"
grid = { max_iter = [2, 3, 4, 5] }
"#,
        )
        .unwrap();
        let report = run_benchmark(&config).unwrap();
        assert!(report.quick);
        assert_eq!(report.dataset.n_samples, 60);
        assert_eq!(report.models[0].cv_results.len(), 3);
        assert_eq!(report.models[1].cv_results.len(), 3);

        // Grids edited after loading are truncated too.
        config.models[0].grid = ParamGrid::new().with("n_estimators", [2, 3, 4, 5]);
        let report = run_benchmark(&config).unwrap();
        assert_eq!(report.models[0].cv_results.len(), 3);
    }

    #[test]
    fn test_unknown_fixed_param_fails() {
        let mut config = tiny_config();
        config.models[0].params.insert("learning_rate".into(), ParamValue::Float(0.1));
        assert!(run_benchmark(&config).is_err());
    }
}
