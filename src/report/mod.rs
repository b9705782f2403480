//! Benchmark reports.
//!
//! - [`markdown_report`]: human-readable tables
//! - [`svg_chart`]: accuracy against fit and score time
//! - [`write_json`], [`write_csv`]: machine-readable CV results
//! - [`write_all`]: every artifact into one directory

mod export;
mod markdown;
mod svg;

pub use export::{write_all, write_csv, write_json, CSV_FILE, JSON_FILE, MARKDOWN_FILE, SVG_FILE};
pub use markdown::markdown_report;
pub use svg::svg_chart;

use std::path::PathBuf;

/// Errors raised while writing report artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::bench::{BenchmarkReport, DatasetSummary, ModelKind, ModelResult};
    use crate::ensemble::{ParamSet, ParamValue};
    use crate::model_selection::{CandidateResult, CvResults};

    fn candidate(name: &str, value: i64, fit: f64, score: f64, r2: f64, rank: usize) -> CandidateResult {
        let params: ParamSet = [(name.to_string(), ParamValue::Int(value))].into_iter().collect();
        CandidateResult {
            params,
            split_test_scores: vec![r2 - 0.01, r2 + 0.01],
            split_fit_times: vec![fit, fit],
            split_score_times: vec![score, score],
            mean_fit_time: fit,
            std_fit_time: 0.0,
            mean_score_time: score,
            std_score_time: 0.0,
            mean_test_score: r2,
            std_test_score: 0.01,
            rank_test_score: rank,
            split_train_scores: Some(vec![0.95, 0.95]),
            mean_train_score: Some(0.95),
            std_train_score: Some(0.0),
        }
    }

    fn model(name: &str, kind: ModelKind, param: &str, candidates: Vec<CandidateResult>) -> ModelResult {
        let best = candidates
            .iter()
            .find(|c| c.rank_test_score == 1)
            .cloned()
            .unwrap();
        ModelResult {
            model: name.to_string(),
            kind,
            param_name: param.to_string(),
            cv_results: CvResults::from(candidates),
            best_params: best.params,
            best_score: best.mean_test_score,
            n_jobs: 2,
            search_time: 1.5,
            refit_time: None,
        }
    }

    /// Two models with two candidates each.
    pub(crate) fn sample_report() -> BenchmarkReport {
        BenchmarkReport {
            dataset: DatasetSummary {
                source: "synthetic housing (seed 0)".into(),
                n_samples: 1000,
                n_features: 8,
                feature_names: (0..8).map(|i| format!("f{i}")).collect(),
                target_mean: 2.0,
                target_std: 1.1,
            },
            n_splits: 4,
            shuffle: true,
            quick: false,
            n_cores: 4,
            models: vec![
                model(
                    "Random Forest",
                    ModelKind::RandomForest,
                    "n_estimators",
                    vec![
                        candidate("n_estimators", 10, 0.5, 0.01, 0.78, 2),
                        candidate("n_estimators", 20, 1.0, 0.02, 0.80, 1),
                    ],
                ),
                model(
                    "Hist Gradient Boosting",
                    ModelKind::HistGradientBoosting,
                    "max_iter",
                    vec![
                        candidate("max_iter", 10, 0.1, 0.005, 0.60, 2),
                        candidate("max_iter", 100, 0.8, 0.03, 0.83, 1),
                    ],
                ),
            ],
            total_time: 12.0,
        }
    }
}
