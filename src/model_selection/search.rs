//! Exhaustive grid search with cross-validation.

use std::time::Instant;

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::{KFold, ParamGrid, SearchError};
use crate::data::Dataset;
use crate::ensemble::{Estimator, FitError, ParamSet, Regressor};
use crate::utils::{mean_std, resolve_threads, run_with_threads};

// =============================================================================
// Results
// =============================================================================

/// Cross-validation summary of one parameter candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub split_test_scores: Vec<f64>,
    pub split_fit_times: Vec<f64>,
    pub split_score_times: Vec<f64>,
    pub mean_fit_time: f64,
    pub std_fit_time: f64,
    pub mean_score_time: f64,
    pub std_score_time: f64,
    pub mean_test_score: f64,
    pub std_test_score: f64,
    /// 1 = best. Tied scores share the smallest rank; NaN scores rank last.
    pub rank_test_score: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_train_scores: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_train_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_train_score: Option<f64>,
}

/// Per-candidate results of a grid search, in grid order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CvResults {
    candidates: Vec<CandidateResult>,
}

impl CvResults {
    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateResult> {
        self.candidates.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CandidateResult> {
        self.candidates.get(index)
    }

    /// Index of the first candidate with rank 1.
    pub fn best_index(&self) -> Option<usize> {
        self.candidates
            .iter()
            .enumerate()
            .min_by_key(|(i, c)| (c.rank_test_score, *i))
            .map(|(i, _)| i)
    }
}

impl<'a> IntoIterator for &'a CvResults {
    type Item = &'a CandidateResult;
    type IntoIter = std::slice::Iter<'a, CandidateResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

impl From<Vec<CandidateResult>> for CvResults {
    fn from(candidates: Vec<CandidateResult>) -> Self {
        Self { candidates }
    }
}

/// Outcome of [`GridSearchCv::fit`].
#[derive(Debug, Clone)]
pub struct SearchResult<E> {
    pub cv_results: CvResults,
    pub best_index: usize,
    pub best_params: ParamSet,
    pub best_score: f64,
    /// Best candidate refit on the whole dataset (when `refit` is on).
    pub best_estimator: Option<E>,
    /// Seconds spent refitting the best candidate.
    pub refit_time: Option<f64>,
}

/// Ranks with the "min" method: 1 + number of strictly better scores.
/// NaN scores come after every real score.
fn rank_scores(scores: &[f64]) -> Vec<usize> {
    let n_valid = scores.iter().filter(|s| !s.is_nan()).count();
    scores
        .iter()
        .map(|&s| {
            if s.is_nan() {
                n_valid + 1
            } else {
                1 + scores.iter().filter(|&&o| !o.is_nan() && o > s).count()
            }
        })
        .collect()
}

// =============================================================================
// GridSearchCv
// =============================================================================

/// Measurements of one (candidate, fold) pair.
#[derive(Debug, Clone, Copy)]
struct FoldOutcome {
    fit_time: f64,
    score_time: f64,
    test_score: f64,
    train_score: Option<f64>,
}

/// Exhaustive search over a [`ParamGrid`], scoring every candidate with
/// K-fold cross-validated R².
///
/// # Example
///
/// ```
/// use ensemble_bench::ensemble::{HistBoostParams, HistGradientBoostingRegressor};
/// use ensemble_bench::model_selection::{GridSearchCv, KFold, ParamGrid};
/// use ensemble_bench::testing::synthetic_regression;
///
/// let data = synthetic_regression(200, 3, 0.1, 0);
/// let search = GridSearchCv::builder()
///     .estimator(HistGradientBoostingRegressor::new(HistBoostParams::default()))
///     .param_grid(ParamGrid::new().with("max_iter", [5, 40]))
///     .cv(KFold::new(3).shuffled(0))
///     .build();
///
/// let result = search.fit(&data).unwrap();
/// assert_eq!(result.cv_results.len(), 2);
/// assert_eq!(result.best_params["max_iter"].to_string(), "40");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct GridSearchCv<E: Estimator> {
    /// Template estimator; every candidate is a re-parameterized copy.
    estimator: E,
    param_grid: ParamGrid,
    #[builder(default)]
    cv: KFold,
    /// Also score each fold's training part.
    #[builder(default)]
    return_train_score: bool,
    /// Refit the best candidate on the whole dataset.
    #[builder(default = true)]
    refit: bool,
    /// Candidate-fold pairs evaluated concurrently (0 = all cores).
    #[builder(default = 1)]
    n_jobs: usize,
}

impl<E: Estimator> GridSearchCv<E> {
    /// Template estimator.
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Searched grid.
    pub fn param_grid(&self) -> &ParamGrid {
        &self.param_grid
    }

    /// Cross-validation splitter.
    pub fn cv(&self) -> &KFold {
        &self.cv
    }

    /// Evaluate every candidate on every fold.
    pub fn fit(&self, dataset: &Dataset) -> Result<SearchResult<E>, SearchError> {
        let candidates = self.param_grid.candidates();
        if candidates.is_empty() {
            return Err(SearchError::EmptyGrid);
        }
        let estimators = candidates
            .iter()
            .map(|params| self.estimator.with_params(params))
            .collect::<Result<Vec<E>, _>>()?;

        let folds = self.cv.split(dataset.n_samples())?;
        let fold_data = folds
            .iter()
            .map(|(train, test)| Ok((dataset.select(train)?, dataset.select(test)?)))
            .collect::<Result<Vec<(Dataset, Dataset)>, SearchError>>()?;

        tracing::info!(
            estimator = self.estimator.name(),
            n_candidates = candidates.len(),
            n_splits = folds.len(),
            "grid search started"
        );

        let tasks: Vec<(usize, usize)> = (0..estimators.len())
            .flat_map(|c| (0..fold_data.len()).map(move |f| (c, f)))
            .collect();

        let outcomes = run_with_threads(resolve_threads(self.n_jobs), |parallelism| {
            parallelism.maybe_par_map(tasks, |(c, f)| {
                let _span = tracing::debug_span!("cv_fold", candidate = c, fold = f).entered();
                let (train, test) = &fold_data[f];
                self.evaluate(&estimators[c], train, test)
                    .map_err(|source| SearchError::Fit {
                        candidate: c,
                        fold: f,
                        source,
                    })
            })
        })
        .into_iter()
        .collect::<Result<Vec<FoldOutcome>, SearchError>>()?;

        let n_folds = fold_data.len();
        let mut results: Vec<CandidateResult> = candidates
            .into_iter()
            .zip(outcomes.chunks(n_folds))
            .map(|(params, folds)| self.summarize(params, folds))
            .collect();

        let means: Vec<f64> = results.iter().map(|r| r.mean_test_score).collect();
        for (result, rank) in results.iter_mut().zip(rank_scores(&means)) {
            result.rank_test_score = rank;
        }
        let cv_results = CvResults { candidates: results };

        let best_index = cv_results.best_index().unwrap_or(0);
        let best = &cv_results.candidates[best_index];
        let best_params = best.params.clone();
        let best_score = best.mean_test_score;
        tracing::info!(
            estimator = self.estimator.name(),
            best_index,
            best_score,
            "grid search finished"
        );

        let (best_estimator, refit_time) = if self.refit {
            let mut estimator = estimators[best_index].clone();
            let start = Instant::now();
            estimator.fit(dataset).map_err(SearchError::Refit)?;
            (Some(estimator), Some(start.elapsed().as_secs_f64()))
        } else {
            (None, None)
        };

        Ok(SearchResult {
            cv_results,
            best_index,
            best_params,
            best_score,
            best_estimator,
            refit_time,
        })
    }

    fn evaluate(&self, template: &E, train: &Dataset, test: &Dataset) -> Result<FoldOutcome, FitError> {
        let mut estimator = template.clone();

        let start = Instant::now();
        estimator.fit(train)?;
        let fit_time = start.elapsed().as_secs_f64();

        let start = Instant::now();
        let test_score = estimator.score(test)?;
        let score_time = start.elapsed().as_secs_f64();

        let train_score = if self.return_train_score {
            Some(estimator.score(train)?)
        } else {
            None
        };

        tracing::debug!(
            estimator = estimator.name(),
            fit_time,
            score_time,
            test_score,
            "fold evaluated"
        );

        Ok(FoldOutcome {
            fit_time,
            score_time,
            test_score,
            train_score,
        })
    }

    fn summarize(&self, params: ParamSet, folds: &[FoldOutcome]) -> CandidateResult {
        let split_fit_times: Vec<f64> = folds.iter().map(|o| o.fit_time).collect();
        let split_score_times: Vec<f64> = folds.iter().map(|o| o.score_time).collect();
        let split_test_scores: Vec<f64> = folds.iter().map(|o| o.test_score).collect();
        let split_train_scores: Option<Vec<f64>> = folds.iter().map(|o| o.train_score).collect();

        let (mean_fit_time, std_fit_time) = mean_std(&split_fit_times);
        let (mean_score_time, std_score_time) = mean_std(&split_score_times);
        let (mean_test_score, std_test_score) = mean_std(&split_test_scores);
        let train_stats = split_train_scores.as_deref().map(mean_std);

        CandidateResult {
            params,
            split_test_scores,
            split_fit_times,
            split_score_times,
            mean_fit_time,
            std_fit_time,
            mean_score_time,
            std_score_time,
            mean_test_score,
            std_test_score,
            rank_test_score: 0,
            mean_train_score: train_stats.map(|(m, _)| m),
            std_train_score: train_stats.map(|(_, s)| s),
            split_train_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::{ForestParams, RandomForestRegressor};
    use crate::testing::synthetic_regression;

    #[test]
    fn test_rank_scores_min_method() {
        assert_eq!(rank_scores(&[0.5, 0.9, 0.5, 0.1]), vec![2, 1, 2, 4]);
        assert_eq!(rank_scores(&[f64::NAN, 0.2, 0.3]), vec![3, 2, 1]);
    }

    fn forest_search(return_train_score: bool, refit: bool) -> GridSearchCv<RandomForestRegressor> {
        let forest = RandomForestRegressor::new(
            ForestParams::builder().n_jobs(1).build().unwrap(),
        );
        GridSearchCv::builder()
            .estimator(forest)
            .param_grid(ParamGrid::new().with("n_estimators", [2, 5]))
            .cv(KFold::new(3).shuffled(0))
            .return_train_score(return_train_score)
            .refit(refit)
            .build()
    }

    #[test]
    fn test_results_shape() {
        let data = synthetic_regression(90, 3, 0.1, 1);
        let result = forest_search(true, false).fit(&data).unwrap();

        assert_eq!(result.cv_results.len(), 2);
        for candidate in &result.cv_results {
            assert_eq!(candidate.split_test_scores.len(), 3);
            assert_eq!(candidate.split_train_scores.as_ref().map(Vec::len), Some(3));
            assert!(candidate.mean_fit_time >= 0.0);
            assert!(candidate.std_test_score >= 0.0);
        }
        assert!(result.best_estimator.is_none());
        assert!(result.refit_time.is_none());
        assert_eq!(result.cv_results.get(result.best_index).unwrap().rank_test_score, 1);
    }

    #[test]
    fn test_refit_best() {
        let data = synthetic_regression(90, 3, 0.1, 2);
        let result = forest_search(false, true).fit(&data).unwrap();
        let best = result.best_estimator.unwrap();
        assert_eq!(best.n_trees(), best.forest_params().n_estimators);
        assert!(result.refit_time.is_some());
        assert!(result.cv_results.iter().all(|c| c.split_train_scores.is_none()));
    }

    #[test]
    fn test_unknown_param_is_reported() {
        let data = synthetic_regression(30, 2, 0.1, 3);
        let search = GridSearchCv::builder()
            .estimator(RandomForestRegressor::default())
            .param_grid(ParamGrid::new().with("max_iter", [1]))
            .build();
        assert!(matches!(search.fit(&data), Err(SearchError::Param(_))));
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let data = synthetic_regression(30, 2, 0.1, 3);
        let search = GridSearchCv::builder()
            .estimator(RandomForestRegressor::default())
            .param_grid(ParamGrid::new().with("n_estimators", Vec::<i64>::new()))
            .build();
        assert!(matches!(search.fit(&data), Err(SearchError::EmptyGrid)));
    }
}
