//! Grid search end to end.

use approx::assert_relative_eq;

use ensemble_bench::ensemble::{HistGradientBoostingRegressor, ParamValue, RandomForestRegressor};
use ensemble_bench::model_selection::{GridSearchCv, KFold, ParamGrid, SearchError};
use ensemble_bench::testing::synthetic_housing;
use ensemble_bench::utils::mean_std;

#[test]
fn forest_grid_search_summaries_are_consistent() {
    let data = synthetic_housing(600, 0);
    let search = GridSearchCv::builder()
        .estimator(RandomForestRegressor::default())
        .param_grid(ParamGrid::new().with("n_estimators", [2, 8]))
        .cv(KFold::new(3).shuffled(0))
        .return_train_score(true)
        .build();
    let result = search.fit(&data).unwrap();

    assert_eq!(result.cv_results.len(), 2);
    for candidate in &result.cv_results {
        assert_eq!(candidate.split_test_scores.len(), 3);
        assert_eq!(candidate.split_fit_times.len(), 3);
        let (mean, std) = mean_std(&candidate.split_test_scores);
        assert_relative_eq!(candidate.mean_test_score, mean);
        assert_relative_eq!(candidate.std_test_score, std);
        assert!(candidate.mean_fit_time > 0.0);
        assert!(candidate.mean_train_score.unwrap() >= candidate.mean_test_score);
    }

    let best = result.cv_results.get(result.best_index).unwrap();
    assert_eq!(best.rank_test_score, 1);
    assert_eq!(result.best_params, best.params);
    assert!(result.best_estimator.is_some());
    assert!(result.refit_time.unwrap() >= 0.0);
}

#[test]
fn boosting_grid_prefers_more_iterations() {
    let data = synthetic_housing(800, 1);
    let search = GridSearchCv::builder()
        .estimator(HistGradientBoostingRegressor::default())
        .param_grid(ParamGrid::new().with("max_iter", [2, 60]).with("max_leaf_nodes", [15]))
        .cv(KFold::new(4).shuffled(0))
        .refit(false)
        .n_jobs(2)
        .build();
    let result = search.fit(&data).unwrap();
    assert_eq!(result.best_params["max_iter"], ParamValue::Int(60));
    assert!(result.best_estimator.is_none());
}

#[test]
fn parallel_and_sequential_scores_match() {
    let data = synthetic_housing(400, 4);
    let run = |n_jobs: usize| {
        GridSearchCv::builder()
            .estimator(RandomForestRegressor::default())
            .param_grid(ParamGrid::new().with("n_estimators", [3, 6]))
            .cv(KFold::new(3))
            .refit(false)
            .n_jobs(n_jobs)
            .build()
            .fit(&data)
            .unwrap()
    };
    let a = run(1);
    let b = run(3);
    for (x, y) in a.cv_results.iter().zip(b.cv_results.iter()) {
        assert_eq!(x.split_test_scores, y.split_test_scores);
    }
}

#[test]
fn bad_candidate_is_reported() {
    let data = synthetic_housing(100, 0);
    let search = GridSearchCv::builder()
        .estimator(RandomForestRegressor::default())
        .param_grid(ParamGrid::new().with("n_estimators", [0]))
        .build();
    assert!(matches!(search.fit(&data), Err(SearchError::Param(_))));

    let search = GridSearchCv::builder()
        .estimator(RandomForestRegressor::default())
        .param_grid(ParamGrid::new().with("n_estimators", [2]))
        .cv(KFold::new(200))
        .build();
    assert!(matches!(search.fit(&data), Err(SearchError::TooFewSamples { .. })));
}
