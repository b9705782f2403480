//! Training quality smoke tests on housing-like data.

use approx::assert_abs_diff_eq;
use rstest::rstest;

use ensemble_bench::data::Dataset;
use ensemble_bench::ensemble::{
    EarlyStoppingMode, Estimator, ForestParams, HistBoostParams, HistGradientBoostingRegressor, MaxFeatures,
    ParamValue, RandomForestRegressor, Regressor,
};
use ensemble_bench::testing::synthetic_housing;

fn train_test(rows: usize, seed: u64) -> (Dataset, Dataset) {
    let data = synthetic_housing(rows, seed);
    let cut = rows * 4 / 5;
    let train: Vec<usize> = (0..cut).collect();
    let test: Vec<usize> = (cut..rows).collect();
    (data.select(&train).unwrap(), data.select(&test).unwrap())
}

#[test]
fn forest_generalizes() {
    let (train, test) = train_test(2_000, 3);
    let mut model = RandomForestRegressor::new(
        ForestParams::builder()
            .n_estimators(30)
            .min_samples_leaf(5)
            .n_jobs(2)
            .build()
            .unwrap(),
    );
    model.fit(&train).unwrap();
    assert_eq!(model.n_trees(), 30);
    let r2 = model.score(&test).unwrap();
    assert!(r2 > 0.5, "forest test R² too low: {r2}");
}

#[test]
fn boosting_generalizes() {
    let (train, test) = train_test(2_000, 3);
    let mut model = HistGradientBoostingRegressor::new(
        HistBoostParams::builder()
            .max_iter(100)
            .max_leaf_nodes(15)
            .early_stopping(EarlyStoppingMode::Off)
            .build()
            .unwrap(),
    );
    model.fit(&train).unwrap();
    assert_eq!(model.n_iter(), 100);
    let r2 = model.score(&test).unwrap();
    assert!(r2 > 0.5, "boosting test R² too low: {r2}");
}

#[test]
fn boosting_more_iterations_fit_training_data_better() {
    let data = synthetic_housing(1_000, 5);
    let score = |max_iter: usize| {
        let mut model = HistGradientBoostingRegressor::default()
            .with_param("max_iter", &ParamValue::from(max_iter))
            .unwrap();
        model.fit(&data).unwrap();
        model.score(&data).unwrap()
    };
    assert!(score(50) > score(5));
}

#[rstest]
#[case(MaxFeatures::All)]
#[case(MaxFeatures::Sqrt)]
#[case(MaxFeatures::Fraction(0.5))]
fn forest_feature_subsampling_still_learns(#[case] max_features: MaxFeatures) {
    let (train, test) = train_test(1_500, 9);
    let mut model = RandomForestRegressor::new(
        ForestParams::builder()
            .n_estimators(20)
            .max_features(max_features)
            .build()
            .unwrap(),
    );
    model.fit(&train).unwrap();
    assert!(model.score(&test).unwrap() > 0.3);
}

#[test]
fn predictions_do_not_depend_on_thread_count() {
    let data = synthetic_housing(800, 11);
    let fit = |n_jobs: usize| {
        let mut model = RandomForestRegressor::default()
            .with_param("n_estimators", &ParamValue::from(8usize))
            .unwrap()
            .with_param("n_jobs", &ParamValue::from(n_jobs))
            .unwrap();
        model.fit(&data).unwrap();
        model.predict(&data).unwrap()
    };
    let sequential = fit(1);
    let parallel = fit(4);
    for (a, b) in sequential.iter().zip(parallel.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-6);
    }
}

#[test]
fn missing_values_are_predicted() {
    let data = synthetic_housing(600, 2);
    let mut model = HistGradientBoostingRegressor::new(HistBoostParams::builder().max_iter(20).build().unwrap());
    model.fit(&data).unwrap();

    let mut row = vec![0.0f32; 8];
    data.copy_row(0, &mut row);
    row[0] = f32::NAN;
    let probe = Dataset::from_rows(row, 1, 8, vec![0.0], None).unwrap();
    let prediction = model.predict(&probe).unwrap();
    assert!(prediction[0].is_finite());
}
