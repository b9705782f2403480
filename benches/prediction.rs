//! Prediction throughput of fitted estimators.
//!
//! Run with: `cargo bench --bench prediction`

mod common;

use common::criterion_config::default_criterion;

use ensemble_bench::ensemble::{
    ForestParams, HistBoostParams, HistGradientBoostingRegressor, RandomForestRegressor, Regressor,
};
use ensemble_bench::testing::synthetic_housing;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_predict(c: &mut Criterion) {
    let train = synthetic_housing(10_000, 1);
    let test = synthetic_housing(5_000, 2);

    let mut forest = RandomForestRegressor::new(
        ForestParams::builder()
            .n_estimators(50)
            .min_samples_leaf(5)
            .build()
            .unwrap(),
    );
    forest.fit(&train).unwrap();

    let mut boosting = HistGradientBoostingRegressor::new(
        HistBoostParams::builder()
            .max_iter(100)
            .max_leaf_nodes(15)
            .build()
            .unwrap(),
    );
    boosting.fit(&train).unwrap();

    let mut group = c.benchmark_group("prediction");
    group.throughput(Throughput::Elements(test.n_samples() as u64));
    group.bench_with_input(BenchmarkId::new("random_forest", "n_estimators=50"), &test, |b, data| {
        b.iter(|| black_box(forest.predict(black_box(data)).unwrap()))
    });
    group.bench_with_input(BenchmarkId::new("hist_gradient_boosting", "max_iter=100"), &test, |b, data| {
        b.iter(|| black_box(boosting.predict(black_box(data)).unwrap()))
    });
    group.bench_with_input(BenchmarkId::new("hist_gradient_boosting/score", "max_iter=100"), &test, |b, data| {
        b.iter(|| black_box(boosting.score(black_box(data)).unwrap()))
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_predict
}
criterion_main!(benches);
