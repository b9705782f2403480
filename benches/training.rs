//! Training throughput of both estimators on housing-like data.
//!
//! Run with: `cargo bench --bench training`

mod common;

use common::criterion_config::default_criterion;

use ensemble_bench::ensemble::{
    ForestParams, HistBoostParams, HistGradientBoostingRegressor, RandomForestRegressor, Regressor,
};
use ensemble_bench::testing::synthetic_housing;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const ROWS: [usize; 2] = [2_000, 20_640];

fn bench_forest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("training/random_forest");
    for rows in ROWS {
        let data = synthetic_housing(rows, 42);
        group.throughput(Throughput::Elements(rows as u64));
        for n_jobs in [1usize, 0] {
            let params = ForestParams::builder()
                .n_estimators(20)
                .min_samples_leaf(5)
                .n_jobs(n_jobs)
                .build()
                .unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("n_estimators=20/n_jobs={n_jobs}"), rows),
                &data,
                |b, data| {
                    b.iter(|| {
                        let mut model = RandomForestRegressor::new(params.clone());
                        model.fit(black_box(data)).unwrap();
                        black_box(model)
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_boosting_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("training/hist_gradient_boosting");
    for rows in ROWS {
        let data = synthetic_housing(rows, 42);
        group.throughput(Throughput::Elements(rows as u64));
        for max_iter in [20usize, 100] {
            let params = HistBoostParams::builder()
                .max_iter(max_iter)
                .max_leaf_nodes(15)
                .build()
                .unwrap();
            group.bench_with_input(BenchmarkId::new(format!("max_iter={max_iter}"), rows), &data, |b, data| {
                b.iter(|| {
                    let mut model = HistGradientBoostingRegressor::new(params.clone());
                    model.fit(black_box(data)).unwrap();
                    black_box(model)
                })
            });
        }
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_forest_fit, bench_boosting_fit
}
criterion_main!(benches);
