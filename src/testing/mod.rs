//! Synthetic data for tests, benchmarks and dataset-free runs.

mod data;

pub use data::{random_dense_f32, synthetic_housing, synthetic_regression};
