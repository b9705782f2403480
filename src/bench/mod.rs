//! Experiment orchestration.
//!
//! - [`BenchmarkConfig`]: dataset, cross-validation and model grids
//! - [`run_benchmark`]: one grid search per model, collected into a
//!   [`BenchmarkReport`]

mod config;
mod runner;

pub use config::{
    BenchmarkConfig, ConfigError, CvConfig, DatasetConfig, ModelConfig, ModelKind, QUICK_GRID_VALUES,
    QUICK_ROW_DIVISOR, REFERENCE_ROWS,
};
pub use runner::{load_dataset, run_benchmark, BenchmarkReport, DatasetSummary, ModelResult};
