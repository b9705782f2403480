//! ensemble-bench: grid-search benchmarks of tree-ensemble regressors.
//!
//! Native Rust implementations of a random forest and a histogram gradient
//! boosting regressor, cross-validated grid search over their
//! hyper-parameters, and markdown/SVG/JSON/CSV reports comparing accuracy
//! against training and prediction time.
//!
//! # Key Types
//!
//! - [`RandomForestRegressor`] / [`HistGradientBoostingRegressor`] - Estimators
//! - [`ForestParams`] / [`HistBoostParams`] - Parameter builders
//! - [`GridSearchCv`] / [`KFold`] / [`ParamGrid`] - Model selection
//! - [`BenchmarkConfig`] / [`run_benchmark`] - Experiment orchestration
//! - [`Dataset`] - Regression data
//!
//! # Running a Benchmark
//!
//! ```no_run
//! use ensemble_bench::{markdown_report, run_benchmark, BenchmarkConfig};
//!
//! let report = run_benchmark(&BenchmarkConfig::default().quick())?;
//! println!("{}", markdown_report(&report));
//! # Ok::<(), ensemble_bench::Error>(())
//! ```

pub mod bench;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod model_selection;
pub mod repr;
pub mod report;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Estimators and their parameters
pub use ensemble::{
    Estimator, FitError, ForestParams, HistBoostParams, HistGradientBoostingRegressor, ParamError, ParamSet,
    ParamValue, RandomForestRegressor, Regressor,
};

// Model selection
pub use model_selection::{GridSearchCv, KFold, ParamGrid, SearchError};

// Benchmark orchestration and reporting
pub use bench::{run_benchmark, BenchmarkConfig, BenchmarkReport};
pub use report::{markdown_report, svg_chart, write_all};

// Data types
pub use data::{Dataset, DatasetError};

pub use error::{Error, Result};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
