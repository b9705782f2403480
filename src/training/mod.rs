//! Training infrastructure shared by the tree ensembles.
//!
//! - [`Gradients`]: Per-sample gradient and hessian buffers
//! - [`ObjectiveFn`]: Trait for computing gradients from predictions and targets
//! - [`MetricFn`]: Trait for evaluating model quality
//! - [`EarlyStopping`]: Stops boosting when a validation score plateaus
//! - [`TrainingLogger`]: Structured logging with verbosity levels
//! - [`gbdt`]: Histogram tree growing

mod callback;
pub mod gbdt;
mod gradients;
mod logger;
pub mod metrics;
pub mod objectives;

pub use callback::EarlyStopping;
pub use gradients::Gradients;
pub use logger::{TrainingLogger, Verbosity};
pub use metrics::{r2_score, Mae, MetricFn, Rmse, R2};
pub use objectives::{ObjectiveFn, SquaredLoss};
