//! Cross-validation and hyper-parameter search.
//!
//! - [`KFold`]: K-fold train/test index splits
//! - [`ParamGrid`]: Cartesian product of candidate parameter values
//! - [`GridSearchCv`]: Cross-validated exhaustive search

mod grid;
mod kfold;
mod search;

pub use grid::ParamGrid;
pub use kfold::{FoldIndices, KFold};
pub use search::{CandidateResult, CvResults, GridSearchCv, SearchResult};

use crate::data::DatasetError;
use crate::ensemble::{FitError, ParamError};

/// Errors raised by cross-validation and grid search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("n_splits must be at least 2, got {0}")]
    InvalidSplits(usize),

    #[error("cannot split {n_samples} samples into {n_splits} folds")]
    TooFewSamples { n_samples: usize, n_splits: usize },

    #[error("parameter grid yields no candidates")]
    EmptyGrid,

    #[error("invalid candidate parameters")]
    Param(#[from] ParamError),

    #[error("candidate {candidate} failed on fold {fold}")]
    Fit {
        candidate: usize,
        fold: usize,
        #[source]
        source: FitError,
    },

    #[error("refitting the best candidate failed")]
    Refit(#[source] FitError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
