//! Crate-level error type.

use crate::bench::ConfigError;
use crate::data::io::DatasetLoadError;
use crate::data::DatasetError;
use crate::ensemble::{FitError, ParamError};
use crate::model_selection::SearchError;
use crate::report::ReportError;

/// Any error raised by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("failed to load dataset")]
    Load(#[from] DatasetLoadError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error("grid search failed")]
    Search(#[from] SearchError),

    #[error("invalid benchmark configuration")]
    Config(#[from] ConfigError),

    #[error("failed to write report")]
    Report(#[from] ReportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_source_chain() {
        let err = Error::from(ConfigError::NoModels);
        assert_eq!(err.to_string(), "invalid benchmark configuration");
        assert_eq!(err.source().unwrap().to_string(), "config defines no models");

        let err = Error::from(FitError::NotFitted);
        assert_eq!(err.to_string(), "estimator is not fitted");
    }
}
