//! Shared error types for dataset I/O.

use std::io;
use std::path::PathBuf;

use crate::data::DatasetError;

/// Errors that can occur when loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetLoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "io-parquet")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "io-parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("row {row}, column {column}: cannot parse {value:?} as a number")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: expected {expected} columns, got {got}")]
    ColumnCount {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("unsupported column type for {column}: got {got}")]
    UnsupportedType { column: String, got: String },

    #[error("{0} contains no data rows")]
    Empty(PathBuf),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
