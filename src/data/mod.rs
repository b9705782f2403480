//! Data input abstractions.
//!
//! # Overview
//!
//! - [`Dataset`]: feature-major `[n_features, n_samples]` regression data
//! - [`binned::BinnedDataset`]: quantized feature data for tree training
//! - [`io`]: loaders for the California housing file, CSV and Parquet
//!
//! # Missing Values
//!
//! Missing values are represented as `f32::NAN`. Binning routes them to a
//! dedicated bin and trees learn a default direction for them.

pub mod binned;
mod dataset;
pub mod io;

pub use binned::{BinMapper, BinnedDataset, BinnedDatasetBuilder};
pub use dataset::{Dataset, DatasetError};
