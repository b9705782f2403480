//! Binned (quantized) feature storage for histogram-based training.
//!
//! - [`BinMapper`] - per-feature quantile thresholds and value ↔ bin mapping
//! - [`BinnedDataset`] - `u8` bin columns plus mappers
//! - [`BinnedDatasetBuilder`] - fits mappers (optionally on a row subsample)

mod bin_mapper;
mod dataset;

pub use bin_mapper::BinMapper;
pub use dataset::{BinnedDataset, BinnedDatasetBuilder, DEFAULT_BINNING_SUBSAMPLE};
