//! Histogram-based regression tree training.
//!
//! - [`grower`] - Best-first tree growing orchestration
//! - [`histograms`] - Gradient histograms and the LRU histogram pool
//! - [`partition`] - Row index partitioning for tree nodes
//! - [`sampling`] - Bootstrap rows and per-node feature subsets
//! - [`split`] - Gain computation and split finding

pub mod grower;
pub mod histograms;
pub mod partition;
pub mod sampling;
pub mod split;

pub use grower::{GrowerParams, TreeGrower, DEFAULT_HISTOGRAM_CACHE};
pub use histograms::{FeatureMeta, HistogramBin, HistogramPool};
pub use partition::{LeafId, RowPartitioner};
pub use sampling::{bootstrap_indices, FeatureSampler};
pub use split::{find_best_split, GainParams, NodeStats, SplitInfo};
