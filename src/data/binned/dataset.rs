//! Binned (quantized) dataset used for histogram-based tree training.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;

use super::bin_mapper::BinMapper;
use crate::data::{Dataset, DatasetError};

/// Default number of rows used to fit bin thresholds.
pub const DEFAULT_BINNING_SUBSAMPLE: usize = 200_000;

/// Quantized feature data for GBDT / forest training.
///
/// Each feature is stored as a contiguous `u8` column of bin indices, with the
/// [`BinMapper`] that produced it. Histogram storage for all features lives in
/// one flat buffer; [`global_bin_offset`](Self::global_bin_offset) gives each
/// feature's start in it.
#[derive(Clone, Debug)]
pub struct BinnedDataset {
    /// Per-feature bin columns, each of length `n_rows`.
    bins: Vec<Box<[u8]>>,
    /// Per-feature bin mappers.
    mappers: Vec<BinMapper>,
    /// Start of each feature in a flat histogram.
    offsets: Vec<u32>,
    /// Number of rows.
    n_rows: usize,
}

impl BinnedDataset {
    fn from_parts(bins: Vec<Box<[u8]>>, mappers: Vec<BinMapper>, n_rows: usize) -> Self {
        let mut offsets = Vec::with_capacity(mappers.len());
        let mut offset = 0u32;
        for mapper in &mappers {
            offsets.push(offset);
            offset += mapper.n_bins();
        }
        Self {
            bins,
            mappers,
            offsets,
            n_rows,
        }
    }

    /// Number of rows (samples).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.mappers.len()
    }

    /// Bin column of a feature.
    #[inline]
    pub fn feature_bins(&self, feature: usize) -> &[u8] {
        &self.bins[feature]
    }

    /// Bin of one cell.
    #[inline]
    pub fn bin(&self, row: usize, feature: usize) -> u32 {
        self.bins[feature][row] as u32
    }

    /// Bin mapper of a feature.
    #[inline]
    pub fn mapper(&self, feature: usize) -> &BinMapper {
        &self.mappers[feature]
    }

    /// All bin mappers.
    pub fn mappers(&self) -> &[BinMapper] {
        &self.mappers
    }

    /// Number of bins of a feature (including its missing bin).
    #[inline]
    pub fn n_bins(&self, feature: usize) -> u32 {
        self.mappers[feature].n_bins()
    }

    /// Offset of a feature's bins in a flat histogram.
    #[inline]
    pub fn global_bin_offset(&self, feature: usize) -> u32 {
        self.offsets[feature]
    }

    /// Total number of bins across all features.
    pub fn total_bins(&self) -> usize {
        self.mappers.iter().map(|m| m.n_bins() as usize).sum()
    }

    /// Bin another dataset with the thresholds fitted here.
    pub fn bin_with(&self, dataset: &Dataset) -> Result<BinnedDataset, DatasetError> {
        if dataset.n_features() != self.n_features() {
            return Err(DatasetError::FeatureCount {
                expected: self.n_features(),
                got: dataset.n_features(),
            });
        }
        let bins = bin_columns(dataset, &self.mappers);
        Ok(Self::from_parts(bins, self.mappers.clone(), dataset.n_samples()))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`BinnedDataset`].
///
/// # Example
///
/// ```
/// use ensemble_bench::data::{BinnedDatasetBuilder, Dataset};
///
/// let ds = Dataset::from_rows(vec![1.0, 2.0, 3.0, 4.0], 4, 1, vec![0.0; 4], None).unwrap();
/// let binned = BinnedDatasetBuilder::new(255).build(&ds).unwrap();
/// assert_eq!(binned.n_rows(), 4);
/// assert_eq!(binned.bin(3, 0), 3);
/// ```
#[derive(Clone, Debug)]
pub struct BinnedDatasetBuilder {
    max_bins: u32,
    subsample: usize,
    seed: u64,
}

impl BinnedDatasetBuilder {
    /// Create a builder producing at most `max_bins` value bins per feature.
    pub fn new(max_bins: u32) -> Self {
        Self {
            max_bins,
            subsample: DEFAULT_BINNING_SUBSAMPLE,
            seed: 0,
        }
    }

    /// Maximum number of rows used to fit thresholds.
    pub fn subsample(mut self, n_rows: usize) -> Self {
        self.subsample = n_rows.max(1);
        self
    }

    /// Seed for choosing the threshold-fitting subsample.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit bin mappers and quantize every feature.
    pub fn build(&self, dataset: &Dataset) -> Result<BinnedDataset, DatasetError> {
        if !(2..=255).contains(&self.max_bins) {
            return Err(DatasetError::InvalidMaxBins(self.max_bins));
        }
        if dataset.is_empty() || dataset.n_features() == 0 {
            return Err(DatasetError::Empty);
        }

        let n_rows = dataset.n_samples();
        let fit_rows: Option<Vec<usize>> = if n_rows > self.subsample {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let mut rows = sample(&mut rng, n_rows, self.subsample).into_vec();
            rows.sort_unstable();
            Some(rows)
        } else {
            None
        };

        let mappers: Vec<BinMapper> = (0..dataset.n_features())
            .into_par_iter()
            .map(|f| {
                let column = dataset.feature(f);
                let values: Vec<f32> = match &fit_rows {
                    Some(rows) => rows.iter().map(|&r| column[r]).collect(),
                    None => column.iter().copied().collect(),
                };
                BinMapper::fit(&values, self.max_bins)
            })
            .collect();

        let bins = bin_columns(dataset, &mappers);
        Ok(BinnedDataset::from_parts(bins, mappers, n_rows))
    }
}

fn bin_columns(dataset: &Dataset, mappers: &[BinMapper]) -> Vec<Box<[u8]>> {
    mappers
        .par_iter()
        .enumerate()
        .map(|(f, mapper)| {
            dataset
                .feature(f)
                .iter()
                .map(|&v| mapper.value_to_bin(v) as u8)
                .collect::<Vec<u8>>()
                .into_boxed_slice()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dataset() -> Dataset {
        // feature 0: 0..8, feature 1: constant with one NaN
        let mut rows = Vec::new();
        for i in 0..8 {
            rows.push(i as f32);
            rows.push(if i == 3 { f32::NAN } else { 1.0 });
        }
        Dataset::from_rows(rows, 8, 2, vec![0.0; 8], None).unwrap()
    }

    #[test]
    fn test_build_offsets_and_bins() {
        let binned = BinnedDatasetBuilder::new(255).build(&small_dataset()).unwrap();
        assert_eq!(binned.n_rows(), 8);
        assert_eq!(binned.n_features(), 2);
        // feature 0: 8 value bins + missing bin
        assert_eq!(binned.n_bins(0), 9);
        assert_eq!(binned.global_bin_offset(0), 0);
        assert_eq!(binned.global_bin_offset(1), 9);
        assert_eq!(binned.total_bins(), 9 + 2);
        assert_eq!(binned.feature_bins(0), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(binned.bin(3, 1), binned.mapper(1).missing_bin());
    }

    #[test]
    fn test_invalid_max_bins() {
        let err = BinnedDatasetBuilder::new(256).build(&small_dataset()).unwrap_err();
        assert_eq!(err, DatasetError::InvalidMaxBins(256));
        let err = BinnedDatasetBuilder::new(1).build(&small_dataset()).unwrap_err();
        assert_eq!(err, DatasetError::InvalidMaxBins(1));
    }

    #[test]
    fn test_subsampled_fit_still_bins_all_rows() {
        let values: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let ds = Dataset::from_rows(values, 1000, 1, vec![0.0; 1000], None).unwrap();
        let binned = BinnedDatasetBuilder::new(32).subsample(100).seed(7).build(&ds).unwrap();
        assert_eq!(binned.n_rows(), 1000);
        let bins = binned.feature_bins(0);
        assert!(bins.windows(2).all(|w| w[0] <= w[1]));
        assert!(bins.iter().all(|&b| (b as u32) < binned.mapper(0).n_value_bins()));
    }

    #[test]
    fn test_bin_with_reuses_thresholds() {
        let ds = small_dataset();
        let binned = BinnedDatasetBuilder::new(255).build(&ds).unwrap();
        let other = Dataset::from_rows(vec![2.2, 1.0], 1, 2, vec![0.0], None).unwrap();
        let rebinned = binned.bin_with(&other).unwrap();
        assert_eq!(rebinned.bin(0, 0), 2);
        assert_eq!(rebinned.global_bin_offset(1), 9);
    }

    #[test]
    fn test_bin_with_feature_mismatch() {
        let binned = BinnedDatasetBuilder::new(255).build(&small_dataset()).unwrap();
        let other = Dataset::from_rows(vec![1.0], 1, 1, vec![0.0], None).unwrap();
        assert!(matches!(
            binned.bin_with(&other),
            Err(DatasetError::FeatureCount { expected: 2, got: 1 })
        ));
    }
}
