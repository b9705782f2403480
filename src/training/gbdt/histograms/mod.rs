//! Histogram data structures for tree training.
//!
//! A node histogram is one flat buffer of [`HistogramBin`]s covering every
//! feature; [`FeatureMeta`] gives each feature's slice. Histograms are built
//! from pre-gathered "ordered" gradients so the gradient reads are sequential
//! and only the bin lookups are random.
//!
//! The subtraction trick (sibling = parent − child) means only the smaller
//! child of a split ever needs a full build.
//!
//! - [`build_histograms_ordered`] - feature-parallel build for one node
//! - [`subtract_histogram`] - sibling derivation
//! - [`HistogramPool`] - LRU-cached histogram storage

mod pool;

pub use pool::{AcquireResult, HistogramPool};

use crate::data::BinnedDataset;
use crate::utils::Parallelism;

/// Accumulated statistics of one bin.
///
/// Sums are kept in `f64`: gain computation takes differences of large sums,
/// and the subtraction trick compounds rounding error in `f32`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HistogramBin {
    /// Sum of gradients.
    pub grad: f64,
    /// Sum of hessians.
    pub hess: f64,
    /// Number of samples (repeated rows count once per occurrence).
    pub count: u32,
}

impl HistogramBin {
    #[inline]
    fn add(&mut self, grad: f32, hess: f32) {
        self.grad += grad as f64;
        self.hess += hess as f64;
        self.count += 1;
    }

    #[inline]
    fn sub_assign(&mut self, other: &HistogramBin) {
        self.grad -= other.grad;
        self.hess -= other.hess;
        self.count -= other.count;
    }
}

/// Location of one feature's bins inside a flat histogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMeta {
    /// First bin of the feature.
    pub offset: u32,
    /// Number of bins, including the trailing missing bin.
    pub n_bins: u32,
}

impl FeatureMeta {
    /// Metadata for every feature of a binned dataset.
    pub fn for_dataset(dataset: &BinnedDataset) -> Vec<FeatureMeta> {
        (0..dataset.n_features())
            .map(|f| FeatureMeta {
                offset: dataset.global_bin_offset(f),
                n_bins: dataset.n_bins(f),
            })
            .collect()
    }

    /// Total bins across `metas`.
    pub fn total_bins(metas: &[FeatureMeta]) -> usize {
        metas.iter().map(|m| m.n_bins as usize).sum()
    }

    /// Range of this feature in the flat histogram.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.n_bins as usize
    }
}

/// Minimum rows in a node before feature-parallel building pays off.
const MIN_ROWS_PARALLEL: usize = 1024;
/// Minimum features before feature-parallel building pays off.
const MIN_FEATURES_PARALLEL: usize = 4;

/// Build the histogram of one node from ordered gradients.
///
/// `ordered_grad[i]` and `ordered_hess[i]` belong to row `rows[i]`. The
/// histogram must be zeroed beforehand.
pub fn build_histograms_ordered(
    histogram: &mut [HistogramBin],
    ordered_grad: &[f32],
    ordered_hess: &[f32],
    rows: &[u32],
    dataset: &BinnedDataset,
    feature_metas: &[FeatureMeta],
    parallelism: Parallelism,
) {
    debug_assert_eq!(ordered_grad.len(), rows.len());
    debug_assert_eq!(ordered_hess.len(), rows.len());
    debug_assert_eq!(histogram.len(), FeatureMeta::total_bins(feature_metas));

    let slices = feature_slices(histogram, feature_metas);
    let parallel = parallelism.is_parallel()
        && rows.len() >= MIN_ROWS_PARALLEL
        && feature_metas.len() >= MIN_FEATURES_PARALLEL;

    if parallel {
        use rayon::prelude::*;
        slices.into_par_iter().enumerate().for_each(|(f, hist)| {
            build_feature_ordered(hist, dataset.feature_bins(f), ordered_grad, ordered_hess, rows);
        });
    } else {
        for (f, hist) in slices.into_iter().enumerate() {
            build_feature_ordered(hist, dataset.feature_bins(f), ordered_grad, ordered_hess, rows);
        }
    }
}

/// Split a flat histogram into disjoint per-feature slices.
fn feature_slices<'a>(
    histogram: &'a mut [HistogramBin],
    feature_metas: &[FeatureMeta],
) -> Vec<&'a mut [HistogramBin]> {
    let mut slices = Vec::with_capacity(feature_metas.len());
    let mut rest = histogram;
    for meta in feature_metas {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(meta.n_bins as usize);
        slices.push(head);
        rest = tail;
    }
    slices
}

#[inline]
fn build_feature_ordered(
    histogram: &mut [HistogramBin],
    bins: &[u8],
    ordered_grad: &[f32],
    ordered_hess: &[f32],
    rows: &[u32],
) {
    for ((&row, &g), &h) in rows.iter().zip(ordered_grad).zip(ordered_hess) {
        let bin = bins[row as usize] as usize;
        histogram[bin].add(g, h);
    }
}

/// `target -= source`, bin by bin.
#[inline]
pub fn subtract_histogram(target: &mut [HistogramBin], source: &[HistogramBin]) {
    debug_assert_eq!(target.len(), source.len());
    for (t, s) in target.iter_mut().zip(source) {
        t.sub_assign(s);
    }
}

/// Node totals, read from the bins of the first feature.
pub fn sum_histogram(histogram: &[HistogramBin], feature_metas: &[FeatureMeta]) -> HistogramBin {
    let Some(first) = feature_metas.first() else {
        return HistogramBin::default();
    };
    histogram[first.range()]
        .iter()
        .fold(HistogramBin::default(), |mut acc, b| {
            acc.grad += b.grad;
            acc.hess += b.hess;
            acc.count += b.count;
            acc
        })
}
