//! Split types, gain computation, and split finding.
//!
//! Split finding scans each candidate feature's histogram left to right,
//! accumulating value bins. At every boundary the rows of the missing bin are
//! tried on both sides; the better side becomes the split's default direction.

mod gain;

pub use gain::GainParams;

use super::histograms::{FeatureMeta, HistogramBin};
use crate::utils::Parallelism;

/// Gradient statistics of a node or child.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStats {
    pub grad: f64,
    pub hess: f64,
    pub count: u32,
}

impl NodeStats {
    #[inline]
    pub fn new(grad: f64, hess: f64, count: u32) -> Self {
        Self { grad, hess, count }
    }

    #[inline]
    fn plus(self, bin: &HistogramBin) -> Self {
        Self::new(self.grad + bin.grad, self.hess + bin.hess, self.count + bin.count)
    }

    #[inline]
    fn minus(self, other: NodeStats) -> Self {
        Self::new(
            self.grad - other.grad,
            self.hess - other.hess,
            self.count.saturating_sub(other.count),
        )
    }

    #[inline]
    fn from_bin(bin: &HistogramBin) -> Self {
        Self::new(bin.grad, bin.hess, bin.count)
    }
}

/// The best split found for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitInfo {
    /// Feature to split on.
    pub feature: u32,
    /// Last bin going left (`bin <= self.bin`).
    pub bin: u32,
    /// Gain of the split.
    pub gain: f64,
    /// Whether missing values go left.
    pub default_left: bool,
    /// Statistics of the left child.
    pub left: NodeStats,
    /// Statistics of the right child.
    pub right: NodeStats,
}

impl SplitInfo {
    /// A null split (no valid split found).
    pub fn none() -> Self {
        Self {
            feature: u32::MAX,
            bin: 0,
            gain: f64::NEG_INFINITY,
            default_left: true,
            left: NodeStats::default(),
            right: NodeStats::default(),
        }
    }

    /// A split is valid if it has positive gain and a valid feature.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.gain > 0.0 && self.feature != u32::MAX
    }

    /// Higher gain wins; equal gains go to the lower feature index.
    #[inline]
    fn better_than(&self, other: &SplitInfo) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.feature < other.feature)
    }
}

impl Default for SplitInfo {
    fn default() -> Self {
        Self::none()
    }
}

/// Find the best split of a node over `features`.
///
/// `histogram` is the node's flat histogram, `parent` its totals.
pub fn find_best_split(
    histogram: &[HistogramBin],
    feature_metas: &[FeatureMeta],
    features: &[u32],
    parent: NodeStats,
    params: &GainParams,
    parallelism: Parallelism,
) -> SplitInfo {
    let scan = |&f: &u32| {
        let meta = feature_metas[f as usize];
        find_best_split_for_feature(f, &histogram[meta.range()], parent, params)
    };

    let candidates = parallelism.maybe_par_map(features, scan);
    candidates
        .into_iter()
        .fold(SplitInfo::none(), |best, split| {
            if split.better_than(&best) {
                split
            } else {
                best
            }
        })
}

/// Scan one feature's bins.
///
/// The trailing bin holds missing values. Splitting after the last value bin
/// with missing values sent right separates present from missing values.
fn find_best_split_for_feature(
    feature: u32,
    bins: &[HistogramBin],
    parent: NodeStats,
    params: &GainParams,
) -> SplitInfo {
    let mut best = SplitInfo::none();
    let Some((missing_bin, value_bins)) = bins.split_last() else {
        return best;
    };
    let missing = NodeStats::from_bin(missing_bin);
    let present = parent.minus(missing);

    let mut acc = NodeStats::default();
    for (b, bin) in value_bins.iter().enumerate() {
        acc = acc.plus(bin);
        let right = present.minus(acc);

        let options: &[bool] = if missing.count == 0 {
            // No missing rows here: send future missing values to the larger child.
            if acc.count >= right.count {
                &[true]
            } else {
                &[false]
            }
        } else {
            &[true, false]
        };

        for &default_left in options {
            let (l, r) = if default_left && missing.count > 0 {
                (acc.plus(missing_bin), right)
            } else if missing.count > 0 {
                (acc, right.plus(missing_bin))
            } else {
                (acc, right)
            };

            if !params.is_valid_split(l.hess, r.hess, l.count, r.count) {
                continue;
            }
            let gain = params.compute_gain(l.grad, l.hess, r.grad, r.hess, parent.grad, parent.hess);
            if gain > best.gain {
                best = SplitInfo {
                    feature,
                    bin: b as u32,
                    gain,
                    default_left,
                    left: l,
                    right: r,
                };
            }
        }
    }

    best
}
