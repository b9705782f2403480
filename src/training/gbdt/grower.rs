//! Tree grower.
//!
//! Grows a single regression tree best-first: the leaf with the largest split
//! gain is expanded next, until no leaf can be split or the leaf budget is
//! spent. Histograms come from the pool, with the subtraction trick deriving
//! the larger child from its parent.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::data::BinnedDataset;
use crate::repr::{NodeId, Tree, TreeBuilder};
use crate::training::Gradients;
use crate::utils::Parallelism;

use super::histograms::{build_histograms_ordered, FeatureMeta, HistogramBin, HistogramPool};
use super::partition::{LeafId, RowPartitioner};
use super::sampling::FeatureSampler;
use super::split::{find_best_split, GainParams, NodeStats, SplitInfo};

/// Default number of cached histograms.
pub const DEFAULT_HISTOGRAM_CACHE: usize = 32;

/// Parameters for tree growth.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowerParams {
    /// Gain computation and constraint parameters.
    pub gain: GainParams,
    /// Multiplier applied to every leaf value.
    pub learning_rate: f32,
    /// Maximum number of leaves (`None` = unlimited).
    pub max_leaves: Option<u32>,
    /// Maximum depth (`None` = unlimited).
    pub max_depth: Option<u32>,
    /// Minimum rows a node needs to be considered for splitting.
    pub min_samples_split: u32,
    /// Features drawn per node (`None` = all).
    pub max_features: Option<usize>,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            gain: GainParams::default(),
            learning_rate: 1.0,
            max_leaves: None,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// A leaf waiting to be split or finalized.
#[derive(Debug)]
struct Candidate {
    leaf: LeafId,
    node: NodeId,
    depth: u32,
    stats: NodeStats,
    split: SplitInfo,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    /// Max-heap order: larger gain first, then the older leaf.
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .gain
            .total_cmp(&other.split.gain)
            .then_with(|| other.leaf.cmp(&self.leaf))
    }
}

/// Grows regression trees on one binned dataset.
///
/// The grower owns every buffer a tree needs (partition, histogram pool,
/// ordered gradients) and reuses them across calls to [`grow`](Self::grow).
pub struct TreeGrower {
    params: GrowerParams,
    parallelism: Parallelism,
    pool: HistogramPool,
    partitioner: RowPartitioner,
    feature_metas: Vec<FeatureMeta>,
    sampler: Option<FeatureSampler>,
    all_features: Vec<u32>,
    /// Final leaves of the last tree with their (scaled) values.
    leaf_values: Vec<(LeafId, f32)>,
    ordered_grad: Vec<f32>,
    ordered_hess: Vec<f32>,
}

impl TreeGrower {
    /// Create a grower for `dataset`.
    ///
    /// `seed` drives per-node feature sampling when `max_features` is set.
    pub fn new(
        dataset: &BinnedDataset,
        params: GrowerParams,
        cache_size: usize,
        parallelism: Parallelism,
        seed: u64,
    ) -> Self {
        let n_features = dataset.n_features();
        let n_samples = dataset.n_rows();
        let feature_metas = FeatureMeta::for_dataset(dataset);

        let sampler = params
            .max_features
            .map(|k| FeatureSampler::new(n_features, k, seed))
            .filter(|s| !s.is_full());

        Self {
            pool: HistogramPool::new(feature_metas.clone(), cache_size),
            partitioner: RowPartitioner::new(n_samples),
            feature_metas,
            sampler,
            all_features: (0..n_features as u32).collect(),
            leaf_values: Vec::new(),
            ordered_grad: Vec::with_capacity(n_samples),
            ordered_hess: Vec::with_capacity(n_samples),
            params,
            parallelism,
        }
    }

    /// Growth parameters.
    pub fn params(&self) -> &GrowerParams {
        &self.params
    }

    /// Grow one tree fitting `gradients`.
    ///
    /// `rows` restricts training to the given row indices (repeats allowed);
    /// `None` trains on every row.
    pub fn grow(
        &mut self,
        dataset: &BinnedDataset,
        gradients: &Gradients,
        rows: Option<&[u32]>,
    ) -> Tree {
        let n_samples = dataset.n_rows();
        debug_assert_eq!(gradients.n_samples(), n_samples);

        self.partitioner.reset(n_samples, rows);
        self.pool.reset_mappings();
        self.leaf_values.clear();

        let mut builder = TreeBuilder::with_capacity(
            self.params
                .max_leaves
                .map_or(63, |l| (2 * l as usize).saturating_sub(1)),
        );
        let root_node = builder.init_root();

        let (grad, hess) = gradients.sum(rows);
        let root_stats = NodeStats::new(grad, hess, self.partitioner.leaf_count(0));

        if root_stats.count == 0 {
            self.finalize_leaf(&mut builder, 0, root_node, root_stats);
            return builder.finish();
        }

        self.build_histogram(0, dataset, gradients);
        let mut heap = BinaryHeap::new();
        heap.push(self.evaluate(0, root_node, 0, root_stats));

        let mut n_leaves = 1u32;
        while let Some(candidate) = heap.pop() {
            let budget_left = self.params.max_leaves.map_or(true, |max| n_leaves < max);
            if !candidate.split.is_valid() || !budget_left {
                self.finalize_leaf(&mut builder, candidate.leaf, candidate.node, candidate.stats);
                continue;
            }

            let (left, right) = self.apply_split(&mut builder, &candidate, dataset, gradients);
            n_leaves += 1;
            heap.push(left);
            heap.push(right);
        }

        builder.finish()
    }

    /// Add the last tree's leaf values to `predictions`, using the final row partition.
    ///
    /// Only meaningful after [`grow`](Self::grow) was called with `rows = None`;
    /// with a row subset, rows outside it would keep their old prediction.
    pub fn update_predictions(&self, predictions: &mut [f32]) {
        for &(leaf, value) in &self.leaf_values {
            for &row in self.partitioner.leaf_indices(leaf) {
                predictions[row as usize] += value;
            }
        }
    }

    /// Split a candidate and evaluate both children.
    fn apply_split(
        &mut self,
        builder: &mut TreeBuilder,
        candidate: &Candidate,
        dataset: &BinnedDataset,
        gradients: &Gradients,
    ) -> (Candidate, Candidate) {
        let split = &candidate.split;
        let threshold = dataset
            .mapper(split.feature as usize)
            .bin_to_value(split.bin);
        let (left_node, right_node) =
            builder.apply_split(candidate.node, split.feature, threshold, split.default_left);

        let parent = candidate.leaf;
        let (right_leaf, left_count, right_count) = self.partitioner.split(parent, split, dataset);
        let left_leaf = parent;

        let (small, large) = if left_count <= right_count {
            (left_leaf, right_leaf)
        } else {
            (right_leaf, left_leaf)
        };

        if self.pool.get(parent).is_some() {
            // large = parent - small
            self.pool.pin(parent);
            self.pool.move_mapping(parent, large);
            self.build_histogram(small, dataset, gradients);
            self.pool.subtract(large, small);
            self.pool.unpin(large);
        } else {
            self.build_histogram(left_leaf, dataset, gradients);
            self.build_histogram(right_leaf, dataset, gradients);
        }

        let depth = candidate.depth + 1;
        let left = self.evaluate(left_leaf, left_node, depth, split.left);
        let right = self.evaluate(right_leaf, right_node, depth, split.right);
        (left, right)
    }

    /// Find the best split of a leaf whose histogram is cached.
    fn evaluate(&mut self, leaf: LeafId, node: NodeId, depth: u32, stats: NodeStats) -> Candidate {
        let split = if self.can_split(depth, stats.count) {
            self.search(leaf, stats)
        } else {
            SplitInfo::none()
        };
        Candidate {
            leaf,
            node,
            depth,
            stats,
            split,
        }
    }

    fn can_split(&self, depth: u32, count: u32) -> bool {
        let depth_ok = self.params.max_depth.map_or(true, |max| depth < max);
        let min_leaf = self.params.gain.min_samples_leaf.max(1);
        depth_ok && count >= self.params.min_samples_split.max(2) && count >= 2 * min_leaf
    }

    fn search(&mut self, leaf: LeafId, stats: NodeStats) -> SplitInfo {
        let (primary, fallback) = match self.sampler.as_mut() {
            Some(sampler) => sampler.sample(),
            None => (self.all_features.clone(), Vec::new()),
        };
        let Some(histogram) = self.pool.get(leaf) else {
            return SplitInfo::none();
        };

        let best = find_best_split(
            histogram,
            &self.feature_metas,
            &primary,
            stats,
            &self.params.gain,
            self.parallelism,
        );
        if best.is_valid() || fallback.is_empty() {
            return best;
        }
        find_best_split(
            histogram,
            &self.feature_metas,
            &fallback,
            stats,
            &self.params.gain,
            self.parallelism,
        )
    }

    fn finalize_leaf(&mut self, builder: &mut TreeBuilder, leaf: LeafId, node: NodeId, stats: NodeStats) {
        let weight = self.params.gain.compute_leaf_weight(stats.grad, stats.hess);
        let value = weight * self.params.learning_rate;
        builder.make_leaf(node, value);
        self.leaf_values.push((leaf, value));
        self.pool.release(leaf);
    }

    fn build_histogram(&mut self, leaf: LeafId, dataset: &BinnedDataset, gradients: &Gradients) {
        let rows = self.partitioner.leaf_indices(leaf);
        gradients.gather(rows, &mut self.ordered_grad, &mut self.ordered_hess);

        let slot = self.pool.acquire(leaf).slot();
        let histogram = self.pool.slot_mut(slot);
        histogram.fill(HistogramBin::default());
        build_histograms_ordered(
            histogram,
            &self.ordered_grad,
            &self.ordered_hess,
            rows,
            dataset,
            &self.feature_metas,
            self.parallelism,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BinnedDatasetBuilder, Dataset};
    use crate::training::{ObjectiveFn, SquaredLoss};
    use approx::assert_abs_diff_eq;

    fn step_data() -> (Dataset, BinnedDataset) {
        // y = 1 for x < 4, y = 5 otherwise; second feature is noise-free constant
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..8 {
            rows.push(i as f32);
            rows.push(2.0);
            y.push(if i < 4 { 1.0 } else { 5.0 });
        }
        let ds = Dataset::from_rows(rows, 8, 2, y, None).unwrap();
        let binned = BinnedDatasetBuilder::new(255).build(&ds).unwrap();
        (ds, binned)
    }

    fn gradients_for(ds: &Dataset, preds: &[f32]) -> Gradients {
        let mut g = Gradients::new(ds.n_samples());
        SquaredLoss.compute_gradients(preds, ds.target_slice(), &mut g);
        g
    }

    #[test]
    fn test_grows_exact_step() {
        let (ds, binned) = step_data();
        let grads = gradients_for(&ds, &[0.0; 8]);
        let mut grower = TreeGrower::new(&binned, GrowerParams::default(), 8, Parallelism::Sequential, 0);
        let tree = grower.grow(&binned, &grads, None);

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.node(0).feature, 0);
        assert_abs_diff_eq!(tree.node(0).threshold, 3.5);
        assert_abs_diff_eq!(tree.predict_row(&[1.0, 2.0]), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(tree.predict_row(&[6.0, 2.0]), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_update_predictions_matches_tree() {
        let (ds, binned) = step_data();
        let grads = gradients_for(&ds, &[0.0; 8]);
        let params = GrowerParams {
            learning_rate: 0.5,
            ..Default::default()
        };
        let mut grower = TreeGrower::new(&binned, params, 8, Parallelism::Sequential, 0);
        let tree = grower.grow(&binned, &grads, None);

        let mut fast = vec![0.0; 8];
        grower.update_predictions(&mut fast);
        let mut slow = vec![0.0; 8];
        tree.predict_into(&ds, 0, &mut slow);
        for (a, b) in fast.iter().zip(&slow) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_max_leaves_and_depth_limits() {
        let n = 64;
        let rows: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let y: Vec<f32> = (0..n).map(|i| (i % 7) as f32).collect();
        let ds = Dataset::from_rows(rows, n, 1, y, None).unwrap();
        let binned = BinnedDatasetBuilder::new(255).build(&ds).unwrap();
        let grads = gradients_for(&ds, &vec![0.0; n]);

        let params = GrowerParams {
            max_leaves: Some(5),
            ..Default::default()
        };
        let mut grower = TreeGrower::new(&binned, params, 4, Parallelism::Sequential, 0);
        assert_eq!(grower.grow(&binned, &grads, None).n_leaves(), 5);

        let params = GrowerParams {
            max_depth: Some(2),
            ..Default::default()
        };
        let mut grower = TreeGrower::new(&binned, params, 4, Parallelism::Sequential, 0);
        let tree = grower.grow(&binned, &grads, None);
        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let (ds, binned) = step_data();
        let grads = gradients_for(&ds, &[0.0; 8]);
        let params = GrowerParams {
            gain: GainParams {
                min_samples_leaf: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut grower = TreeGrower::new(&binned, params, 8, Parallelism::Sequential, 0);
        let tree = grower.grow(&binned, &grads, None);
        assert_eq!(tree.n_leaves(), 1);
        assert_abs_diff_eq!(tree.predict_row(&[0.0, 2.0]), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_row_subset_with_repeats() {
        let (ds, binned) = step_data();
        let grads = gradients_for(&ds, &[0.0; 8]);
        let mut grower = TreeGrower::new(&binned, GrowerParams::default(), 8, Parallelism::Sequential, 0);
        // Only rows from the left half, one of them repeated
        let tree = grower.grow(&binned, &grads, Some(&[0, 1, 1, 2]));
        assert_eq!(tree.n_leaves(), 1);
        assert_abs_diff_eq!(tree.predict_row(&[7.0, 2.0]), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_feature_sampling_falls_back() {
        // Only feature 0 is informative; with max_features = 1 the constant
        // feature may be drawn first, yet the root must still split.
        let (ds, binned) = step_data();
        let grads = gradients_for(&ds, &[0.0; 8]);
        for seed in 0..8 {
            let params = GrowerParams {
                max_features: Some(1),
                ..Default::default()
            };
            let mut grower = TreeGrower::new(&binned, params, 8, Parallelism::Sequential, seed);
            let tree = grower.grow(&binned, &grads, None);
            assert_eq!(tree.n_leaves(), 2);
        }
    }

    #[test]
    fn test_small_cache_matches_large_cache() {
        let n = 200;
        let mut rows = Vec::with_capacity(n * 3);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = (i * 37 % 101) as f32;
            let b = (i * 13 % 29) as f32;
            let c = (i % 5) as f32;
            rows.extend([a, b, c]);
            y.push(a + 2.0 * b - 3.0 * c);
        }
        let ds = Dataset::from_rows(rows, n, 3, y, None).unwrap();
        let binned = BinnedDatasetBuilder::new(64).build(&ds).unwrap();
        let grads = gradients_for(&ds, &vec![0.0; n]);

        let params = GrowerParams {
            max_leaves: Some(16),
            ..Default::default()
        };
        let a = TreeGrower::new(&binned, params.clone(), 2, Parallelism::Sequential, 0).grow(&binned, &grads, None);
        let b = TreeGrower::new(&binned, params, 64, Parallelism::Parallel, 0).grow(&binned, &grads, None);
        assert_eq!(a.n_leaves(), 16);
        assert_eq!(a, b);
    }
}
