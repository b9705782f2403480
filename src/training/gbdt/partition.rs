//! Row partitioning for tree training.
//!
//! Manages row indices per leaf, enabling efficient partitioning when applying splits.
//! Uses a single contiguous buffer with ranges per leaf to avoid allocations during training.
//!
//! The partitioner stores:
//! - `indices`: Contiguous buffer of row indices, ordered by leaf
//! - `leaf_begin`: Start position for each leaf in `indices`
//! - `leaf_count`: Number of rows in each leaf
//!
//! When splitting a leaf, rows are partitioned in-place and the new leaf ranges are updated.
//! The buffer may hold the same row more than once (bootstrap samples); each
//! occurrence is routed independently.

use super::split::SplitInfo;
use crate::data::BinnedDataset;

/// Leaf identifier (index during training).
pub type LeafId = u32;

/// Manages row indices per leaf during tree training.
///
/// ```text
/// Initial (all rows in leaf 0):
///   indices: [0, 1, 2, 3, 4, 5, 6, 7]
///   leaf_begin: [0], leaf_count: [8]
///
/// After splitting leaf 0 (rows 0,2,4,6 go left to leaf 0, rows 1,3,5,7 go right to leaf 1):
///   indices: [0, 2, 4, 6, 1, 3, 5, 7]
///   leaf_begin: [0, 4], leaf_count: [4, 4]
/// ```
#[derive(Debug, Default)]
pub struct RowPartitioner {
    /// Row indices buffer. Partitioned in-place.
    indices: Vec<u32>,
    /// Start position for each leaf in `indices`.
    leaf_begin: Vec<u32>,
    /// Number of rows in each leaf.
    leaf_count: Vec<u32>,
}

impl RowPartitioner {
    /// Create a partitioner with room for `n_samples` rows.
    pub fn new(n_samples: usize) -> Self {
        Self {
            indices: Vec::with_capacity(n_samples),
            leaf_begin: Vec::new(),
            leaf_count: Vec::new(),
        }
    }

    /// Reset the partitioner for a new tree.
    ///
    /// Leaf 0 owns `rows` when given (duplicates allowed), else `0..n_samples`.
    pub fn reset(&mut self, n_samples: usize, rows: Option<&[u32]>) {
        self.indices.clear();
        match rows {
            Some(rows) => self.indices.extend_from_slice(rows),
            None => self.indices.extend(0..n_samples as u32),
        }
        self.leaf_begin.clear();
        self.leaf_count.clear();
        self.leaf_begin.push(0);
        self.leaf_count.push(self.indices.len() as u32);
    }

    /// All indices, grouped by leaf.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Get the row indices for a leaf.
    #[inline]
    pub fn leaf_indices(&self, leaf: LeafId) -> &[u32] {
        let begin = self.leaf_begin[leaf as usize] as usize;
        let count = self.leaf_count[leaf as usize] as usize;
        &self.indices[begin..begin + count]
    }

    /// Get the number of rows in a leaf.
    #[inline]
    pub fn leaf_count(&self, leaf: LeafId) -> u32 {
        self.leaf_count[leaf as usize]
    }

    /// Number of allocated leaves.
    #[inline]
    pub fn n_leaves(&self) -> usize {
        self.leaf_count.len()
    }

    /// Split a leaf according to a split decision.
    ///
    /// The original leaf keeps the left-going rows.
    /// A new leaf is allocated for the right-going rows.
    ///
    /// # Returns
    /// `(right_leaf, left_count, right_count)`.
    pub fn split(
        &mut self,
        leaf: LeafId,
        split: &SplitInfo,
        dataset: &BinnedDataset,
    ) -> (LeafId, u32, u32) {
        let begin = self.leaf_begin[leaf as usize] as usize;
        let count = self.leaf_count[leaf as usize] as usize;
        let end = begin + count;

        let feature = split.feature as usize;
        let bins = dataset.feature_bins(feature);
        let missing_bin = dataset.mapper(feature).missing_bin();

        // Partition in place: left elements move to front
        let mut left_end = begin;
        for i in begin..end {
            let bin = bins[self.indices[i] as usize] as u32;
            let goes_left = if bin == missing_bin {
                split.default_left
            } else {
                bin <= split.bin
            };
            if goes_left {
                self.indices.swap(i, left_end);
                left_end += 1;
            }
        }

        let left_count = (left_end - begin) as u32;
        let right_count = (end - left_end) as u32;

        self.leaf_count[leaf as usize] = left_count;

        let right_leaf = self.leaf_count.len() as LeafId;
        self.leaf_begin.push(left_end as u32);
        self.leaf_count.push(right_count);

        (right_leaf, left_count, right_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BinnedDatasetBuilder, Dataset};

    fn binned() -> BinnedDataset {
        let values = vec![0.0, 1.0, 2.0, 3.0, f32::NAN, 5.0];
        let ds = Dataset::from_rows(values, 6, 1, vec![0.0; 6], None).unwrap();
        BinnedDatasetBuilder::new(255).build(&ds).unwrap()
    }

    fn split_at(bin: u32, default_left: bool) -> SplitInfo {
        SplitInfo {
            feature: 0,
            bin,
            gain: 1.0,
            default_left,
            ..SplitInfo::none()
        }
    }

    #[test]
    fn test_split_routes_rows() {
        let ds = binned();
        let mut p = RowPartitioner::new(6);
        p.reset(6, None);

        let (right, lc, rc) = p.split(0, &split_at(1, true), &ds);
        assert_eq!(right, 1);
        assert_eq!((lc, rc), (3, 3));

        let mut left: Vec<u32> = p.leaf_indices(0).to_vec();
        left.sort_unstable();
        assert_eq!(left, vec![0, 1, 4]);
        let mut right_rows: Vec<u32> = p.leaf_indices(1).to_vec();
        right_rows.sort_unstable();
        assert_eq!(right_rows, vec![2, 3, 5]);
    }

    #[test]
    fn test_missing_follows_default_direction() {
        let ds = binned();
        let mut p = RowPartitioner::new(6);
        p.reset(6, None);
        p.split(0, &split_at(1, false), &ds);
        assert!(p.leaf_indices(1).contains(&4));
    }

    #[test]
    fn test_duplicate_rows_are_kept() {
        let ds = binned();
        let mut p = RowPartitioner::new(6);
        p.reset(6, Some(&[0, 0, 3, 3, 3]));
        let (_, lc, rc) = p.split(0, &split_at(0, true), &ds);
        assert_eq!((lc, rc), (2, 3));
        assert_eq!(p.leaf_indices(0), &[0, 0]);
        assert_eq!(p.n_leaves(), 2);
    }

    #[test]
    fn test_nested_splits_keep_ranges_disjoint() {
        let ds = binned();
        let mut p = RowPartitioner::new(6);
        p.reset(6, None);
        let (right, _, _) = p.split(0, &split_at(2, true), &ds);
        let (third, lc, rc) = p.split(right, &split_at(3, true), &ds);
        assert_eq!(third, 2);
        assert_eq!((lc, rc), (1, 1));
        let total: u32 = (0..3).map(|l| p.leaf_count(l)).sum();
        assert_eq!(total, 6);
    }
}
