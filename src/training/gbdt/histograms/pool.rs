//! Contiguous histogram pool with LRU eviction.
//!
//! Histograms for all slots live in one allocation. Nodes map to slots; when
//! every slot is taken, the least recently used unpinned slot is evicted.
//!
//! ```text
//! data:         [slot0 bins][slot1 bins][slot2 bins]...
//! node_to_slot: node id -> Option<slot>
//! slot_to_node: slot    -> Option<node id>
//! ```

use super::{subtract_histogram, FeatureMeta, HistogramBin};

/// Outcome of [`HistogramPool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireResult {
    /// The node already had a cached histogram in this slot.
    Hit(usize),
    /// A fresh (possibly evicted) slot was assigned; its contents are stale.
    Miss(usize),
}

impl AcquireResult {
    /// Slot index.
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            AcquireResult::Hit(s) | AcquireResult::Miss(s) => s,
        }
    }

    /// Whether the histogram was already cached.
    #[inline]
    pub fn is_hit(self) -> bool {
        matches!(self, AcquireResult::Hit(_))
    }
}

/// LRU cache of node histograms.
#[derive(Debug)]
pub struct HistogramPool {
    feature_metas: Vec<FeatureMeta>,
    bins_per_slot: usize,
    data: Vec<HistogramBin>,
    node_to_slot: Vec<Option<usize>>,
    slot_to_node: Vec<Option<u32>>,
    last_used: Vec<u64>,
    pinned: Vec<bool>,
    clock: u64,
}

impl HistogramPool {
    /// Create a pool with `n_slots` histograms (at least 2).
    pub fn new(feature_metas: Vec<FeatureMeta>, n_slots: usize) -> Self {
        let n_slots = n_slots.max(2);
        let bins_per_slot = FeatureMeta::total_bins(&feature_metas);
        Self {
            feature_metas,
            bins_per_slot,
            data: vec![HistogramBin::default(); n_slots * bins_per_slot],
            node_to_slot: Vec::new(),
            slot_to_node: vec![None; n_slots],
            last_used: vec![0; n_slots],
            pinned: vec![false; n_slots],
            clock: 0,
        }
    }

    /// Feature layout shared by every slot.
    #[inline]
    pub fn feature_metas(&self) -> &[FeatureMeta] {
        &self.feature_metas
    }

    /// Number of slots.
    #[inline]
    pub fn n_slots(&self) -> usize {
        self.slot_to_node.len()
    }

    /// Get or assign a slot for `node`.
    pub fn acquire(&mut self, node: u32) -> AcquireResult {
        self.clock += 1;
        if let Some(slot) = self.slot_of(node) {
            self.last_used[slot] = self.clock;
            return AcquireResult::Hit(slot);
        }

        let slot = match self.slot_to_node.iter().position(Option::is_none) {
            Some(free) => free,
            None => self.evict_lru(),
        };
        self.map(node, slot);
        AcquireResult::Miss(slot)
    }

    /// Cached histogram of `node`, if any.
    pub fn get(&self, node: u32) -> Option<&[HistogramBin]> {
        self.slot_of(node).map(|slot| self.slot(slot))
    }

    /// Histogram stored in `slot`.
    #[inline]
    pub fn slot(&self, slot: usize) -> &[HistogramBin] {
        let start = slot * self.bins_per_slot;
        &self.data[start..start + self.bins_per_slot]
    }

    /// Mutable histogram stored in `slot`.
    #[inline]
    pub fn slot_mut(&mut self, slot: usize) -> &mut [HistogramBin] {
        let start = slot * self.bins_per_slot;
        &mut self.data[start..start + self.bins_per_slot]
    }

    /// Protect the slot of `node` from eviction.
    pub fn pin(&mut self, node: u32) {
        if let Some(slot) = self.slot_of(node) {
            self.pinned[slot] = true;
        }
    }

    /// Allow the slot of `node` to be evicted again.
    pub fn unpin(&mut self, node: u32) {
        if let Some(slot) = self.slot_of(node) {
            self.pinned[slot] = false;
        }
    }

    /// Hand the cached histogram of `from` over to `to`.
    ///
    /// Any histogram `to` had is released.
    pub fn move_mapping(&mut self, from: u32, to: u32) {
        if from == to {
            return;
        }
        let Some(slot) = self.slot_of(from) else {
            return;
        };
        self.release(to);
        self.node_to_slot[from as usize] = None;
        self.map(to, slot);
    }

    /// `target -= source` for two cached nodes. Returns `false` if either is missing.
    pub fn subtract(&mut self, target: u32, source: u32) -> bool {
        let (Some(t), Some(s)) = (self.slot_of(target), self.slot_of(source)) else {
            return false;
        };
        if t == s {
            return false;
        }
        let n = self.bins_per_slot;
        if t < s {
            let (head, tail) = self.data.split_at_mut(s * n);
            subtract_histogram(&mut head[t * n..(t + 1) * n], &tail[..n]);
        } else {
            let (head, tail) = self.data.split_at_mut(t * n);
            subtract_histogram(&mut tail[..n], &head[s * n..(s + 1) * n]);
        }
        true
    }

    /// Drop the cached histogram of `node`.
    pub fn release(&mut self, node: u32) {
        if let Some(slot) = self.slot_of(node) {
            self.node_to_slot[node as usize] = None;
            self.slot_to_node[slot] = None;
            self.pinned[slot] = false;
        }
    }

    /// Forget every mapping (start of a new tree).
    pub fn reset_mappings(&mut self) {
        self.node_to_slot.clear();
        self.slot_to_node.fill(None);
        self.pinned.fill(false);
        self.last_used.fill(0);
        self.clock = 0;
    }

    #[inline]
    fn slot_of(&self, node: u32) -> Option<usize> {
        self.node_to_slot.get(node as usize).copied().flatten()
    }

    fn map(&mut self, node: u32, slot: usize) {
        let idx = node as usize;
        if idx >= self.node_to_slot.len() {
            self.node_to_slot.resize(idx + 1, None);
        }
        self.node_to_slot[idx] = Some(slot);
        self.slot_to_node[slot] = Some(node);
        self.last_used[slot] = self.clock;
    }

    /// Free the least recently used unpinned slot, growing the pool if all are pinned.
    fn evict_lru(&mut self) -> usize {
        let victim = (0..self.n_slots())
            .filter(|&s| !self.pinned[s])
            .min_by_key(|&s| self.last_used[s]);

        match victim {
            Some(slot) => {
                if let Some(node) = self.slot_to_node[slot] {
                    self.node_to_slot[node as usize] = None;
                }
                self.slot_to_node[slot] = None;
                slot
            }
            None => {
                let slot = self.n_slots();
                self.data
                    .resize(self.data.len() + self.bins_per_slot, HistogramBin::default());
                self.slot_to_node.push(None);
                self.last_used.push(0);
                self.pinned.push(false);
                slot
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n_slots: usize) -> HistogramPool {
        HistogramPool::new(vec![FeatureMeta { offset: 0, n_bins: 3 }], n_slots)
    }

    fn fill(pool: &mut HistogramPool, node: u32, grad: f64) {
        let slot = pool.acquire(node).slot();
        for b in pool.slot_mut(slot) {
            *b = HistogramBin { grad, hess: 1.0, count: 1 };
        }
    }

    #[test]
    fn test_acquire_hit_and_miss() {
        let mut p = pool(2);
        let first = p.acquire(0);
        assert!(!first.is_hit());
        assert!(p.acquire(0).is_hit());
        assert_eq!(p.acquire(0).slot(), first.slot());
    }

    #[test]
    fn test_lru_eviction() {
        let mut p = pool(2);
        fill(&mut p, 0, 1.0);
        fill(&mut p, 1, 2.0);
        p.acquire(0); // touch 0, so 1 is least recent
        fill(&mut p, 2, 3.0);
        assert!(p.get(0).is_some());
        assert!(p.get(1).is_none());
        assert_eq!(p.get(2).unwrap()[0].grad, 3.0);
    }

    #[test]
    fn test_pinned_slot_survives() {
        let mut p = pool(2);
        fill(&mut p, 0, 1.0);
        fill(&mut p, 1, 2.0);
        p.pin(0);
        p.pin(1);
        // All pinned: the pool grows instead of evicting
        fill(&mut p, 2, 3.0);
        assert_eq!(p.n_slots(), 3);
        assert!(p.get(0).is_some() && p.get(1).is_some());
    }

    #[test]
    fn test_move_mapping_and_subtract() {
        let mut p = pool(3);
        fill(&mut p, 0, 5.0);
        p.move_mapping(0, 4);
        assert!(p.get(0).is_none());
        fill(&mut p, 0, 2.0);
        assert!(p.subtract(4, 0));
        let derived = p.get(4).unwrap();
        assert_eq!(derived[0].grad, 3.0);
        assert_eq!(derived[0].count, 0);
    }

    #[test]
    fn test_release_and_reset() {
        let mut p = pool(2);
        fill(&mut p, 0, 1.0);
        p.release(0);
        assert!(p.get(0).is_none());
        fill(&mut p, 1, 1.0);
        p.reset_mappings();
        assert!(p.get(1).is_none());
    }
}
