//! Row and feature sampling.
//!
//! - [`bootstrap_indices`]: rows drawn with replacement for one bagged tree
//! - [`FeatureSampler`]: random feature subset per node

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Draw `n_draws` row indices uniformly with replacement from `0..n_samples`.
///
/// The result is sorted so histogram building reads the bin columns in order.
pub fn bootstrap_indices(n_samples: usize, n_draws: usize, rng: &mut impl Rng) -> Vec<u32> {
    if n_samples == 0 {
        return Vec::new();
    }
    let mut rows: Vec<u32> = (0..n_draws)
        .map(|_| rng.gen_range(0..n_samples) as u32)
        .collect();
    rows.sort_unstable();
    rows
}

/// Per-node random feature subsets.
///
/// Each call to [`sample`](Self::sample) shuffles all features and splits the
/// order into a primary subset of `k` features and the remainder. The grower
/// searches the primary subset first and falls back to the remainder only if
/// no valid split was found, so a node is never left unsplit merely because
/// the drawn features were constant.
#[derive(Debug)]
pub struct FeatureSampler {
    order: Vec<u32>,
    k: usize,
    rng: StdRng,
}

impl FeatureSampler {
    /// Sampler drawing `k` of `n_features` features (`k` is clamped to `1..=n_features`).
    pub fn new(n_features: usize, k: usize, seed: u64) -> Self {
        Self {
            order: (0..n_features as u32).collect(),
            k: k.clamp(1, n_features.max(1)),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Whether every feature is always drawn.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.k >= self.order.len()
    }

    /// Draw a node's features: `(primary, fallback)`, each sorted ascending.
    pub fn sample(&mut self) -> (Vec<u32>, Vec<u32>) {
        if self.is_full() {
            return (self.order.clone(), Vec::new());
        }
        self.order.shuffle(&mut self.rng);
        let mut primary = self.order[..self.k].to_vec();
        let mut fallback = self.order[self.k..].to_vec();
        primary.sort_unstable();
        fallback.sort_unstable();
        (primary, fallback)
    }
}
