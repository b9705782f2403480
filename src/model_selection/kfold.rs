//! K-fold cross-validation splitter.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::SearchError;

/// Train and test sample indices of one fold.
pub type FoldIndices = (Vec<usize>, Vec<usize>);

/// K-fold splitter.
///
/// Samples are cut into `n_splits` consecutive folds (after an optional
/// seeded shuffle). The first `n_samples % n_splits` folds hold one extra
/// sample. Each fold serves once as the test set.
///
/// ```
/// use ensemble_bench::model_selection::KFold;
///
/// let folds = KFold::new(3).split(7).unwrap();
/// let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
/// assert_eq!(sizes, vec![3, 2, 2]);
/// assert_eq!(folds[0].1, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub random_state: u64,
}

impl KFold {
    /// Unshuffled splitter.
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: 0,
        }
    }

    /// Shuffle samples with `seed` before cutting folds.
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.random_state = seed;
        self
    }

    /// Check the splitter can cut `n_samples` samples.
    pub fn validate(&self, n_samples: usize) -> Result<(), SearchError> {
        if self.n_splits < 2 {
            return Err(SearchError::InvalidSplits(self.n_splits));
        }
        if n_samples < self.n_splits {
            return Err(SearchError::TooFewSamples {
                n_samples,
                n_splits: self.n_splits,
            });
        }
        Ok(())
    }

    /// `(train, test)` indices for every fold, each sorted ascending.
    pub fn split(&self, n_samples: usize) -> Result<Vec<FoldIndices>, SearchError> {
        self.validate(n_samples)?;

        let mut order: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            order.shuffle(&mut StdRng::seed_from_u64(self.random_state));
        }

        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for k in 0..self.n_splits {
            let size = base + usize::from(k < extra);
            let end = start + size;

            let mut test = order[start..end].to_vec();
            let mut train: Vec<usize> = order[..start].iter().chain(&order[end..]).copied().collect();
            test.sort_unstable();
            train.sort_unstable();
            folds.push((train, test));

            start = end;
        }
        Ok(folds)
    }
}

impl Default for KFold {
    fn default() -> Self {
        Self::new(5)
    }
}
