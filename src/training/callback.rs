//! Early stopping callback for training.
//!
//! Monitors a validation metric and stops training when it has not improved
//! on a reference value by more than a tolerance for a number of rounds.

/// Early stopping configuration and state.
///
/// The reference value is the one recorded `patience + 1` rounds back.
/// Training stops once none of the last `patience` values beats the
/// reference by more than `tol`.
///
/// # Example
///
/// ```
/// use ensemble_bench::training::EarlyStopping;
///
/// // Monitor a loss (lower is better)
/// let mut early_stop = EarlyStopping::new(2, 0.0, false);
///
/// assert!(!early_stop.should_stop(1.0));
/// assert!(!early_stop.should_stop(0.5));
/// assert!(!early_stop.should_stop(0.5));
/// assert!(early_stop.should_stop(0.6));
/// assert_eq!(early_stop.best_round(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    /// Number of rounds without improvement before stopping.
    patience: usize,
    /// Minimum improvement over the reference value.
    tol: f64,
    /// Whether higher metric values are better.
    higher_is_better: bool,
    /// Every value seen so far.
    history: Vec<f64>,
    /// Best metric value seen so far.
    best_value: Option<f64>,
    /// Round at which best value was observed.
    best_round: usize,
}

impl EarlyStopping {
    /// Create a new early stopping callback.
    ///
    /// # Arguments
    ///
    /// * `patience` - Number of rounds without improvement before stopping
    /// * `tol` - Minimum improvement that counts
    /// * `higher_is_better` - Whether higher metric values indicate improvement
    pub fn new(patience: usize, tol: f64, higher_is_better: bool) -> Self {
        Self {
            patience,
            tol,
            higher_is_better,
            history: Vec::new(),
            best_value: None,
            best_round: 0,
        }
    }

    /// Record a metric value and check if training should stop.
    pub fn should_stop(&mut self, value: f64) -> bool {
        let round = self.history.len();
        let is_best = match self.best_value {
            None => true,
            Some(best) => self.improves(value, best, 0.0),
        };
        if is_best {
            self.best_value = Some(value);
            self.best_round = round;
        }
        self.history.push(value);

        let window = self.patience + 1;
        if self.patience == 0 || self.history.len() < window {
            return false;
        }
        let recent = &self.history[self.history.len() - window..];
        let reference = recent[0];
        !recent[1..]
            .iter()
            .any(|&v| self.improves(v, reference, self.tol))
    }

    #[inline]
    fn improves(&self, value: f64, reference: f64, tol: f64) -> bool {
        if self.higher_is_better {
            value > reference + tol
        } else {
            value < reference - tol
        }
    }

    /// Get the best metric value observed.
    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Get the round at which the best value was observed.
    pub fn best_round(&self) -> usize {
        self.best_round
    }

    /// Number of values recorded.
    pub fn current_round(&self) -> usize {
        self.history.len()
    }

    /// Reset the early stopping state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.best_value = None;
        self.best_round = 0;
    }
}
