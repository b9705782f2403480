//! Training progress logging.
//!
//! [`TrainingLogger`] filters progress messages by [`Verbosity`] and emits
//! them as `tracing` events, so the subscriber installed by the caller
//! decides where they end up.

use std::time::Instant;

/// Verbosity level for training output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Warnings only.
    Warning,
    /// Start/finish and periodic round summaries.
    Info,
    /// Every round.
    Debug,
}

impl Verbosity {
    /// Map a numeric level (0 = silent .. 3 = debug).
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Warning,
            2 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }
}

/// Structured logger for a training run.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    model: &'static str,
    n_rounds: usize,
    start: Option<Instant>,
}

impl TrainingLogger {
    /// Create a logger for one model's training run.
    pub fn new(model: &'static str, verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            model,
            n_rounds: 0,
            start: None,
        }
    }

    /// Verbosity of this logger.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Planned number of rounds.
    pub fn n_rounds(&self) -> usize {
        self.n_rounds
    }

    /// Mark the start of training.
    pub fn start_training(&mut self, n_rounds: usize, n_samples: usize, n_features: usize) {
        self.n_rounds = n_rounds;
        self.start = Some(Instant::now());
        if self.verbosity >= Verbosity::Info {
            tracing::info!(model = self.model, n_rounds, n_samples, n_features, "training started");
        }
    }

    /// Log one round. At `Info` only every tenth round (and the last) is shown.
    pub fn log_round(&self, round: usize, n_leaves: usize) {
        let last = round + 1 == self.n_rounds;
        if self.verbosity >= Verbosity::Debug
            || (self.verbosity >= Verbosity::Info && (round % 10 == 0 || last))
        {
            tracing::info!(model = self.model, round, n_leaves, "round finished");
        }
    }

    /// Whether [`Self::log_metrics`] emits anything for `round`.
    ///
    /// Callers check this before computing metrics that are only logged.
    pub fn logs_metrics(&self, round: usize) -> bool {
        match self.verbosity {
            Verbosity::Debug => true,
            Verbosity::Info => round % 10 == 0,
            Verbosity::Silent | Verbosity::Warning => false,
        }
    }

    /// Log named metric values for a round.
    pub fn log_metrics(&self, round: usize, metrics: &[(&str, f64)]) {
        if !self.logs_metrics(round) {
            return;
        }
        let summary = metrics
            .iter()
            .map(|(name, value)| format!("{name}={value:.6}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(model = self.model, round, metrics = %summary, "evaluation");
    }

    /// Log that early stopping fired.
    pub fn log_early_stopping(&self, round: usize, best_round: usize, best_value: f64) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(model = self.model, round, best_round, best_value, "early stopping");
        }
    }

    /// Log a warning.
    pub fn warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Warning {
            tracing::warn!(model = self.model, "{message}");
        }
    }

    /// Log an informational message.
    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(model = self.model, "{message}");
        }
    }

    /// Mark the end of training.
    pub fn finish_training(&self, rounds_trained: usize) {
        if self.verbosity >= Verbosity::Info {
            let elapsed = self.start.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
            tracing::info!(model = self.model, rounds_trained, elapsed_s = elapsed, "training finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::Silent < Verbosity::Warning);
        assert!(Verbosity::Info < Verbosity::Debug);
        assert_eq!(Verbosity::from_level(2), Verbosity::Info);
        assert_eq!(Verbosity::from_level(9), Verbosity::Debug);
    }

    #[test]
    fn test_logger_tracks_rounds() {
        let mut logger = TrainingLogger::new("test", Verbosity::Silent);
        logger.start_training(5, 10, 2);
        logger.log_round(0, 3);
        logger.log_metrics(0, &[("loss", 1.0)]);
        logger.finish_training(5);
        assert_eq!(logger.n_rounds(), 5);
        assert_eq!(logger.verbosity(), Verbosity::Silent);
    }

    #[test]
    fn test_logs_metrics_follows_verbosity() {
        let silent = TrainingLogger::new("test", Verbosity::Silent);
        let warning = TrainingLogger::new("test", Verbosity::Warning);
        let info = TrainingLogger::new("test", Verbosity::Info);
        let debug = TrainingLogger::new("test", Verbosity::Debug);
        assert!(!silent.logs_metrics(0));
        assert!(!warning.logs_metrics(10));
        assert!(info.logs_metrics(20));
        assert!(!info.logs_metrics(21));
        assert!(debug.logs_metrics(21));
    }
}
