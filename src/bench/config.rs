//! Benchmark configuration.
//!
//! A [`BenchmarkConfig`] is a plain serde struct so that experiments can be
//! described in TOML:
//!
//! ```toml
//! n_jobs = 0
//! return_train_score = true
//!
//! [dataset]
//! kind = "synthetic"
//! rows = 20640
//! seed = 0
//!
//! [cv]
//! n_splits = 4
//! shuffle = true
//! random_state = 0
//!
//! [[models]]
//! name = "Random Forest"
//! kind = "random_forest"
//! params = { min_samples_leaf = 5, random_state = 0 }
//! grid = { n_estimators = [10, 20, 50, 100] }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ensemble::{ParamSet, ParamValue};
use crate::model_selection::{KFold, ParamGrid};

/// Synthetic row count of the reference experiment (size of California housing).
pub const REFERENCE_ROWS: usize = 20_640;

/// Grid values kept per parameter in quick mode.
pub const QUICK_GRID_VALUES: usize = 3;

/// Row divisor applied in quick mode.
pub const QUICK_ROW_DIVISOR: usize = 10;

/// Errors raised while loading or validating a [`BenchmarkConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config defines no models")]
    NoModels,

    #[error("duplicate model name {0:?}")]
    DuplicateModel(String),

    #[error("model {0:?} has an empty parameter grid")]
    EmptyGrid(String),

    #[error("cross-validation needs at least 2 splits, got {0}")]
    InvalidSplits(usize),

    #[error("synthetic dataset needs at least one row")]
    NoRows,

    #[error("parquet input requires the `io-parquet` feature")]
    ParquetDisabled,
}

/// Where the benchmark data comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetConfig {
    /// Raw `cal_housing.data` file (8 features, target last).
    California { path: PathBuf },
    /// Headered CSV with a named target column.
    Csv { path: PathBuf, target: String },
    /// Parquet file with a named target column.
    Parquet { path: PathBuf, target: String },
    /// Generated California-like data.
    Synthetic { rows: usize, seed: u64 },
}

impl DatasetConfig {
    /// Pick a loader from the file extension. `.data` means California housing.
    pub fn from_path(path: impl Into<PathBuf>, target: Option<&str>) -> Self {
        let path = path.into();
        let target = target.unwrap_or("target").to_string();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => DatasetConfig::Parquet { path, target },
            Some(ext) if ext.eq_ignore_ascii_case("csv") => DatasetConfig::Csv { path, target },
            _ => DatasetConfig::California { path },
        }
    }

    /// Short description for reports.
    pub fn describe(&self) -> String {
        match self {
            DatasetConfig::California { path } => format!("California housing ({})", path.display()),
            DatasetConfig::Csv { path, target } => format!("{} (target `{target}`)", path.display()),
            DatasetConfig::Parquet { path, target } => format!("{} (target `{target}`)", path.display()),
            DatasetConfig::Synthetic { seed, .. } => format!("synthetic housing (seed {seed})"),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig::Synthetic {
            rows: REFERENCE_ROWS,
            seed: 0,
        }
    }
}

/// Cross-validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    pub n_splits: usize,
    pub shuffle: bool,
    pub random_state: u64,
    /// Refit the best candidate on the full dataset after the search.
    pub refit: bool,
}

impl CvConfig {
    pub fn kfold(&self) -> KFold {
        let kfold = KFold::new(self.n_splits);
        if self.shuffle {
            kfold.shuffled(self.random_state)
        } else {
            kfold
        }
    }
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            n_splits: 4,
            shuffle: true,
            random_state: 0,
            refit: true,
        }
    }
}

/// Which estimator a model entry trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    HistGradientBoosting,
}

/// One model of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name used in reports.
    pub name: String,
    pub kind: ModelKind,
    /// Fixed parameters applied before the grid.
    #[serde(default)]
    pub params: ParamSet,
    pub grid: ParamGrid,
}

impl ModelConfig {
    pub fn new(name: &str, kind: ModelKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            params: ParamSet::new(),
            grid: ParamGrid::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Names of the swept parameters, comma separated.
    pub fn swept(&self) -> String {
        self.grid.names().collect::<Vec<_>>().join(", ")
    }
}

/// A complete benchmark description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Worker threads per estimator (0 = all cores). Ignored for models whose
    /// `params` set `n_jobs` explicitly.
    pub n_jobs: usize,
    /// Also score the training part of every fold.
    pub return_train_score: bool,
    /// Divide the data by [`QUICK_ROW_DIVISOR`] and keep only the first
    /// [`QUICK_GRID_VALUES`] grid values.
    pub quick: bool,
    pub dataset: DatasetConfig,
    pub cv: CvConfig,
    pub models: Vec<ModelConfig>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        let forest = ModelConfig::new("Random Forest", ModelKind::RandomForest)
            .param("min_samples_leaf", 5)
            .param("random_state", 0)
            .grid(ParamGrid::new().with("n_estimators", [10, 20, 50, 100]));
        let boosting = ModelConfig::new("Hist Gradient Boosting", ModelKind::HistGradientBoosting)
            .param("max_leaf_nodes", 15)
            .param("random_state", 0)
            .param("early_stopping", false)
            .grid(ParamGrid::new().with("max_iter", [10, 20, 50, 100, 300, 500]));
        Self {
            n_jobs: 0,
            return_train_score: true,
            quick: false,
            dataset: DatasetConfig::default(),
            cv: CvConfig::default(),
            models: vec![forest, boosting],
        }
    }
}

impl BenchmarkConfig {
    /// Parse and validate a TOML document.
    ///
    /// `quick = true` in the document has the same effect as [`Self::quick`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        if config.quick {
            config = config.quick();
        }
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Switch to quick mode: smaller data, first grid values only.
    pub fn quick(mut self) -> Self {
        self.quick = true;
        for model in &mut self.models {
            model.grid.truncate(QUICK_GRID_VALUES);
        }
        self
    }

    /// Grid searched for `model`, after the quick-mode truncation.
    pub fn effective_grid(&self, model: &ModelConfig) -> ParamGrid {
        let mut grid = model.grid.clone();
        if self.quick {
            grid.truncate(QUICK_GRID_VALUES);
        }
        grid
    }

    /// Rows to use out of `n`, after the quick-mode reduction.
    pub fn effective_rows(&self, n: usize) -> usize {
        if self.quick {
            (n / QUICK_ROW_DIVISOR).max(1)
        } else {
            n
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        if self.cv.n_splits < 2 {
            return Err(ConfigError::InvalidSplits(self.cv.n_splits));
        }
        if let DatasetConfig::Synthetic { rows: 0, .. } = self.dataset {
            return Err(ConfigError::NoRows);
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModel(model.name.clone()));
            }
            if model.grid.is_empty() {
                return Err(ConfigError::EmptyGrid(model.name.clone()));
            }
        }
        Ok(())
    }
}
