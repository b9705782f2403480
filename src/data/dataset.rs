//! Dataset container.
//!
//! This module provides [`Dataset`], the in-memory regression dataset shared by
//! the estimators, the cross-validation splitter and the loaders.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

// =============================================================================
// DatasetError
// =============================================================================

/// Errors raised while building or slicing a [`Dataset`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// Targets and features disagree on the number of samples.
    #[error("feature matrix has {features} samples but targets have {targets}")]
    TargetLength { features: usize, targets: usize },

    /// A row-major buffer does not match the declared shape.
    #[error("row-major buffer has {len} values, expected {rows} x {cols}")]
    Shape { len: usize, rows: usize, cols: usize },

    /// Wrong number of feature names.
    #[error("expected {expected} feature names, got {got}")]
    FeatureNames { expected: usize, got: usize },

    /// A sample index is out of bounds.
    #[error("sample index {index} out of bounds for {n_samples} samples")]
    IndexOutOfBounds { index: usize, n_samples: usize },

    /// A target is NaN or infinite. Only features may be missing.
    #[error("target of sample {row} is not finite")]
    NonFiniteTarget { row: usize },

    /// The dataset has no samples or no features.
    #[error("dataset is empty")]
    Empty,

    /// Binning was requested with an unsupported bin count.
    #[error("max_bins must be in 2..=255, got {0}")]
    InvalidMaxBins(u32),

    /// A dataset was binned with mappers fitted on a different feature count.
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },
}

// =============================================================================
// Dataset
// =============================================================================

/// A regression dataset.
///
/// # Storage Layout
///
/// Features are stored in **feature-major** layout: `[n_features, n_samples]`,
/// so each feature's values across all samples are contiguous. This is the
/// layout binning and histogram building want.
///
/// Missing values are represented as `f32::NAN`.
///
/// # Example
///
/// ```
/// use ensemble_bench::data::Dataset;
/// use ndarray::array;
///
/// // 2 features, 3 samples
/// let features = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
/// let ds = Dataset::new(features, vec![0.5, 1.0, 1.5], None).unwrap();
///
/// assert_eq!(ds.n_samples(), 3);
/// assert_eq!(ds.n_features(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature data: `[n_features, n_samples]` (feature-major, C-order).
    features: Array2<f32>,
    /// Target values, length = n_samples.
    targets: Vec<f32>,
    /// One name per feature.
    feature_names: Vec<String>,
}

impl Dataset {
    /// Create a dataset from a feature-major matrix.
    ///
    /// When `feature_names` is `None`, features are named `f0`, `f1`, ...
    /// Features may contain `NaN` (missing); targets must be finite.
    pub fn new(
        features: Array2<f32>,
        targets: Vec<f32>,
        feature_names: Option<Vec<String>>,
    ) -> Result<Self, DatasetError> {
        let (n_features, n_samples) = features.dim();
        if targets.len() != n_samples {
            return Err(DatasetError::TargetLength {
                features: n_samples,
                targets: targets.len(),
            });
        }
        if let Some(row) = targets.iter().position(|y| !y.is_finite()) {
            return Err(DatasetError::NonFiniteTarget { row });
        }

        let feature_names = match feature_names {
            Some(names) if names.len() != n_features => {
                return Err(DatasetError::FeatureNames {
                    expected: n_features,
                    got: names.len(),
                });
            }
            Some(names) => names,
            None => (0..n_features).map(|f| format!("f{f}")).collect(),
        };

        Ok(Self {
            features: features.as_standard_layout().into_owned(),
            targets,
            feature_names,
        })
    }

    /// Create a dataset from row-major (sample-major) features.
    pub fn from_rows(
        row_major: Vec<f32>,
        n_rows: usize,
        n_cols: usize,
        targets: Vec<f32>,
        feature_names: Option<Vec<String>>,
    ) -> Result<Self, DatasetError> {
        let len = row_major.len();
        let samples = Array2::from_shape_vec((n_rows, n_cols), row_major).map_err(|_| {
            DatasetError::Shape {
                len,
                rows: n_rows,
                cols: n_cols,
            }
        })?;
        Self::new(samples.reversed_axes(), targets, feature_names)
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.ncols()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the dataset has no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    /// Feature names, one per feature.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature-major view `[n_features, n_samples]`.
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// All values of one feature.
    #[inline]
    pub fn feature(&self, feature: usize) -> ArrayView1<'_, f32> {
        self.features.row(feature)
    }

    /// Target view.
    pub fn targets(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(&self.targets[..])
    }

    /// Target values as a slice.
    #[inline]
    pub fn target_slice(&self) -> &[f32] {
        &self.targets
    }

    /// Single feature value.
    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f32 {
        self.features[[feature, row]]
    }

    /// Features of one sample.
    #[inline]
    pub fn row(&self, row: usize) -> ArrayView1<'_, f32> {
        self.features.column(row)
    }

    /// Copy one sample's features into `out` (length = n_features).
    #[inline]
    pub fn copy_row(&self, row: usize, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.n_features());
        for (f, slot) in out.iter_mut().enumerate() {
            *slot = self.features[[f, row]];
        }
    }

    /// New dataset holding the given samples, in the given order.
    ///
    /// Indices may repeat.
    pub fn select(&self, indices: &[usize]) -> Result<Self, DatasetError> {
        let n_samples = self.n_samples();
        if let Some(&index) = indices.iter().find(|&&i| i >= n_samples) {
            return Err(DatasetError::IndexOutOfBounds { index, n_samples });
        }

        let features = self.features.select(Axis(1), indices);
        let targets: Vec<f32> = indices.iter().map(|&i| self.targets[i]).collect();

        Ok(Self {
            features: features.as_standard_layout().into_owned(),
            targets,
            feature_names: self.feature_names.clone(),
        })
    }

    /// Owned copy of the targets.
    pub fn targets_owned(&self) -> Array1<f32> {
        Array1::from(self.targets.clone())
    }
}
