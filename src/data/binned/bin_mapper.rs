//! Bin mapper for mapping feature values to bin indices.
//!
//! A [`BinMapper`] holds the quantile thresholds of one numerical feature.
//! Values map to the first bin whose upper bound is `>= value`. Missing values
//! (`NaN`) always map to a dedicated trailing bin.

/// Mapping from continuous values to bin indices.
///
/// Bins `0..n_value_bins` hold non-missing values, ordered by their upper
/// bound; bin `n_value_bins` is the missing-value bin. A split at bin `b`
/// sends `bin <= b` left, which is equivalent to `value <= upper_bound(b)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BinMapper {
    /// Upper bound of each value bin. Strictly increasing; the last one is `+inf`.
    upper_bounds: Box<[f32]>,
    /// Whether any NaN was seen while fitting.
    has_missing: bool,
}

impl BinMapper {
    /// Fit bin thresholds on the (possibly subsampled) values of one feature.
    ///
    /// When the feature has at most `max_bins` distinct values, thresholds are
    /// the midpoints between consecutive distinct values. Otherwise thresholds
    /// are midpoint-interpolated quantiles at `max_bins` evenly spaced
    /// percentiles, deduplicated.
    pub fn fit(values: &[f32], max_bins: u32) -> Self {
        debug_assert!((2..=255).contains(&max_bins));

        let has_missing = values.iter().any(|v| v.is_nan());
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut distinct = sorted.clone();
        distinct.dedup();

        let mut upper_bounds: Vec<f32> = if distinct.len() <= max_bins as usize {
            distinct
                .windows(2)
                .map(|w| midpoint(w[0], w[1]))
                .collect()
        } else {
            let n = sorted.len();
            (1..max_bins)
                .map(|i| {
                    let q = i as f64 / max_bins as f64;
                    let pos = q * (n - 1) as f64;
                    let lo = pos.floor() as usize;
                    let hi = pos.ceil() as usize;
                    midpoint(sorted[lo], sorted[hi])
                })
                .collect()
        };
        upper_bounds.dedup();
        upper_bounds.push(f32::INFINITY);

        Self {
            upper_bounds: upper_bounds.into_boxed_slice(),
            has_missing,
        }
    }

    /// Number of bins holding non-missing values.
    #[inline]
    pub fn n_value_bins(&self) -> u32 {
        self.upper_bounds.len() as u32
    }

    /// Total number of bins, including the missing-value bin.
    #[inline]
    pub fn n_bins(&self) -> u32 {
        self.n_value_bins() + 1
    }

    /// Index of the missing-value bin.
    #[inline]
    pub fn missing_bin(&self) -> u32 {
        self.n_value_bins()
    }

    /// Whether NaN values were present when fitting.
    #[inline]
    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    /// Check if this feature is trivial (only one value bin, no splits possible).
    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.n_value_bins() <= 1 && !self.has_missing
    }

    /// Map a value to its bin index.
    #[inline]
    pub fn value_to_bin(&self, value: f32) -> u32 {
        if value.is_nan() {
            return self.missing_bin();
        }
        let bin = self.upper_bounds.partition_point(|&ub| ub < value);
        bin.min(self.upper_bounds.len() - 1) as u32
    }

    /// Split threshold for a bin: values `<=` this go left.
    #[inline]
    pub fn bin_to_value(&self, bin: u32) -> f32 {
        self.upper_bounds
            .get(bin as usize)
            .copied()
            .unwrap_or(f32::INFINITY)
    }

    /// Upper bounds of the value bins.
    pub fn upper_bounds(&self) -> &[f32] {
        &self.upper_bounds
    }
}

#[inline]
fn midpoint(a: f32, b: f32) -> f32 {
    (a as f64 * 0.5 + b as f64 * 0.5) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_few_distinct_values_use_midpoints() {
        let mapper = BinMapper::fit(&[1.0, 2.0, 2.0, 4.0], 255);
        assert_eq!(mapper.upper_bounds(), &[1.5, 3.0, f32::INFINITY]);
        assert_eq!(mapper.n_value_bins(), 3);
        assert_eq!(mapper.n_bins(), 4);
        assert_eq!(mapper.value_to_bin(1.0), 0);
        assert_eq!(mapper.value_to_bin(2.0), 1);
        assert_eq!(mapper.value_to_bin(4.0), 2);
        assert_eq!(mapper.value_to_bin(100.0), 2);
        assert_eq!(mapper.value_to_bin(-100.0), 0);
    }

    #[test]
    fn test_missing_values_map_to_trailing_bin() {
        let mapper = BinMapper::fit(&[1.0, f32::NAN, 3.0], 255);
        assert!(mapper.has_missing());
        assert_eq!(mapper.value_to_bin(f32::NAN), mapper.missing_bin());
        assert_eq!(mapper.missing_bin(), 2);
    }

    #[test]
    fn test_constant_feature_is_trivial() {
        let mapper = BinMapper::fit(&[5.0; 10], 255);
        assert!(mapper.is_trivial());
        assert_eq!(mapper.n_value_bins(), 1);
    }

    #[test]
    fn test_quantile_binning_caps_bin_count() {
        let values: Vec<f32> = (0..10_000).map(|i| i as f32).collect();
        let mapper = BinMapper::fit(&values, 16);
        assert!(mapper.n_value_bins() <= 16);
        assert!(mapper.n_value_bins() >= 15);
    }

    #[test]
    fn test_bin_threshold_consistency() {
        let values: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.37).sin()).collect();
        let mapper = BinMapper::fit(&values, 32);
        for &v in &values {
            let bin = mapper.value_to_bin(v);
            assert!(v <= mapper.bin_to_value(bin));
            if bin > 0 {
                assert!(v > mapper.bin_to_value(bin - 1));
            }
        }
    }

    proptest! {
        #[test]
        fn prop_value_to_bin_is_monotonic(
            mut values in proptest::collection::vec(-1e6f32..1e6, 1..500),
            max_bins in 2u32..=255,
        ) {
            let mapper = BinMapper::fit(&values, max_bins);
            values.sort_by(|a, b| a.total_cmp(b));
            let bins: Vec<u32> = values.iter().map(|&v| mapper.value_to_bin(v)).collect();
            prop_assert!(bins.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(bins.iter().all(|&b| b < mapper.n_value_bins()));
        }
    }
}
