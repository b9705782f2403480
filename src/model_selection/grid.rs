//! Exhaustive parameter grids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ensemble::{ParamSet, ParamValue};

/// Named lists of candidate values.
///
/// Candidates are the cartesian product of all lists. Names are iterated in
/// sorted order and the last name varies fastest.
///
/// ```
/// use ensemble_bench::model_selection::ParamGrid;
///
/// let grid = ParamGrid::new()
///     .with("max_iter", [10, 20])
///     .with("learning_rate", [0.1, 0.5]);
/// let candidates = grid.candidates();
/// assert_eq!(candidates.len(), 4);
/// assert_eq!(candidates[1]["learning_rate"].to_string(), "0.1");
/// assert_eq!(candidates[1]["max_iter"].to_string(), "20");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid {
    params: BTreeMap<String, Vec<ParamValue>>,
}

impl ParamGrid {
    /// Empty grid (a single candidate with no parameters).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the values of one parameter.
    pub fn with<V: Into<ParamValue>>(mut self, name: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.insert(name, values.into_iter().map(Into::into).collect());
        self
    }

    /// Add (or replace) the values of one parameter.
    pub fn insert(&mut self, name: &str, values: Vec<ParamValue>) {
        self.params.insert(name.to_string(), values);
    }

    /// Parameter names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Values of one parameter.
    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.params.get(name).map(Vec::as_slice)
    }

    /// Keep only the first `n` values of every parameter.
    pub fn truncate(&mut self, n: usize) {
        for values in self.params.values_mut() {
            values.truncate(n);
        }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.params.values().map(Vec::len).product()
    }

    /// Whether the grid yields no candidates (some list is empty).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination, last name varying fastest.
    pub fn candidates(&self) -> Vec<ParamSet> {
        let mut out = vec![ParamSet::new()];
        for (name, values) in &self.params {
            out = out
                .into_iter()
                .flat_map(|base| {
                    values.iter().map(move |v| {
                        let mut set = base.clone();
                        set.insert(name.clone(), v.clone());
                        set
                    })
                })
                .collect();
        }
        out
    }
}
