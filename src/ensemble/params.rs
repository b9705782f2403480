//! Hyper-parameter values shared by the estimators and grid search.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// ParamError
// =============================================================================

/// Errors raised while validating or assigning hyper-parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    /// The estimator has no parameter with this name.
    #[error("unknown parameter `{name}` for {estimator}")]
    Unknown { estimator: &'static str, name: String },

    /// The value has the wrong kind for the parameter.
    #[error("parameter `{name}` expects {expected}, got {got}")]
    Type {
        name: String,
        expected: &'static str,
        got: ParamValue,
    },

    /// The value is of the right kind but out of range.
    #[error("parameter `{name}` {reason}, got {value}")]
    OutOfRange {
        name: &'static str,
        reason: &'static str,
        value: String,
    },
}

impl ParamError {
    pub(crate) fn out_of_range(name: &'static str, reason: &'static str, value: impl fmt::Display) -> Self {
        ParamError::OutOfRange {
            name,
            reason,
            value: value.to_string(),
        }
    }
}

// =============================================================================
// ParamValue
// =============================================================================

/// A dynamically typed hyper-parameter value.
///
/// Deserializes from plain TOML/JSON scalars: `100`, `0.1`, `true`, `"sqrt"`.
/// The string `"none"` stands for [`ParamValue::None`] in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    None,
}

impl ParamValue {
    /// Whether this value means "no value".
    pub fn is_none(&self) -> bool {
        match self {
            ParamValue::None => true,
            ParamValue::Str(s) => s.eq_ignore_ascii_case("none"),
            _ => false,
        }
    }

    /// Non-negative integer.
    pub fn as_usize(&self, name: &str) -> Result<usize, ParamError> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as usize),
            _ => Err(self.type_error(name, "a non-negative integer")),
        }
    }

    /// Non-negative integer that fits in `u32`.
    pub fn as_u32(&self, name: &str) -> Result<u32, ParamError> {
        match self {
            ParamValue::Int(v) => u32::try_from(*v).map_err(|_| self.type_error(name, "an integer in u32 range")),
            _ => Err(self.type_error(name, "a non-negative integer")),
        }
    }

    /// Number (integers are widened).
    pub fn as_f64(&self, name: &str) -> Result<f64, ParamError> {
        match self {
            ParamValue::Int(v) => Ok(*v as f64),
            ParamValue::Float(v) => Ok(*v),
            _ => Err(self.type_error(name, "a number")),
        }
    }

    /// Boolean.
    pub fn as_bool(&self, name: &str) -> Result<bool, ParamError> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(self.type_error(name, "a boolean")),
        }
    }

    /// Non-negative integer, or `None`.
    pub fn as_optional_usize(&self, name: &str) -> Result<Option<usize>, ParamError> {
        if self.is_none() {
            Ok(None)
        } else {
            self.as_usize(name).map(Some)
        }
    }

    pub(crate) fn type_error(&self, name: &str, expected: &'static str) -> ParamError {
        ParamError::Type {
            name: name.to_string(),
            expected,
            got: self.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::None => f.write_str("None"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        // Go through the shortest decimal form so 0.1f32 reads back as 0.1.
        ParamValue::Float(v.to_string().parse().unwrap_or(v as f64))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::None, Into::into)
    }
}

/// Named parameter values, ordered by name.
pub type ParamSet = BTreeMap<String, ParamValue>;

// =============================================================================
// RandomState
// =============================================================================

/// Seed source for an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RandomState {
    /// Fixed seed: repeated fits give identical models.
    Seeded(u64),
    /// Fresh OS entropy on every fit.
    Entropy,
}

impl RandomState {
    /// Seed for one fit.
    pub fn seed(self) -> u64 {
        match self {
            RandomState::Seeded(seed) => seed,
            RandomState::Entropy => rand::random(),
        }
    }

    pub(crate) fn from_param(name: &str, value: &ParamValue) -> Result<Self, ParamError> {
        if value.is_none() {
            return Ok(RandomState::Entropy);
        }
        match value {
            ParamValue::Int(v) if *v >= 0 => Ok(RandomState::Seeded(*v as u64)),
            _ => Err(value.type_error(name, "a non-negative integer or none")),
        }
    }
}

impl Default for RandomState {
    fn default() -> Self {
        RandomState::Seeded(0)
    }
}

impl From<u64> for RandomState {
    fn from(seed: u64) -> Self {
        RandomState::Seeded(seed)
    }
}

impl From<RandomState> for ParamValue {
    fn from(v: RandomState) -> Self {
        match v {
            RandomState::Seeded(seed) => ParamValue::Int(seed as i64),
            RandomState::Entropy => ParamValue::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("100", ParamValue::Int(100))]
    #[case("0.5", ParamValue::Float(0.5))]
    #[case("true", ParamValue::Bool(true))]
    #[case("\"sqrt\"", ParamValue::Str("sqrt".into()))]
    fn test_deserialize_untagged(#[case] json: &str, #[case] expected: ParamValue) {
        let value: ParamValue = serde_json::from_str(json).unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(ParamValue::Int(5).as_usize("n").unwrap(), 5);
        assert!(ParamValue::Int(-1).as_usize("n").is_err());
        assert_eq!(ParamValue::Int(2).as_f64("x").unwrap(), 2.0);
        assert!(matches!(
            ParamValue::Float(0.5).as_bool("b"),
            Err(ParamError::Type { expected: "a boolean", .. })
        ));
        assert_eq!(ParamValue::Str("None".into()).as_optional_usize("d").unwrap(), None);
        assert_eq!(ParamValue::from(0.1f32), ParamValue::Float(0.1));
        assert_eq!(ParamValue::from(None::<usize>), ParamValue::None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ParamValue::Int(300).to_string(), "300");
        assert_eq!(ParamValue::Float(0.1).to_string(), "0.1");
        assert_eq!(ParamValue::None.to_string(), "None");
    }

    #[test]
    fn test_random_state() {
        assert_eq!(RandomState::default().seed(), 0);
        assert_eq!(
            RandomState::from_param("random_state", &ParamValue::None).unwrap(),
            RandomState::Entropy
        );
        assert_eq!(ParamValue::from(RandomState::Seeded(7)), ParamValue::Int(7));
    }
}
