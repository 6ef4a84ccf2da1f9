//! Structured value type for stances, capability results and task inputs
//!
//! Capability results and conflict stances arrive in arbitrary shapes. Rather
//! than probing runtime types, everything structured flows through [`Value`]:
//! a small tagged union of the shapes the system actually reasons about
//! (numbers, text, flags, nested maps).
//!
//! Identity comparisons (voting, agreement, majority counting) use
//! [`Value::canonical`], a deterministic serialization backed by `BTreeMap`
//! key ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured value with a fixed set of shapes
///
/// # Example
///
/// ```
/// use conductor_domain::Value;
///
/// let stance = Value::map([
///     ("score", Value::number(85.0)),
///     ("approved", Value::flag(true)),
/// ]);
/// assert_eq!(stance.get("score").and_then(Value::as_number), Some(85.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag
    Flag(bool),
    /// Numeric value (all numbers are f64)
    Number(f64),
    /// Free text
    Text(String),
    /// Nested key-value map with deterministic key order
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a numeric value
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// Create a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Create a boolean flag
    pub fn flag(b: bool) -> Self {
        Value::Flag(b)
    }

    /// Create a map value from key-value pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Get the numeric content, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the text content, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the map content, if this is a map
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key in a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Canonical serialized form, used for identity comparison
    ///
    /// Two values vote for the same outcome iff their canonical forms are
    /// equal. Map keys are ordered, so equal maps always serialize equally.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    /// Approximate size of the value in characters when serialized
    pub fn size(&self) -> usize {
        self.canonical().len()
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_access() {
        let value = Value::map([("quality", Value::number(92.0))]);
        assert_eq!(value.get("quality").and_then(Value::as_number), Some(92.0));
        assert!(value.get("missing").is_none());
    }

    #[test]
    fn test_canonical_is_order_independent_for_maps() {
        let a = Value::map([("x", Value::number(1.0)), ("y", Value::number(2.0))]);
        let b = Value::map([("y", Value::number(2.0)), ("x", Value::number(1.0))]);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_canonical_distinguishes_values() {
        assert_ne!(Value::number(10.0).canonical(), Value::number(20.0).canonical());
        assert_ne!(Value::flag(true).canonical(), Value::text("true").canonical());
    }

    #[test]
    fn test_untagged_deserialization() {
        let value: Value = serde_json::from_str(r#"{"score": 85.0, "ok": true}"#).unwrap();
        assert_eq!(value.get("score").and_then(Value::as_number), Some(85.0));
        assert_eq!(value.get("ok"), Some(&Value::Flag(true)));
    }
}
