//! Property values stored on nodes and edges

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single property value.
///
/// Post scalars map onto `String`, `Integer` (timestamps, scores, counts) and `Float`
/// (upvote ratio, edge weights).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as f64; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{:?}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

/// Property map for nodes and edges
pub type PropertyMap = HashMap<String, PropertyValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(PropertyValue::from("t3_1").as_str(), Some("t3_1"));
        assert_eq!(PropertyValue::from(20i64).as_integer(), Some(20));
        assert_eq!(PropertyValue::from(20i64).as_float(), Some(20.0));
        assert_eq!(PropertyValue::from(0.97).as_float(), Some(0.97));
        assert_eq!(PropertyValue::from("x").as_integer(), None);
        assert_eq!(PropertyValue::from("x").as_float(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::from("rust").to_string(), "\"rust\"");
        assert_eq!(PropertyValue::from(7i64).to_string(), "7");
        assert_eq!(PropertyValue::from(0.5).to_string(), "0.5");
    }
}
