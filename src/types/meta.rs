//! Snapshot metadata types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot metadata, keyed for deterministic iteration.
pub type Meta = BTreeMap<String, MetaValue>;

/// Scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number. Must be finite to hash.
    Float(f64),
    /// Free text.
    Text(String),
}

impl MetaValue {
    /// Get the value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for MetaValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for MetaValue {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<SubjectId> for MetaValue {
    fn from(id: SubjectId) -> Self {
        match id {
            SubjectId::Numeric(i) => Self::Integer(i),
            SubjectId::Text(s) => Self::Text(s),
        }
    }
}

/// Identifier of the entity a context pack is built for.
///
/// Serialized untagged: numeric ids stay JSON numbers, so `123` and `"123"`
/// produce different pack ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    /// Numeric database id.
    Numeric(i64),
    /// Opaque text id.
    Text(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(i: i64) -> Self {
        Self::Numeric(i)
    }
}

impl From<i32> for SubjectId {
    fn from(i: i32) -> Self {
        Self::Numeric(i64::from(i))
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}
