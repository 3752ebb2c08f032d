//! The value model shared by raw grammar input and evaluation results.

use crate::error::GrammarError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// An atomic configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// A configuration value, resolved or not.
///
/// The same type describes the decoded input a grammar tree is parsed from
/// and the result of evaluating that tree. `Unset` is the marker for "no
/// applicable clause produced anything"; whether that is acceptable is the
/// caller's decision (see [`Value::into_required`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),

    /// Ordered list of values.
    Sequence(Vec<Value>),

    /// String-keyed map; insertion order is kept for deterministic output.
    Mapping(IndexMap<String, Value>),

    /// Nothing was selected. Serializes as `null`.
    #[default]
    Unset,
}

impl Value {
    /// Create a string scalar.
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    /// Create an integer scalar.
    pub fn integer(i: i64) -> Self {
        Value::Scalar(Scalar::Integer(i))
    }

    /// Create a float scalar.
    pub fn float(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }

    /// Create a bool scalar.
    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    /// Create a sequence from anything convertible to values.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Create a mapping from `(key, value)` pairs, keeping their order.
    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Get the string content if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Get the sequence items if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get the entries if this is a mapping.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Short description of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(Scalar::String(_)) => "string",
            Value::Scalar(Scalar::Integer(_)) => "integer",
            Value::Scalar(Scalar::Float(_)) => "float",
            Value::Scalar(Scalar::Bool(_)) => "bool",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Unset => "unset",
        }
    }

    /// Turn `Unset` into [`GrammarError::UnmatchedGrammar`] for a value the
    /// caller considers mandatory.
    pub fn into_required(self, field: Option<&str>) -> Result<Value, GrammarError> {
        match self {
            Value::Unset => Err(GrammarError::UnmatchedGrammar {
                field: field.map(str::to_string),
            }),
            value => Ok(value),
        }
    }

    /// Convert decoded JSON into a value. `null` becomes `Unset`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Unset,
            serde_json::Value::Bool(b) => Value::bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::integer(i),
                // u64 beyond i64::MAX and real numbers
                None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Mapping(entries)
    }
}

/// Compact JSON rendering, so error messages show values unambiguously.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}
