//! Leaf validation.
//!
//! The evaluator hands every resolved leaf to an optional [`LeafValidator`].
//! A validator may accept the value, coerce it into another form, or reject
//! it; rejections surface as [`GrammarError::TypeMismatch`] and are what a
//! `try` clause recovers from.
//!
//! [`GrammarError::TypeMismatch`]: crate::GrammarError::TypeMismatch

use crate::value::{Scalar, Value};
use std::fmt;

/// Why a leaf was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRejection {
    /// What the validator wanted, e.g. `"a string"`.
    pub expected: String,
}

impl LeafRejection {
    pub fn expected(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl fmt::Display for LeafRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}", self.expected)
    }
}

/// Checks and possibly coerces a resolved leaf.
pub trait LeafValidator {
    fn check(&self, value: Value) -> Result<Value, LeafRejection>;
}

impl<F> LeafValidator for F
where
    F: Fn(Value) -> Result<Value, LeafRejection>,
{
    fn check(&self, value: Value) -> Result<Value, LeafRejection> {
        self(value)
    }
}

/// The built-in leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeafType {
    /// Strings; integers and floats are converted to their decimal form.
    String,
    Integer,
    /// Floats; integers are widened.
    Float,
    Bool,
    Mapping,
    /// A mapping with exactly one key, e.g. `{name: value}` items of a list.
    SingleEntryMapping,
    /// Anything but `Unset`.
    #[default]
    Any,
}

impl LeafType {
    /// Description used in rejection messages.
    pub fn expected(self) -> &'static str {
        match self {
            LeafType::String => "a string",
            LeafType::Integer => "an integer",
            LeafType::Float => "a number",
            LeafType::Bool => "a boolean",
            LeafType::Mapping => "a mapping",
            LeafType::SingleEntryMapping => "a mapping with a single key",
            LeafType::Any => "a value",
        }
    }
}

impl LeafValidator for LeafType {
    fn check(&self, value: Value) -> Result<Value, LeafRejection> {
        let accepted = match (self, value) {
            (LeafType::String, Value::Scalar(Scalar::String(s))) => Value::string(s),
            (LeafType::String, Value::Scalar(Scalar::Integer(i))) => Value::string(i.to_string()),
            (LeafType::String, Value::Scalar(Scalar::Float(f))) => Value::string(f.to_string()),
            (LeafType::Integer, v @ Value::Scalar(Scalar::Integer(_))) => v,
            (LeafType::Float, v @ Value::Scalar(Scalar::Float(_))) => v,
            (LeafType::Float, Value::Scalar(Scalar::Integer(i))) => Value::float(i as f64),
            (LeafType::Bool, v @ Value::Scalar(Scalar::Bool(_))) => v,
            (LeafType::Mapping, v @ Value::Mapping(_)) => v,
            (LeafType::SingleEntryMapping, Value::Mapping(entries)) if entries.len() == 1 => {
                Value::Mapping(entries)
            }
            (LeafType::Any, v) if !v.is_unset() => v,
            _ => return Err(LeafRejection::expected(self.expected())),
        };
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_coerces_numbers() {
        assert_eq!(LeafType::String.check(Value::integer(3)), Ok(Value::string("3")));
        assert_eq!(LeafType::String.check(Value::float(1.5)), Ok(Value::string("1.5")));
        assert_eq!(
            LeafType::String.check(Value::bool(true)),
            Err(LeafRejection::expected("a string"))
        );
    }

    #[test]
    fn test_integer_is_strict() {
        assert!(LeafType::Integer.check(Value::integer(7)).is_ok());
        assert!(LeafType::Integer.check(Value::bool(true)).is_err());
        assert!(LeafType::Integer.check(Value::float(7.0)).is_err());
        assert!(LeafType::Integer.check(Value::string("7")).is_err());
    }

    #[test]
    fn test_float_widens_integers() {
        assert_eq!(LeafType::Float.check(Value::integer(2)), Ok(Value::float(2.0)));
    }

    #[test]
    fn test_single_entry_mapping() {
        let one = Value::mapping([("name", "value")]);
        assert_eq!(LeafType::SingleEntryMapping.check(one.clone()), Ok(one));
        let two = Value::mapping([("a", "1"), ("b", "2")]);
        assert!(LeafType::SingleEntryMapping.check(two.clone()).is_err());
        assert!(LeafType::Mapping.check(two).is_ok());
    }

    #[test]
    fn test_closures_are_validators() {
        let no_dashes = |value: Value| match value.as_str() {
            Some(s) if s.contains('-') => Err(LeafRejection::expected("a name without dashes")),
            _ => Ok(value),
        };
        assert!(no_dashes.check(Value::string("gcc")).is_ok());
        let rejection = no_dashes.check(Value::string("gcc-12")).unwrap_err();
        assert_eq!(rejection.to_string(), "expected a name without dashes");
    }
}
