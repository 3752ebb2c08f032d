//! Resolving one configuration field: parse, evaluate, then normalise the
//! result to the shape the field is declared with.

use crate::checker::LeafType;
use crate::environment::Environment;
use crate::error::GrammarError;
use crate::evaluate::{merge_first_wins, Evaluator};
use crate::parse::parse;
use crate::statement::Statement;
use crate::validate::ParseOptions;
use crate::value::Value;
use indexmap::IndexMap;

/// Declared shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Scalar,
    List,
    Mapping,
}

/// Declaration of a field whose value may be written with grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub shape: Shape,
    /// Validator for every leaf of the field.
    pub leaf: LeafType,
    /// Whether an unmatched field is an error.
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, shape: Shape, leaf: LeafType) -> Self {
        Self {
            name: name.into(),
            shape,
            leaf,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Evaluate an already parsed tree for this field.
    pub fn resolve(&self, tree: &Statement, env: &Environment) -> Result<Value, GrammarError> {
        let value = Evaluator::new(env)
            .with_validator(&self.leaf)
            .with_shape(self.shape)
            .evaluate(tree)?;
        self.normalize(value)
    }

    /// Bring an evaluated value into the declared shape.
    pub fn normalize(&self, value: Value) -> Result<Value, GrammarError> {
        if value.is_unset() {
            if self.required {
                return value.into_required(Some(self.name.as_str()));
            }
            return Ok(match self.shape {
                Shape::List => Value::Sequence(Vec::new()),
                Shape::Scalar | Shape::Mapping => Value::Unset,
            });
        }

        match (self.shape, value) {
            (Shape::Scalar, Value::Sequence(mut items)) if items.len() == 1 => Ok(items.remove(0)),
            (Shape::Scalar, value @ (Value::Sequence(_) | Value::Mapping(_))) => {
                Err(self.mismatch("a single value", &value))
            }
            (Shape::List, value @ (Value::Scalar(_) | Value::Mapping(_))) => {
                Ok(Value::Sequence(vec![value]))
            }
            (Shape::Mapping, Value::Sequence(items)) => {
                let mut merged = IndexMap::new();
                for item in items {
                    match item {
                        Value::Mapping(entries) => merge_first_wins(&mut merged, entries),
                        other => return Err(self.mismatch("a mapping", &other)),
                    }
                }
                Ok(Value::Mapping(merged))
            }
            (Shape::Mapping, value @ Value::Scalar(_)) => Err(self.mismatch("a mapping", &value)),
            (_, value) => Ok(value),
        }
    }

    fn mismatch(&self, expected: &str, value: &Value) -> GrammarError {
        GrammarError::TypeMismatch {
            expected: format!("{} for '{}'", expected, self.name),
            got: value.type_name().to_string(),
            value: value.to_string(),
        }
    }
}

/// Parse `raw`, evaluate it against `env` and normalise it per `spec`.
pub fn resolve_field(
    raw: &Value,
    env: &Environment,
    options: &ParseOptions,
    spec: &FieldSpec,
) -> Result<Value, GrammarError> {
    let tree = parse(raw, options)?;
    let value = spec.resolve(&tree, env)?;
    tracing::debug!(field = %spec.name, shape = ?spec.shape, "field resolved");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(raw: serde_json::Value, spec: &FieldSpec, env: &Environment) -> Result<Value, GrammarError> {
        resolve_field(&Value::from(raw), env, &ParseOptions::default(), spec)
    }

    #[test]
    fn test_list_field_wraps_scalars() {
        let spec = FieldSpec::new("build-packages", Shape::List, LeafType::String);
        let value = resolve(json!({"on amd64": "gcc"}), &spec, &Environment::native("amd64")).unwrap();
        assert_eq!(value, Value::sequence(["gcc"]));
    }

    #[test]
    fn test_unmatched_optional_list_is_empty() {
        let spec = FieldSpec::new("build-packages", Shape::List, LeafType::String);
        let value = resolve(json!([{"on amd64": ["gcc"]}]), &spec, &Environment::native("arm64")).unwrap();
        assert_eq!(value, Value::Sequence(Vec::new()));
    }

    #[test]
    fn test_list_field_keeps_every_selected_clause() {
        let spec = FieldSpec::new("build-packages", Shape::List, LeafType::String);
        let env = Environment::native("amd64").with_target_arch("arm64");
        let value = resolve(json!([{"on amd64": "gcc"}, {"to arm64": "g++"}]), &spec, &env).unwrap();
        assert_eq!(value, Value::sequence(["gcc", "g++"]));
    }

    #[test]
    fn test_overlapping_clauses_in_list_field() {
        let spec = FieldSpec::new("build-packages", Shape::List, LeafType::String);
        let raw = json!([{"on amd64": "gcc"}, {"on amd64,arm64": "make"}]);
        let value = resolve(raw.clone(), &spec, &Environment::native("amd64")).unwrap();
        assert_eq!(value, Value::sequence(["gcc", "make"]));

        // The same tree is ambiguous where a single value is declared.
        let scalar = FieldSpec::new("build-packages", Shape::Scalar, LeafType::String);
        let err = resolve(raw, &scalar, &Environment::native("amd64")).unwrap_err();
        assert!(matches!(err, GrammarError::AmbiguousSelection { .. }));
    }

    #[test]
    fn test_empty_list_satisfies_required_field() {
        let spec = FieldSpec::new("build-packages", Shape::List, LeafType::String).required();
        let value = resolve(json!([]), &spec, &Environment::native("amd64")).unwrap();
        assert_eq!(value, Value::Sequence(Vec::new()));
    }

    #[test]
    fn test_unmatched_required_list_field() {
        let spec = FieldSpec::new("build-packages", Shape::List, LeafType::String).required();
        let err = resolve(json!([{"on amd64": "gcc"}]), &spec, &Environment::native("arm64")).unwrap_err();
        assert_eq!(
            err,
            GrammarError::UnmatchedGrammar {
                field: Some("build-packages".to_string())
            }
        );
    }

    #[test]
    fn test_unmatched_required_field() {
        let spec = FieldSpec::new("source", Shape::Scalar, LeafType::String).required();
        let err = resolve(json!([{"on amd64": "a.tar"}]), &spec, &Environment::native("arm64")).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"No grammar clause matched for required field 'source'");
    }

    #[test]
    fn test_scalar_field_unwraps_single_item() {
        let spec = FieldSpec::new("source", Shape::Scalar, LeafType::String);
        let env = Environment::native("amd64");
        let value = resolve(json!(["a.tar"]), &spec, &env).unwrap();
        assert_eq!(value, Value::string("a.tar"));

        let err = resolve(json!(["a.tar", "b.tar"]), &spec, &env).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Expected a single value for 'source', got sequence ["a.tar","b.tar"]"#
        );
    }

    #[test]
    fn test_mapping_field_merges_items() {
        let spec = FieldSpec::new("build-environment", Shape::Mapping, LeafType::Mapping);
        let raw = json!([
            {"CC": "gcc"},
            {"on amd64": [{"CFLAGS": "-m64"}, {"CC": "clang"}]}
        ]);
        let value = resolve(raw, &spec, &Environment::native("amd64")).unwrap();
        let Value::Mapping(entries) = value else {
            panic!("expected a mapping");
        };
        assert_eq!(entries["CC"], Value::string("gcc"));
        assert_eq!(entries["CFLAGS"], Value::string("-m64"));
    }

    #[test]
    fn test_mapping_field_rejects_scalars() {
        let spec = FieldSpec::new("build-environment", Shape::Mapping, LeafType::Any);
        let err = resolve(json!("nope"), &spec, &Environment::native("amd64")).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_construction_errors_come_first() {
        let spec = FieldSpec::new("source", Shape::Scalar, LeafType::String);
        let err = resolve(json!([{"else": "x"}]), &spec, &Environment::native("amd64")).unwrap_err();
        assert!(err.is_construction_error());
    }
}
