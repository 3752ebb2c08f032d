//! # craft-grammar-yaml
//!
//! Loads YAML documents into [`craft_grammar::Value`] so recipes written in
//! YAML can be parsed and evaluated with `craft-grammar`.
//!
//! YAML `null` (and an empty document) becomes [`Value::Unset`]. Mapping
//! keys must be strings; aliases are not supported.
//!
//! ## Example
//!
//! ```rust
//! use craft_grammar::{parse, evaluate, Environment, ParseOptions, Value};
//! use craft_grammar_yaml::load_str;
//!
//! let raw = load_str(r#"
//! - on amd64: [nasm]
//! - else: [gcc]
//! "#).unwrap();
//! let tree = parse(&raw, &ParseOptions::default()).unwrap();
//! let value = evaluate(&tree, &Environment::native("arm64"), None).unwrap();
//! assert_eq!(value, Value::sequence(["gcc"]));
//! ```

mod error;

pub use error::{Error, Result};

use craft_grammar::Value;
use indexmap::IndexMap;
use yaml_rust2::{Yaml, YamlLoader};

/// Load the first document of `content`. Empty input is `Unset`.
pub fn load_str(content: &str) -> Result<Value> {
    let mut documents = load_documents(content)?;
    if documents.is_empty() {
        return Ok(Value::Unset);
    }
    Ok(documents.swap_remove(0))
}

/// Load every document of a multi-document stream.
pub fn load_documents(content: &str) -> Result<Vec<Value>> {
    let documents = YamlLoader::load_from_str(content)?;
    tracing::debug!(documents = documents.len(), "yaml loaded");
    documents.iter().map(value_from_yaml).collect()
}

/// Convert one `yaml-rust2` node.
pub fn value_from_yaml(yaml: &Yaml) -> Result<Value> {
    let value = match yaml {
        Yaml::Null => Value::Unset,
        Yaml::Boolean(b) => Value::bool(*b),
        Yaml::Integer(i) => Value::integer(*i),
        Yaml::Real(raw) => match yaml.as_f64() {
            Some(f) => Value::float(f),
            None => {
                return Err(Error::InvalidStructure {
                    message: format!("'{}' is not a valid number", raw),
                });
            }
        },
        Yaml::String(s) => Value::string(s.as_str()),
        Yaml::Array(items) => Value::Sequence(
            items
                .iter()
                .map(value_from_yaml)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Hash(hash) => {
            let mut entries = IndexMap::with_capacity(hash.len());
            for (key, value) in hash {
                let Yaml::String(key) = key else {
                    return Err(Error::InvalidStructure {
                        message: format!("mapping keys must be strings, got {:?}", key),
                    });
                };
                entries.insert(key.clone(), value_from_yaml(value)?);
            }
            Value::Mapping(entries)
        }
        Yaml::Alias(_) => {
            return Err(Error::InvalidStructure {
                message: "aliases are not supported".to_string(),
            });
        }
        Yaml::BadValue => {
            return Err(Error::InvalidStructure {
                message: "bad value".to_string(),
            });
        }
    };
    Ok(value)
}
