//! Reading recipe files.

use std::path::Path;

use anyhow::{Context, Result};
use craft_grammar::Value;

/// Load `path` as JSON when it ends in `.json`, as YAML otherwise.
pub fn load(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let value = if is_json {
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON from {}", path.display()))?;
        Value::from(json)
    } else {
        craft_grammar_yaml::load_str(&content)
            .with_context(|| format!("failed to parse YAML from {}", path.display()))?
    };
    tracing::debug!(path = %path.display(), kind = value.type_name(), "recipe loaded");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(".yaml", "a: [1, 2]\n");
        let value = load(file.path()).unwrap();
        assert_eq!(value, Value::from(serde_json::json!({"a": [1, 2]})));
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(".json", r#"{"on amd64": "x"}"#);
        let value = load(file.path()).unwrap();
        assert_eq!(value, Value::mapping([("on amd64", "x")]));
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/nonexistent/recipe.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
