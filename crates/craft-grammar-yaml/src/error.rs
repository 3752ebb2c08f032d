//! Error types for loading grammar input from YAML.

use thiserror::Error;

/// Result type alias for craft-grammar-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading YAML.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Valid YAML that has no grammar equivalent
    #[error("Invalid YAML structure: {message}")]
    InvalidStructure { message: String },
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let marker = err.marker();
        Error::ParseError {
            message: err.info().to_string(),
            line: marker.line(),
            column: marker.col() + 1,
        }
    }
}
