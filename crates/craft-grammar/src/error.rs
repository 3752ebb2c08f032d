//! Error taxonomy for grammar construction and evaluation.

use crate::selector::ClauseKind;
use thiserror::Error;

/// Errors raised while building or evaluating a grammar tree.
///
/// Construction errors ([`MalformedStatement`](Self::MalformedStatement),
/// [`UnknownSelector`](Self::UnknownSelector)) are raised by the parser and
/// prevent any evaluation. The remaining kinds come from the evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    /// Structural problem in the raw grammar: dangling `else`, bare `try`,
    /// a clause of the wrong variant, bad selector syntax.
    #[error("Invalid grammar syntax: {message}.")]
    MalformedStatement { message: String },

    /// A selector token outside the caller's set of valid names.
    #[error("Unknown {}: '{selector}' in '{clause}' clause", .clause.selector_noun())]
    UnknownSelector {
        selector: String,
        clause: ClauseKind,
    },

    /// Two sibling clauses of one kind both select the same environment
    /// where only one value may win.
    #[error(
        "Ambiguous selection: '{first}' and '{second}' both match {} '{value}'",
        .clause.subject_name()
    )]
    AmbiguousSelection {
        clause: ClauseKind,
        /// Header of the clause that would have supplied the value
        first: String,
        /// Header of the competing clause
        second: String,
        /// The environment value both clauses matched
        value: String,
    },

    /// A resolved value was rejected by the leaf validator or does not fit
    /// the expected shape.
    #[error("Expected {expected}, got {got} {value}")]
    TypeMismatch {
        expected: String,
        /// Kind of the offending value
        got: String,
        /// The offending value, rendered as JSON
        value: String,
    },

    /// An `else fail` branch was reached.
    #[error("Unable to satisfy '{statement}', failure forced.")]
    Unsatisfied { statement: String },

    /// A mandatory value resolved to nothing.
    #[error("{}", unmatched_message(.field.as_deref()))]
    UnmatchedGrammar { field: Option<String> },
}

fn unmatched_message(field: Option<&str>) -> String {
    match field {
        Some(field) => format!("No grammar clause matched for required field '{}'", field),
        None => "No grammar clause matched and no default is available".to_string(),
    }
}

impl GrammarError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        GrammarError::MalformedStatement {
            message: message.into(),
        }
    }

    /// Stable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            GrammarError::MalformedStatement { .. } => "G-1-01",
            GrammarError::UnknownSelector { .. } => "G-1-02",
            GrammarError::AmbiguousSelection { .. } => "G-2-01",
            GrammarError::TypeMismatch { .. } => "G-2-02",
            GrammarError::Unsatisfied { .. } => "G-2-03",
            GrammarError::UnmatchedGrammar { .. } => "G-2-04",
        }
    }

    /// Whether this error is raised while building a tree rather than while
    /// evaluating one.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            GrammarError::MalformedStatement { .. } | GrammarError::UnknownSelector { .. }
        )
    }

    /// Whether a `try` clause may recover from this error.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, GrammarError::TypeMismatch { .. })
    }
}
