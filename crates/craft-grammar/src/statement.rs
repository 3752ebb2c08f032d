//! The grammar tree.

use crate::selector::{ClauseKind, SelectorSet};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// A node of a parsed grammar tree.
///
/// Trees are built once by [`parse`](crate::parse) and never mutated; they
/// own all of their data and can be shared between threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A literal value.
    Leaf(Value),

    /// `on <archs>`: selected by host architecture.
    On(Clause),

    /// `to <archs>`: selected by target architecture.
    To(Clause),

    /// `on <archs> to <archs>`: selected when both match.
    OnTo(CompoundClause),

    /// `for <platform>`: selected by platform name.
    For(Clause),

    /// `try`: deprecated. The body is used unless the leaf validator
    /// rejects it, in which case the else chain is tried.
    Try(TryClause),

    /// An ordered alternation of statements.
    Sequence(Vec<Statement>),

    /// A literal mapping with grammar inside at least one of its values.
    Mapping(IndexMap<String, Statement>),
}

/// One branch of an else chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    /// `else: <body>`
    Body(Statement),
    /// `else fail`
    Fail,
}

/// A single-selector clause (`on`, `to` or `for`).
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub selectors: SelectorSet,
    pub body: Box<Statement>,
    /// Evaluated in order when the selectors do not match.
    pub else_branches: Vec<ElseBranch>,
}

/// `on <archs> to <archs>`
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundClause {
    pub on: SelectorSet,
    pub to: SelectorSet,
    pub body: Box<Statement>,
    pub else_branches: Vec<ElseBranch>,
}

/// `try`
#[derive(Debug, Clone, PartialEq)]
pub struct TryClause {
    pub body: Box<Statement>,
    /// Never empty once parsed.
    pub else_branches: Vec<ElseBranch>,
}

impl Clause {
    pub fn new(selectors: SelectorSet, body: Statement) -> Self {
        Self {
            selectors,
            body: Box::new(body),
            else_branches: Vec::new(),
        }
    }

    /// Append an `else` body.
    pub fn with_else(mut self, body: Statement) -> Self {
        self.else_branches.push(ElseBranch::Body(body));
        self
    }
}

impl CompoundClause {
    pub fn new(on: SelectorSet, to: SelectorSet, body: Statement) -> Self {
        Self {
            on,
            to,
            body: Box::new(body),
            else_branches: Vec::new(),
        }
    }

    pub fn with_else(mut self, body: Statement) -> Self {
        self.else_branches.push(ElseBranch::Body(body));
        self
    }
}

impl TryClause {
    pub fn new(body: Statement, else_body: Statement) -> Self {
        Self {
            body: Box::new(body),
            else_branches: vec![ElseBranch::Body(else_body)],
        }
    }
}

impl Statement {
    /// A leaf holding `value`.
    pub fn leaf(value: impl Into<Value>) -> Self {
        Statement::Leaf(value.into())
    }

    /// The clause kind, or `None` for leaves, sequences and mappings.
    pub fn clause_kind(&self) -> Option<ClauseKind> {
        match self {
            Statement::On(_) => Some(ClauseKind::On),
            Statement::To(_) => Some(ClauseKind::To),
            Statement::OnTo(_) => Some(ClauseKind::OnTo),
            Statement::For(_) => Some(ClauseKind::For),
            Statement::Try(_) => Some(ClauseKind::Try),
            Statement::Leaf(_) | Statement::Sequence(_) | Statement::Mapping(_) => None,
        }
    }

    pub fn is_clause(&self) -> bool {
        self.clause_kind().is_some()
    }

    /// Selectors of a single-selector clause.
    pub fn selectors(&self) -> Option<&SelectorSet> {
        match self {
            Statement::On(clause) | Statement::To(clause) | Statement::For(clause) => {
                Some(&clause.selectors)
            }
            _ => None,
        }
    }

    /// Whether `self` and `other` are clauses of the same kind with the same
    /// selectors. `try` clauses are never the same.
    pub fn same_clause(&self, other: &Statement) -> bool {
        match (self, other) {
            (Statement::On(a), Statement::On(b))
            | (Statement::To(a), Statement::To(b))
            | (Statement::For(a), Statement::For(b)) => a.selectors == b.selectors,
            (Statement::OnTo(a), Statement::OnTo(b)) => a.on == b.on && a.to == b.to,
            _ => false,
        }
    }

    /// The clause body, for clauses.
    pub fn body(&self) -> Option<&Statement> {
        match self {
            Statement::On(clause) | Statement::To(clause) | Statement::For(clause) => {
                Some(&clause.body)
            }
            Statement::OnTo(clause) => Some(&clause.body),
            Statement::Try(clause) => Some(&clause.body),
            _ => None,
        }
    }

    /// The else chain, for clauses.
    pub fn else_branches(&self) -> Option<&[ElseBranch]> {
        match self {
            Statement::On(clause) | Statement::To(clause) | Statement::For(clause) => {
                Some(&clause.else_branches)
            }
            Statement::OnTo(clause) => Some(&clause.else_branches),
            Statement::Try(clause) => Some(&clause.else_branches),
            _ => None,
        }
    }

    pub(crate) fn else_branches_mut(&mut self) -> Option<&mut Vec<ElseBranch>> {
        match self {
            Statement::On(clause) | Statement::To(clause) | Statement::For(clause) => {
                Some(&mut clause.else_branches)
            }
            Statement::OnTo(clause) => Some(&mut clause.else_branches),
            Statement::Try(clause) => Some(&mut clause.else_branches),
            _ => None,
        }
    }

    /// Clause header as written in the grammar, e.g. `on amd64,i386`.
    pub fn header(&self) -> Option<String> {
        match self {
            Statement::On(clause) => Some(format!("on {}", clause.selectors)),
            Statement::To(clause) => Some(format!("to {}", clause.selectors)),
            Statement::OnTo(clause) => Some(format!("on {} to {}", clause.on, clause.to)),
            Statement::For(clause) => Some(format!("for {}", clause.selectors)),
            Statement::Try(_) => Some("try".to_string()),
            _ => None,
        }
    }

    /// Whether this statement or anything below it is a clause.
    pub fn contains_grammar(&self) -> bool {
        match self {
            Statement::Leaf(_) => false,
            Statement::Sequence(items) => items.iter().any(Statement::contains_grammar),
            Statement::Mapping(entries) => entries.values().any(Statement::contains_grammar),
            _ => true,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Leaf(value) => write!(f, "{}", value),
            Statement::Sequence(items) => write!(f, "[{} statements]", items.len()),
            Statement::Mapping(entries) => write!(f, "{{{} keys}}", entries.len()),
            clause => match clause.header() {
                Some(header) => f.write_str(&header),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(raw: &str) -> SelectorSet {
        SelectorSet::parse(raw).unwrap()
    }

    #[test]
    fn test_same_clause() {
        let on = Statement::On(Clause::new(set("amd64,i386"), Statement::leaf("a")));
        let reordered = Statement::On(Clause::new(set("i386,amd64"), Statement::leaf("b")));
        let to = Statement::To(Clause::new(set("amd64,i386"), Statement::leaf("a")));
        assert!(on.same_clause(&reordered));
        assert!(!on.same_clause(&to));

        let attempt = Statement::Try(TryClause::new(Statement::leaf("a"), Statement::leaf("b")));
        assert!(!attempt.same_clause(&attempt.clone()));
    }

    #[test]
    fn test_headers() {
        let on = Statement::On(Clause::new(set("i386,amd64"), Statement::leaf("x")));
        assert_eq!(on.header().unwrap(), "on amd64,i386");

        let compound = Statement::OnTo(CompoundClause::new(
            set("amd64"),
            set("arm64"),
            Statement::leaf("x"),
        ));
        assert_eq!(compound.to_string(), "on amd64 to arm64");

        let try_clause = Statement::Try(TryClause::new(
            Statement::leaf("x"),
            Statement::leaf("y"),
        ));
        assert_eq!(try_clause.to_string(), "try");
        assert_eq!(try_clause.else_branches().unwrap().len(), 1);
    }

    #[test]
    fn test_clause_kinds() {
        assert_eq!(Statement::leaf("x").clause_kind(), None);
        let for_clause = Statement::For(Clause::new(set("any"), Statement::leaf("x")));
        assert_eq!(for_clause.clause_kind(), Some(ClauseKind::For));
        assert!(for_clause.is_clause());
        assert_eq!(for_clause.selectors(), Some(&set("any")));
    }

    #[test]
    fn test_contains_grammar() {
        let literal = Statement::Sequence(vec![Statement::leaf("a"), Statement::leaf("b")]);
        assert!(!literal.contains_grammar());

        let mut entries = IndexMap::new();
        entries.insert(
            "source".to_string(),
            Statement::On(Clause::new(set("amd64"), Statement::leaf("x"))),
        );
        assert!(Statement::Mapping(entries).contains_grammar());
    }
}
