//! Building grammar trees from decoded data.
//!
//! Grammar is written inline in ordinary configuration data. A mapping key
//! that starts with one of the clause words turns that mapping into a
//! clause:
//!
//! ```yaml
//! build-packages:
//!   - gcc
//!   - on amd64:
//!       - libc6-dev-i386
//!   - else:
//!       - libc6-dev
//! source:
//!   - on amd64 to arm64: https://example.com/cross.tar.gz
//!   - else fail
//! ```
//!
//! `else` entries attach to the clause right before them, either as the next
//! item of the same sequence or as a later key of the same mapping.

use crate::error::GrammarError;
use crate::selector::{ClauseKind, SelectorSet};
use crate::statement::{Clause, CompoundClause, ElseBranch, Statement, TryClause};
use crate::validate::{check_selectors, syntax_error, ParseOptions, VariantGuard};
use crate::value::{Scalar, Value};
use indexmap::IndexMap;

const TRY: &str = "try";
const ELSE: &str = "else";
const ELSE_FAIL: &str = "else fail";

/// Parse decoded data into a grammar tree.
///
/// # Errors
///
/// Returns [`GrammarError::MalformedStatement`] for structural problems and
/// [`GrammarError::UnknownSelector`] when `options` carries valid sets that
/// a selector is missing from.
pub fn parse(raw: &Value, options: &ParseOptions) -> Result<Statement, GrammarError> {
    let mut parser = Parser {
        options,
        guard: VariantGuard::new(options.variant),
    };
    let statement = parser.parse_value(raw, 0)?;
    tracing::debug!(
        variant = ?options.variant,
        grammar = statement.contains_grammar(),
        "grammar tree built"
    );
    Ok(statement)
}

/// What a mapping key means to the grammar.
#[derive(Debug, PartialEq)]
enum Key {
    Clause(Head),
    Else,
    Plain,
}

/// A parsed clause header.
#[derive(Debug, PartialEq)]
enum Head {
    On(SelectorSet),
    To(SelectorSet),
    OnTo(SelectorSet, SelectorSet),
    For(SelectorSet),
    Try,
}

/// Split `key` into its clause word and the remainder, if it starts with one.
fn clause_word(key: &str) -> Option<(ClauseKind, &str)> {
    for (word, kind) in [
        ("on", ClauseKind::On),
        ("to", ClauseKind::To),
        ("for", ClauseKind::For),
    ] {
        if let Some(rest) = key.strip_prefix(word) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some((kind, rest.trim()));
            }
        }
    }
    None
}

fn is_reserved(key: &str) -> bool {
    key == TRY || key == ELSE || clause_word(key).is_some()
}

fn classify(key: &str) -> Result<Key, GrammarError> {
    if key == TRY {
        return Ok(Key::Clause(Head::Try));
    }
    if key == ELSE {
        return Ok(Key::Else);
    }
    let Some((kind, rest)) = clause_word(key) else {
        return Ok(Key::Plain);
    };

    let selectors = |raw: &str, kind: ClauseKind| {
        SelectorSet::parse(raw).map_err(|reason| syntax_error(key, kind, &reason.to_string()))
    };

    let head = match kind {
        ClauseKind::On => {
            let words: Vec<&str> = rest.split_whitespace().collect();
            match words.as_slice() {
                [on, "to", to] => Head::OnTo(
                    selectors(*on, ClauseKind::OnTo)?,
                    selectors(*to, ClauseKind::OnTo)?,
                ),
                _ => Head::On(selectors(rest, ClauseKind::On)?),
            }
        }
        ClauseKind::To => Head::To(selectors(rest, ClauseKind::To)?),
        _ => {
            if rest.is_empty() {
                return Err(syntax_error(key, ClauseKind::For, "selectors are missing"));
            }
            if rest.chars().any(char::is_whitespace) {
                return Err(syntax_error(
                    key,
                    ClauseKind::For,
                    "spaces are not allowed in the selector",
                ));
            }
            if rest.contains(',') {
                return Err(syntax_error(
                    key,
                    ClauseKind::For,
                    "multiple selectors are not allowed",
                ));
            }
            Head::For(selectors(rest, ClauseKind::For)?)
        }
    };
    Ok(Key::Clause(head))
}

/// Collects the statements of one alternation, attaching `else` entries to
/// the clause that precedes them.
#[derive(Default)]
struct Assembler {
    statements: Vec<Statement>,
    pending: Option<Statement>,
}

impl Assembler {
    fn clause(&mut self, clause: Statement) -> Result<(), GrammarError> {
        self.flush()?;
        self.pending = Some(clause);
        Ok(())
    }

    fn literal(&mut self, statement: Statement) -> Result<(), GrammarError> {
        self.flush()?;
        self.statements.push(statement);
        Ok(())
    }

    fn else_branch(&mut self, branch: ElseBranch) -> Result<(), GrammarError> {
        match self
            .pending
            .as_mut()
            .and_then(Statement::else_branches_mut)
        {
            Some(branches) => {
                branches.push(branch);
                Ok(())
            }
            None => Err(GrammarError::malformed(
                "'else' doesn't seem to correspond to an 'on' or 'try'",
            )),
        }
    }

    fn flush(&mut self) -> Result<(), GrammarError> {
        if let Some(clause) = self.pending.take() {
            if let Statement::Try(try_clause) = &clause {
                if try_clause.else_branches.is_empty() {
                    return Err(GrammarError::malformed(
                        "'try' must be followed by an 'else' to fall back to",
                    ));
                }
            }
            if self.statements.iter().any(|seen| seen.same_clause(&clause)) {
                return Err(GrammarError::malformed(format!(
                    "found duplicate '{}' statements. These should be merged",
                    clause
                )));
            }
            self.statements.push(clause);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Statement>, GrammarError> {
        self.flush()?;
        Ok(self.statements)
    }
}

struct Parser<'o> {
    options: &'o ParseOptions,
    guard: VariantGuard,
}

impl Parser<'_> {
    fn parse_value(&mut self, value: &Value, depth: usize) -> Result<Statement, GrammarError> {
        if depth > self.options.max_depth {
            return Err(GrammarError::malformed(format!(
                "grammar nesting too deep (max depth: {})",
                self.options.max_depth
            )));
        }

        match value {
            Value::Sequence(items) => self.parse_sequence(items, depth),
            Value::Mapping(entries) if entries.keys().any(|k| is_reserved(k)) => {
                let mut assembler = Assembler::default();
                self.parse_clause_mapping(entries, depth, &mut assembler)?;
                let mut statements = assembler.finish()?;
                if statements.len() == 1 {
                    Ok(statements.remove(0))
                } else {
                    Ok(Statement::Sequence(statements))
                }
            }
            Value::Mapping(entries) => self.parse_literal_mapping(value, entries, depth),
            Value::Scalar(_) | Value::Unset => Ok(Statement::Leaf(value.clone())),
        }
    }

    fn parse_sequence(&mut self, items: &[Value], depth: usize) -> Result<Statement, GrammarError> {
        let mut assembler = Assembler::default();
        for item in items {
            match item {
                Value::Scalar(Scalar::String(s)) if s == ELSE_FAIL => {
                    self.guard.admit(true, ELSE_FAIL)?;
                    assembler.else_branch(ElseBranch::Fail)?;
                }
                Value::Mapping(entries) if entries.keys().any(|k| is_reserved(k)) => {
                    self.parse_clause_mapping(entries, depth + 1, &mut assembler)?;
                }
                Value::Unset => {
                    return Err(GrammarError::malformed(
                        "expected a list entry to be a string, number, boolean, list or \
                         mapping, but got null",
                    ));
                }
                _ => assembler.literal(self.parse_value(item, depth + 1)?)?,
            }
        }
        Ok(Statement::Sequence(assembler.finish()?))
    }

    fn parse_clause_mapping(
        &mut self,
        entries: &IndexMap<String, Value>,
        depth: usize,
        assembler: &mut Assembler,
    ) -> Result<(), GrammarError> {
        for (key, value) in entries {
            match classify(key)? {
                Key::Clause(head) => assembler.clause(self.build_clause(head, key, value, depth)?)?,
                Key::Else => assembler.else_branch(self.parse_else(value, depth)?)?,
                Key::Plain => {
                    return Err(GrammarError::malformed(format!(
                        "'{}' cannot be mixed with grammar clauses in one mapping",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_clause(
        &mut self,
        head: Head,
        key: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Statement, GrammarError> {
        let options = self.options;
        let statement = match head {
            Head::On(selectors) => {
                self.guard.admit(true, "on")?;
                check_selectors(ClauseKind::On, &selectors, key, options)?;
                Statement::On(Clause::new(selectors, self.parse_value(value, depth + 1)?))
            }
            Head::To(selectors) => {
                self.guard.admit(true, "to")?;
                check_selectors(ClauseKind::To, &selectors, key, options)?;
                Statement::To(Clause::new(selectors, self.parse_value(value, depth + 1)?))
            }
            Head::OnTo(on, to) => {
                self.guard.admit(true, "on ... to")?;
                check_selectors(ClauseKind::OnTo, &on, key, options)?;
                check_selectors(ClauseKind::OnTo, &to, key, options)?;
                Statement::OnTo(CompoundClause::new(
                    on,
                    to,
                    self.parse_value(value, depth + 1)?,
                ))
            }
            Head::For(selectors) => {
                self.guard.admit(false, "for")?;
                check_selectors(ClauseKind::For, &selectors, key, options)?;
                Statement::For(Clause::new(selectors, self.parse_value(value, depth + 1)?))
            }
            Head::Try => {
                self.guard.admit(true, TRY)?;
                tracing::debug!("'try' is deprecated; prefer 'on <arch>'");
                Statement::Try(TryClause {
                    body: Box::new(self.parse_value(value, depth + 1)?),
                    else_branches: Vec::new(),
                })
            }
        };
        Ok(statement)
    }

    fn parse_else(&mut self, value: &Value, depth: usize) -> Result<ElseBranch, GrammarError> {
        let empty = match value {
            Value::Unset => true,
            Value::Sequence(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            return Ok(ElseBranch::Fail);
        }
        Ok(ElseBranch::Body(self.parse_value(value, depth + 1)?))
    }

    fn parse_literal_mapping(
        &mut self,
        value: &Value,
        entries: &IndexMap<String, Value>,
        depth: usize,
    ) -> Result<Statement, GrammarError> {
        let mut parsed = IndexMap::with_capacity(entries.len());
        for (key, entry) in entries {
            parsed.insert(key.clone(), self.parse_value(entry, depth + 1)?);
        }
        if parsed.values().any(Statement::contains_grammar) {
            Ok(Statement::Mapping(parsed))
        } else {
            Ok(Statement::Leaf(value.clone()))
        }
    }
}
