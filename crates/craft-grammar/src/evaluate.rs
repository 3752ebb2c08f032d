//! Evaluating a grammar tree against an [`Environment`].
//!
//! Evaluation is a pure function of the tree, the environment and the
//! optional leaf validator and transformer. The same tree can be evaluated
//! from several threads at once.

use crate::checker::LeafValidator;
use crate::environment::Environment;
use crate::error::GrammarError;
use crate::field::Shape;
use crate::selector::{matches, matches_by_name, ClauseKind, SelectorSet};
use crate::statement::{ElseBranch, Statement};
use crate::value::Value;
use indexmap::IndexMap;

/// Rewrites resolved leaves before they are validated.
///
/// `call_stack` lists the clauses whose body is being evaluated, outermost
/// first. Else branches are evaluated without their clause on the stack.
pub trait Transformer {
    fn transform(&self, call_stack: &[&Statement], value: Value, env: &Environment) -> Value;
}

impl<F> Transformer for F
where
    F: Fn(&[&Statement], Value, &Environment) -> Value,
{
    fn transform(&self, call_stack: &[&Statement], value: Value, env: &Environment) -> Value {
        self(call_stack, value, env)
    }
}

/// Evaluate `tree` against `env`.
///
/// Returns [`Value::Unset`] when no clause produced anything.
pub fn evaluate(
    tree: &Statement,
    env: &Environment,
    validator: Option<&dyn LeafValidator>,
) -> Result<Value, GrammarError> {
    let mut evaluator = Evaluator::new(env);
    evaluator.validator = validator;
    evaluator.evaluate(tree)
}

/// Evaluation settings for one environment.
///
/// ```
/// use craft_grammar::{parse, Environment, Evaluator, LeafType, ParseOptions, Value};
///
/// let raw = Value::from(serde_json::json!([{"on amd64": "x86"}, {"else": "other"}]));
/// let tree = parse(&raw, &ParseOptions::default()).unwrap();
/// let env = Environment::native("amd64");
/// let value = Evaluator::new(&env)
///     .with_validator(&LeafType::String)
///     .evaluate(&tree)
///     .unwrap();
/// assert_eq!(value, Value::string("x86"));
/// ```
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    env: &'a Environment,
    validator: Option<&'a dyn LeafValidator>,
    transformer: Option<&'a dyn Transformer>,
    shape: Option<Shape>,
}

/// Selector sets of the single-selector clauses of one sequence, by kind.
#[derive(Default)]
struct Siblings<'t> {
    on: Vec<&'t SelectorSet>,
    to: Vec<&'t SelectorSet>,
    platform: Vec<&'t SelectorSet>,
}

impl<'t> Siblings<'t> {
    fn collect(items: &'t [Statement]) -> Self {
        let mut siblings = Siblings::default();
        for item in items {
            match item {
                Statement::On(clause) => siblings.on.push(&clause.selectors),
                Statement::To(clause) => siblings.to.push(&clause.selectors),
                Statement::For(clause) => siblings.platform.push(&clause.selectors),
                _ => {}
            }
        }
        siblings
    }

    fn of(&self, kind: ClauseKind) -> &[&'t SelectorSet] {
        match kind {
            ClauseKind::On => self.on.as_slice(),
            ClauseKind::To => self.to.as_slice(),
            ClauseKind::For => self.platform.as_slice(),
            ClauseKind::OnTo | ClauseKind::Try => &[],
        }
    }
}

/// How a sequence combines the contributions of its items.
enum Mode {
    List(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self {
            env,
            validator: None,
            transformer: None,
            shape: None,
        }
    }

    pub fn with_validator(mut self, validator: &'a dyn LeafValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_transformer(mut self, transformer: &'a dyn Transformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Evaluate for a field declared with `shape`.
    ///
    /// With [`Shape::List`] every alternation concatenates the contributions
    /// of all selected clauses, even when their bodies are scalars. Other
    /// shapes keep the combination decided by the first contribution.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn environment(&self) -> &Environment {
        self.env
    }

    pub fn evaluate(&self, tree: &Statement) -> Result<Value, GrammarError> {
        let mut stack = Vec::new();
        self.eval(tree, &mut stack, &Siblings::default())
    }

    fn eval<'t>(
        &self,
        statement: &'t Statement,
        stack: &mut Vec<&'t Statement>,
        siblings: &Siblings<'t>,
    ) -> Result<Value, GrammarError> {
        match statement {
            Statement::Leaf(Value::Unset) => Ok(Value::Unset),
            Statement::Leaf(value) => self.leaf(value.clone(), stack),
            Statement::Sequence(items) => self.eval_sequence(items, stack),
            Statement::Mapping(entries) => self.eval_mapping(entries, stack),
            Statement::On(clause) | Statement::To(clause) | Statement::For(clause) => {
                let kind = statement.clause_kind().unwrap_or(ClauseKind::On);
                let others = siblings.of(kind);
                if matches(&clause.selectors, others, kind, self.env) {
                    self.eval_body(statement, &clause.body, stack)
                } else {
                    self.eval_else(statement, &clause.else_branches, stack)
                }
            }
            Statement::OnTo(clause) => {
                let selected = matches(&clause.on, &[], ClauseKind::On, self.env)
                    && matches(&clause.to, &[], ClauseKind::To, self.env);
                if selected {
                    self.eval_body(statement, &clause.body, stack)
                } else {
                    self.eval_else(statement, &clause.else_branches, stack)
                }
            }
            Statement::Try(clause) => match self.eval_body(statement, &clause.body, stack) {
                Err(err) if err.is_type_mismatch() => {
                    tracing::debug!(error = %err, "'try' body rejected, falling back");
                    self.eval_try_fallback(&clause.else_branches, stack, err)
                }
                result => result,
            },
        }
    }

    fn leaf(&self, value: Value, stack: &[&Statement]) -> Result<Value, GrammarError> {
        let value = match self.transformer {
            Some(transformer) => transformer.transform(stack, value, self.env),
            None => value,
        };
        tracing::trace!(%value, depth = stack.len(), "leaf resolved");
        self.validate(value)
    }

    fn validate(&self, value: Value) -> Result<Value, GrammarError> {
        let Some(validator) = self.validator else {
            return Ok(value);
        };
        let got = value.type_name();
        let rendered = value.to_string();
        validator
            .check(value)
            .map_err(|rejection| GrammarError::TypeMismatch {
                expected: rejection.expected,
                got: got.to_string(),
                value: rendered,
            })
    }

    fn eval_body<'t>(
        &self,
        clause: &'t Statement,
        body: &'t Statement,
        stack: &mut Vec<&'t Statement>,
    ) -> Result<Value, GrammarError> {
        tracing::debug!(clause = %clause, "clause selected");
        stack.push(clause);
        let result = self.eval(body, stack, &Siblings::default());
        stack.pop();
        result
    }

    fn eval_else<'t>(
        &self,
        clause: &'t Statement,
        branches: &'t [ElseBranch],
        stack: &mut Vec<&'t Statement>,
    ) -> Result<Value, GrammarError> {
        for branch in branches {
            match branch {
                ElseBranch::Body(body) => {
                    let value = self.eval(body, stack, &Siblings::default())?;
                    if !value.is_unset() {
                        tracing::debug!(clause = %clause, "else branch taken");
                        return Ok(value);
                    }
                }
                ElseBranch::Fail => {
                    return Err(GrammarError::Unsatisfied {
                        statement: clause.to_string(),
                    });
                }
            }
        }
        Ok(Value::Unset)
    }

    fn eval_try_fallback<'t>(
        &self,
        branches: &'t [ElseBranch],
        stack: &mut Vec<&'t Statement>,
        rejected: GrammarError,
    ) -> Result<Value, GrammarError> {
        let mut last_error = Some(rejected);
        for branch in branches {
            match branch {
                ElseBranch::Body(body) => match self.eval(body, stack, &Siblings::default()) {
                    Ok(Value::Unset) => last_error = None,
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_type_mismatch() => last_error = Some(err),
                    Err(err) => return Err(err),
                },
                ElseBranch::Fail => {
                    return Err(GrammarError::Unsatisfied {
                        statement: ClauseKind::Try.to_string(),
                    });
                }
            }
        }
        match last_error {
            Some(err) => Err(err),
            None => Ok(Value::Unset),
        }
    }

    fn eval_sequence<'t>(
        &self,
        items: &'t [Statement],
        stack: &mut Vec<&'t Statement>,
    ) -> Result<Value, GrammarError> {
        if items.is_empty() {
            return Ok(Value::Sequence(Vec::new()));
        }

        let siblings = Siblings::collect(items);
        let as_list = self.shape == Some(Shape::List);
        let has_literals = items.iter().any(|item| !item.is_clause());
        let mut mode = if has_literals {
            Some(Mode::List(Vec::new()))
        } else {
            None
        };

        for (index, item) in items.iter().enumerate() {
            let value = self.eval(item, stack, &siblings)?;
            if value.is_unset() {
                continue;
            }

            match &mut mode {
                Some(Mode::List(list)) => push_contribution(list, item, value),
                Some(Mode::Mapping(merged)) => merge_contribution(merged, value)?,
                None => match value {
                    Value::Mapping(entries) if !as_list => mode = Some(Mode::Mapping(entries)),
                    scalar @ Value::Scalar(_) if !as_list => {
                        self.check_ambiguity(items, index, &siblings)?;
                        return Ok(scalar);
                    }
                    value => {
                        let mut list = Vec::new();
                        push_contribution(&mut list, item, value);
                        mode = Some(Mode::List(list));
                    }
                },
            }
        }

        Ok(match mode {
            Some(Mode::List(list)) => Value::Sequence(list),
            Some(Mode::Mapping(merged)) => Value::Mapping(merged),
            None => Value::Unset,
        })
    }

    /// Fail when the clause at `index` yields by name while a sibling of the
    /// same kind also names the environment value.
    fn check_ambiguity(
        &self,
        items: &[Statement],
        index: usize,
        siblings: &Siblings<'_>,
    ) -> Result<(), GrammarError> {
        let yielding = &items[index];
        let (Some(kind), Some(selectors)) = (yielding.clause_kind(), yielding.selectors()) else {
            return Ok(());
        };
        if !matches_by_name(selectors, kind, self.env) || siblings.of(kind).len() < 2 {
            return Ok(());
        }

        let competitor = items.iter().enumerate().find(|(other, item)| {
            *other != index
                && item.clause_kind() == Some(kind)
                && item
                    .selectors()
                    .is_some_and(|s| matches_by_name(s, kind, self.env))
        });
        match competitor {
            Some((_, item)) => Err(GrammarError::AmbiguousSelection {
                clause: kind,
                first: yielding.to_string(),
                second: item.to_string(),
                value: kind.subject(self.env).unwrap_or_default().to_string(),
            }),
            None => Ok(()),
        }
    }

    fn eval_mapping<'t>(
        &self,
        entries: &'t IndexMap<String, Statement>,
        stack: &mut Vec<&'t Statement>,
    ) -> Result<Value, GrammarError> {
        let inner = Evaluator {
            validator: None,
            shape: None,
            ..*self
        };
        let mut resolved = IndexMap::with_capacity(entries.len());
        for (key, statement) in entries {
            let value = inner.eval(statement, stack, &Siblings::default())?;
            if !value.is_unset() {
                resolved.insert(key.clone(), value);
            }
        }
        self.validate(Value::Mapping(resolved))
    }
}

/// Clause results that are sequences are spliced one level; everything
/// else is pushed as a single element.
fn push_contribution(list: &mut Vec<Value>, item: &Statement, value: Value) {
    match value {
        Value::Sequence(values) if item.is_clause() => list.extend(values),
        value => list.push(value),
    }
}

fn merge_contribution(
    merged: &mut IndexMap<String, Value>,
    value: Value,
) -> Result<(), GrammarError> {
    match value {
        Value::Mapping(entries) => {
            merge_first_wins(merged, entries);
            Ok(())
        }
        other => Err(GrammarError::TypeMismatch {
            expected: "a mapping".to_string(),
            got: other.type_name().to_string(),
            value: other.to_string(),
        }),
    }
}

/// Union `from` into `into`; keys already present keep their value.
pub(crate) fn merge_first_wins(into: &mut IndexMap<String, Value>, from: IndexMap<String, Value>) {
    for (key, value) in from {
        into.entry(key).or_insert(value);
    }
}
