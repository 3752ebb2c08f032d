//! Selection grammar for architecture- and platform-dependent build
//! configuration.
//!
//! Build recipes describe values that differ between machines: a package
//! list that gains a cross compiler when targeting another architecture, a
//! source URL that depends on the platform being built. This crate lets such
//! values be written inline with clauses and resolves them for one concrete
//! build environment.
//!
//! # Key Features
//!
//! - **Two grammar variants**: `on`/`to`/`try`/`else` keyed by host and
//!   target architecture, and `for`/`else` keyed by platform
//! - **Parse once, evaluate many**: trees are immutable and `Send + Sync`
//! - **Pluggable leaf checks**: a [`LeafValidator`] accepts, coerces or
//!   rejects every resolved value; `try` clauses fall back on rejection
//! - **Ambiguity detection**: two clauses that name the same environment
//!   value in a single-valued position are an error, not a silent choice
//!
//! # Architecture
//!
//! - [`parse`]: decoded data ([`Value`]) into a grammar tree ([`Statement`])
//! - [`Evaluator`] / [`evaluate`]: a tree plus an [`Environment`] into a
//!   resolved [`Value`]
//! - [`FieldSpec`] / [`resolve_field`]: both steps plus shape normalisation
//!   for one declared field
//!
//! # Example
//!
//! ```rust
//! use craft_grammar::{parse, evaluate, Environment, ParseOptions, Value};
//! use serde_json::json;
//!
//! let raw = Value::from(json!([
//!     "make",
//!     {"to arm64": ["gcc-aarch64-linux-gnu"]},
//!     {"else": ["gcc"]},
//! ]));
//! let tree = parse(&raw, &ParseOptions::default()).unwrap();
//!
//! let cross = Environment::native("amd64").with_target_arch("arm64");
//! assert_eq!(
//!     evaluate(&tree, &cross, None).unwrap(),
//!     Value::sequence(["make", "gcc-aarch64-linux-gnu"]),
//! );
//!
//! let native = Environment::native("amd64");
//! assert_eq!(
//!     evaluate(&tree, &native, None).unwrap(),
//!     Value::sequence(["make", "gcc"]),
//! );
//! ```

mod checker;
mod environment;
mod error;
mod evaluate;
mod field;
mod parse;
mod selector;
mod statement;
mod validate;
mod value;

pub use checker::{
    LeafRejection,
    LeafType,
    LeafValidator,
};

pub use environment::Environment;

pub use error::GrammarError;

pub use evaluate::{
    Evaluator,
    Transformer,
    evaluate,
};

pub use field::{
    FieldSpec,
    Shape,
    resolve_field,
};

pub use parse::parse;

pub use selector::{
    ANY,
    ClauseKind,
    OTHER,
    SelectorError,
    SelectorSet,
    matches,
    matches_by_name,
};

pub use statement::{
    Clause,
    CompoundClause,
    ElseBranch,
    Statement,
    TryClause,
};

pub use validate::{
    DEFAULT_MAX_DEPTH,
    GrammarVariant,
    ParseOptions,
};

pub use value::{
    Scalar,
    Value,
};
