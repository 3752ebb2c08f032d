//! `craft-grammar check`: report grammar errors without evaluating.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use craft_grammar::{GrammarError, Value, parse};

use super::GrammarArgs;
use crate::input;

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Recipe file (YAML, or JSON when it ends in .json)
    pub file: PathBuf,

    #[command(flatten)]
    pub grammar: GrammarArgs,
}

pub fn execute(args: &CheckArgs) -> Result<()> {
    let failures = run(args)?;
    for (key, err) in &failures {
        eprintln!("{}: [{}] {}", key, err.code(), err);
    }
    if !failures.is_empty() {
        bail!(
            "{} entr{} in {} failed to parse",
            failures.len(),
            if failures.len() == 1 { "y" } else { "ies" },
            args.file.display()
        );
    }
    println!("{}: ok", args.file.display());
    Ok(())
}

/// Parse every top-level entry of the file and collect the first error of
/// each one that fails.
pub fn run(args: &CheckArgs) -> Result<Vec<(String, GrammarError)>> {
    let raw = input::load(&args.file)?;
    let options = args.grammar.parse_options();

    let entries: Vec<(&str, &Value)> = match &raw {
        Value::Mapping(entries) => entries.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        document => vec![("<document>", document)],
    };

    let mut failures = Vec::new();
    for (key, value) in entries {
        match parse(value, &options) {
            Ok(_) => tracing::debug!(key, "grammar ok"),
            Err(err) => failures.push((key.to_string(), err)),
        }
    }
    Ok(failures)
}
