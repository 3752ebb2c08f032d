//! `craft-grammar eval`: resolve a recipe for one build environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use craft_grammar::{Environment, Evaluator, FieldSpec, LeafType, ParseOptions, Value, parse};

use super::{GrammarArgs, LeafArg, ShapeArg};
use crate::input;

/// Arguments for the eval command
#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Recipe file (YAML, or JSON when it ends in .json)
    pub file: PathBuf,

    /// Architecture the build runs on
    #[arg(long)]
    pub host_arch: String,

    /// Architecture the build produces artifacts for (defaults to the host architecture)
    #[arg(long)]
    pub target_arch: Option<String>,

    /// Platform being built (defaults to the host architecture)
    #[arg(long)]
    pub platform: Option<String>,

    #[command(flatten)]
    pub grammar: GrammarArgs,

    /// Only resolve this top-level key
    #[arg(long)]
    pub key: Option<String>,

    /// Normalise each resolved value to this shape
    #[arg(long, value_enum)]
    pub shape: Option<ShapeArg>,

    /// Validate every resolved leaf as this type
    #[arg(long = "type", value_enum, default_value_t = LeafArg::Any)]
    pub leaf: LeafArg,

    /// Fail when a value resolves to nothing
    #[arg(long)]
    pub required: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl EvalArgs {
    pub fn environment(&self) -> Environment {
        let mut env = Environment::native(self.host_arch.as_str());
        if let Some(target_arch) = &self.target_arch {
            env = env.with_target_arch(target_arch.as_str());
        }
        if let Some(platform) = &self.platform {
            env = env.with_platform(platform.as_str());
        }
        env
    }
}

pub fn execute(args: &EvalArgs) -> Result<()> {
    let value = run(args)?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .context("failed to serialize result")?;
    println!("{}", output);
    Ok(())
}

/// Resolve the file named by `args`.
pub fn run(args: &EvalArgs) -> Result<Value> {
    let raw = input::load(&args.file)?;
    let options = args.grammar.parse_options();
    let env = args.environment();
    let resolver = Resolver {
        options: &options,
        env: &env,
        args,
    };

    if let Some(key) = &args.key {
        let field = raw
            .as_mapping()
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_default();
        return resolver.resolve(key, &field);
    }

    match &raw {
        Value::Mapping(entries) => {
            let mut resolved = Vec::with_capacity(entries.len());
            for (key, field) in entries {
                let value = resolver.resolve(key, field)?;
                if !value.is_unset() {
                    resolved.push((key.clone(), value));
                }
            }
            Ok(Value::mapping(resolved))
        }
        document => resolver.resolve("<document>", document),
    }
}

struct Resolver<'a> {
    options: &'a ParseOptions,
    env: &'a Environment,
    args: &'a EvalArgs,
}

impl Resolver<'_> {
    fn resolve(&self, name: &str, raw: &Value) -> Result<Value> {
        let tree = parse(raw, self.options)
            .with_context(|| format!("invalid grammar in '{}'", name))?;
        let leaf = LeafType::from(self.args.leaf);

        let value = match self.args.shape {
            Some(shape) => {
                let mut spec = FieldSpec::new(name, shape.into(), leaf);
                spec.required = self.args.required;
                spec.resolve(&tree, self.env)
            }
            None => Evaluator::new(self.env)
                .with_validator(&leaf)
                .evaluate(&tree)
                .and_then(|value| {
                    if self.args.required {
                        value.into_required(Some(name))
                    } else {
                        Ok(value)
                    }
                }),
        };
        value.with_context(|| format!("failed to resolve '{}'", name))
    }
}
