//! craft-grammar CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod input;

#[derive(Parser)]
#[command(name = "craft-grammar")]
#[command(version)]
#[command(about = "Resolve build-recipe grammar for one build environment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a recipe for one build environment and print the result as JSON
    Eval(commands::eval::EvalArgs),

    /// Parse a recipe and report grammar errors without evaluating it
    Check(commands::check::CheckArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "craft_grammar=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eval(args) => commands::eval::execute(&args),
        Commands::Check(args) => commands::check::execute(&args),
    }
}
