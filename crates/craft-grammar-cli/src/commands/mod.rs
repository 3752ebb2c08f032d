//! Command implementations and the arguments they share.

pub mod check;
pub mod eval;

use clap::{Args, ValueEnum};
use craft_grammar::{GrammarVariant, LeafType, ParseOptions, Shape};

/// Grammar options shared by every command.
#[derive(Debug, Args)]
pub struct GrammarArgs {
    /// Which clause family the recipe uses
    #[arg(long, value_enum, default_value_t = VariantArg::ArchPair)]
    pub variant: VariantArg,

    /// Architecture name accepted in 'on' and 'to' clauses (repeatable)
    #[arg(long)]
    pub valid_arch: Vec<String>,

    /// Platform name accepted in 'for' clauses (repeatable)
    #[arg(long)]
    pub valid_platform: Vec<String>,
}

impl GrammarArgs {
    pub fn parse_options(&self) -> ParseOptions {
        let mut options = ParseOptions::new(self.variant.into());
        if !self.valid_arch.is_empty() {
            options = options.with_valid_architectures(self.valid_arch.iter().cloned());
        }
        if !self.valid_platform.is_empty() {
            options = options.with_valid_platforms(self.valid_platform.iter().cloned());
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    ArchPair,
    Platform,
    Detect,
}

impl From<VariantArg> for GrammarVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::ArchPair => GrammarVariant::ArchPair,
            VariantArg::Platform => GrammarVariant::Platform,
            VariantArg::Detect => GrammarVariant::Detect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    Scalar,
    List,
    Mapping,
}

impl From<ShapeArg> for Shape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Scalar => Shape::Scalar,
            ShapeArg::List => Shape::List,
            ShapeArg::Mapping => Shape::Mapping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LeafArg {
    String,
    Integer,
    Float,
    Bool,
    Mapping,
    SingleEntryMapping,
    Any,
}

impl From<LeafArg> for LeafType {
    fn from(arg: LeafArg) -> Self {
        match arg {
            LeafArg::String => LeafType::String,
            LeafArg::Integer => LeafType::Integer,
            LeafArg::Float => LeafType::Float,
            LeafArg::Bool => LeafType::Bool,
            LeafArg::Mapping => LeafType::Mapping,
            LeafArg::SingleEntryMapping => LeafType::SingleEntryMapping,
            LeafArg::Any => LeafType::Any,
        }
    }
}
