//! Construction-time validation: grammar variant and selector tokens.

use crate::error::GrammarError;
use crate::selector::{ANY, ClauseKind, OTHER, SelectorSet};
use std::collections::BTreeSet;

/// Which clause family a tree may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarVariant {
    /// Legacy `on`, `to`, `on .. to`, `try`, `else`, `else fail`.
    #[default]
    ArchPair,

    /// `for <platform>` and `else`.
    Platform,

    /// Whichever family the first clause of the tree uses; clauses of the
    /// other family are rejected afterwards.
    Detect,
}

impl GrammarVariant {
    fn describe(self) -> &'static str {
        match self {
            GrammarVariant::ArchPair => "arch-pair",
            GrammarVariant::Platform => "platform",
            GrammarVariant::Detect => "detected",
        }
    }
}

/// Options for building a grammar tree.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// If set, every architecture named by `on`/`to` must be in this set.
    pub valid_architectures: Option<BTreeSet<String>>,

    /// If set, every platform named by `for` must be in this set.
    pub valid_platforms: Option<BTreeSet<String>>,

    pub variant: GrammarVariant,

    /// Maximum nesting depth of the raw input.
    pub max_depth: usize,
}

/// Default for [`ParseOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            valid_architectures: None,
            valid_platforms: None,
            variant: GrammarVariant::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new(variant: GrammarVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn with_valid_architectures<I, S>(mut self, architectures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_architectures = Some(architectures.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_valid_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_platforms = Some(platforms.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Tracks the variant in force while one tree is being built.
#[derive(Debug)]
pub(crate) struct VariantGuard {
    requested: GrammarVariant,
    detected: Option<GrammarVariant>,
}

impl VariantGuard {
    pub(crate) fn new(requested: GrammarVariant) -> Self {
        Self {
            requested,
            detected: None,
        }
    }

    /// Admit a construct of the arch-pair family (`arch_pair == true`) or of
    /// the platform family. `what` names the construct for messages.
    pub(crate) fn admit(&mut self, arch_pair: bool, what: &str) -> Result<(), GrammarError> {
        let family = if arch_pair {
            GrammarVariant::ArchPair
        } else {
            GrammarVariant::Platform
        };

        match self.requested {
            GrammarVariant::Detect => match self.detected {
                None => {
                    tracing::debug!(variant = family.describe(), "grammar variant detected");
                    self.detected = Some(family);
                    Ok(())
                }
                Some(detected) if detected == family => Ok(()),
                Some(_) => Err(GrammarError::malformed(
                    "The 'for' statement can't be used with 'on' or 'to' statements. \
                     Either replace all 'to <arch>' statements with 'for <platform>' or \
                     replace all 'for <platform>' statements with 'to <arch>' statements",
                )),
            },
            requested if requested == family => Ok(()),
            GrammarVariant::ArchPair => Err(GrammarError::malformed(format!(
                "'{}' is not allowed in the arch-pair grammar; use 'on' and 'to' instead",
                what
            ))),
            GrammarVariant::Platform => Err(GrammarError::malformed(format!(
                "'{}' is not allowed in the platform grammar; use 'for' instead",
                what
            ))),
        }
    }
}

/// Check wildcard placement and, when valid sets were supplied, that every
/// named selector is known.
pub(crate) fn check_selectors(
    kind: ClauseKind,
    selectors: &SelectorSet,
    header: &str,
    options: &ParseOptions,
) -> Result<(), GrammarError> {
    if kind != ClauseKind::For && selectors.has_any() {
        return Err(syntax_error(
            header,
            kind,
            &format!("'{}' is only valid in 'for' clauses", ANY),
        ));
    }
    if kind == ClauseKind::OnTo && selectors.is_other() {
        return Err(syntax_error(
            header,
            kind,
            &format!("'{}' is not allowed in compound clauses", OTHER),
        ));
    }

    let valid = match kind {
        ClauseKind::For => options.valid_platforms.as_ref(),
        _ => options.valid_architectures.as_ref(),
    };
    if let Some(valid) = valid {
        if let Some(unknown) = selectors.named().find(|s| !valid.contains(*s)) {
            return Err(GrammarError::UnknownSelector {
                selector: unknown.to_string(),
                clause: kind,
            });
        }
    }
    Ok(())
}

/// `'<header>' is not a valid '<kind>' clause: <reason>`
pub(crate) fn syntax_error(header: &str, kind: ClauseKind, reason: &str) -> GrammarError {
    GrammarError::malformed(format!(
        "'{}' is not a valid '{}' clause: {}",
        header, kind, reason
    ))
}
