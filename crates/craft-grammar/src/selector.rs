//! Selector sets and the sibling-aware selector matcher.

use crate::environment::Environment;
use std::collections::BTreeSet;
use std::fmt;

/// Default selector for `on`/`to`/`for`: matches only when no sibling
/// clause of the same kind matched.
pub const OTHER: &str = "other";

/// Platform wildcard for `for`: always matches.
pub const ANY: &str = "any";

/// The kind of a grammar clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClauseKind {
    /// `on <archs>`: host architecture
    On,
    /// `to <archs>`: target architecture
    To,
    /// `on <archs> to <archs>`: both
    OnTo,
    /// `for <platform>`: platform name
    For,
    /// `try`: deprecated validation fallback
    Try,
}

impl ClauseKind {
    /// What a selector of this clause names, for messages.
    pub fn selector_noun(self) -> &'static str {
        match self {
            ClauseKind::For => "platform name",
            _ => "architecture",
        }
    }

    /// What part of the environment this clause consults, for messages.
    pub fn subject_name(self) -> &'static str {
        match self {
            ClauseKind::On => "host architecture",
            ClauseKind::To => "target architecture",
            ClauseKind::OnTo => "host and target architecture",
            ClauseKind::For => "platform",
            ClauseKind::Try => "nothing",
        }
    }

    /// Whether the clause belongs to the legacy arch-pair grammar.
    pub fn is_arch_pair(self) -> bool {
        !matches!(self, ClauseKind::For)
    }

    /// The environment value an `on`, `to` or `for` clause is matched against.
    pub fn subject(self, env: &Environment) -> Option<&str> {
        match self {
            ClauseKind::On => Some(&env.host_arch),
            ClauseKind::To => Some(&env.target_arch),
            ClauseKind::For => Some(&env.platform),
            ClauseKind::OnTo | ClauseKind::Try => None,
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClauseKind::On => "on",
            ClauseKind::To => "to",
            ClauseKind::OnTo => "on ... to",
            ClauseKind::For => "for",
            ClauseKind::Try => "try",
        })
    }
}

/// Why a selector list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("selectors are missing")]
    Missing,

    #[error("spaces are not allowed in the selectors")]
    Whitespace,

    #[error("empty selector in list")]
    EmptyToken,

    #[error("duplicate selector '{0}'")]
    Duplicate(String),

    #[error("'{}' cannot be combined with other selectors", OTHER)]
    OtherCombined,
}

/// A non-empty, duplicate-free set of selector tokens.
///
/// Tokens are kept sorted so two sets written in different orders compare
/// and print the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorSet(BTreeSet<String>);

impl SelectorSet {
    /// Build a set from already-validated tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectorSet(tokens.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated selector list such as `amd64,i386`.
    ///
    /// Callers wrap the rejection with the clause text to build a syntax
    /// error.
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SelectorError::Missing);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(SelectorError::Whitespace);
        }

        let mut tokens = BTreeSet::new();
        for token in raw.split(',') {
            if token.is_empty() {
                return Err(SelectorError::EmptyToken);
            }
            if !tokens.insert(token.to_string()) {
                return Err(SelectorError::Duplicate(token.to_string()));
            }
        }

        if tokens.len() > 1 && tokens.contains(OTHER) {
            return Err(SelectorError::OtherCombined);
        }
        Ok(SelectorSet(tokens))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// `{other}`
    pub fn is_other(&self) -> bool {
        self.0.len() == 1 && self.0.contains(OTHER)
    }

    /// Contains `any`.
    pub fn has_any(&self) -> bool {
        self.0.contains(ANY)
    }

    /// Whether the set matches through a wildcard rather than a name.
    pub fn is_wildcard(&self) -> bool {
        self.is_other() || self.has_any()
    }

    /// Tokens that name real architectures or platforms.
    pub fn named(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|t| *t != OTHER && *t != ANY)
    }

    /// Whether a non-wildcard token of this set equals `subject`.
    pub fn names(&self, subject: &str) -> bool {
        subject != OTHER && subject != ANY && self.contains(subject)
    }
}

impl fmt::Display for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

/// Decide whether a clause's selectors match the environment.
///
/// `siblings` are the selector sets of the other clauses of the same `kind`
/// in the enclosing sequence. They are needed because `other` only matches
/// when none of them names the environment value.
///
/// Only `On`, `To` and `For` are matched here; compound clauses match both
/// of their halves with an empty sibling list and `try` always applies.
pub fn matches(
    selectors: &SelectorSet,
    siblings: &[&SelectorSet],
    kind: ClauseKind,
    env: &Environment,
) -> bool {
    let Some(subject) = kind.subject(env) else {
        return kind == ClauseKind::Try;
    };

    if kind == ClauseKind::For && selectors.has_any() {
        return true;
    }
    if selectors.is_other() {
        return !siblings
            .iter()
            .any(|sibling| !sibling.is_wildcard() && sibling.names(subject));
    }
    selectors.names(subject)
}

/// Whether the clause matched through one of its named selectors, as
/// opposed to through a wildcard. Only such matches can be ambiguous.
pub fn matches_by_name(selectors: &SelectorSet, kind: ClauseKind, env: &Environment) -> bool {
    match kind.subject(env) {
        Some(subject) => !selectors.is_wildcard() && selectors.names(subject),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(raw: &str) -> SelectorSet {
        SelectorSet::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_sorted_and_displayed() {
        let selectors = set("i386,amd64");
        assert_eq!(selectors.len(), 2);
        assert_eq!(selectors.to_string(), "amd64,i386");
        assert_eq!(selectors, set("amd64,i386"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorSet::parse(""), Err(SelectorError::Missing));
        assert_eq!(SelectorSet::parse("  "), Err(SelectorError::Missing));
        assert_eq!(SelectorSet::parse("amd64, i386"), Err(SelectorError::Whitespace));
        assert_eq!(SelectorSet::parse(",amd64"), Err(SelectorError::EmptyToken));
        assert_eq!(SelectorSet::parse("amd64,,i386"), Err(SelectorError::EmptyToken));
        assert_eq!(
            SelectorSet::parse("amd64,amd64"),
            Err(SelectorError::Duplicate("amd64".to_string()))
        );
        assert_eq!(SelectorSet::parse("other,amd64"), Err(SelectorError::OtherCombined));
    }

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(
            SelectorError::Duplicate("amd64".to_string()).to_string(),
            "duplicate selector 'amd64'"
        );
        assert_eq!(
            SelectorError::OtherCombined.to_string(),
            "'other' cannot be combined with other selectors"
        );
    }

    #[test]
    fn test_on_matches_host_arch() {
        let env = Environment::native("amd64").with_target_arch("arm64");
        assert!(matches(&set("amd64,i386"), &[], ClauseKind::On, &env));
        assert!(!matches(&set("arm64"), &[], ClauseKind::On, &env));
        assert!(matches(&set("arm64"), &[], ClauseKind::To, &env));
    }

    #[test]
    fn test_other_yields_to_named_siblings() {
        let amd64 = set("amd64");
        let other = set("other");
        let siblings = [&amd64, &other];

        let on_amd64 = Environment::native("amd64");
        assert!(matches(&amd64, &siblings, ClauseKind::On, &on_amd64));
        assert!(!matches(&other, &siblings, ClauseKind::On, &on_amd64));

        let on_arm64 = Environment::native("arm64");
        assert!(!matches(&amd64, &siblings, ClauseKind::On, &on_arm64));
        assert!(matches(&other, &siblings, ClauseKind::On, &on_arm64));
    }

    #[test]
    fn test_for_any_always_matches() {
        let any = set("any");
        for platform in ["jammy", "noble", "other"] {
            let env = Environment::native("amd64").with_platform(platform);
            assert!(matches(&any, &[], ClauseKind::For, &env));
        }
    }

    #[test]
    fn test_for_other_ignores_wildcard_siblings() {
        let any = set("any");
        let other = set("other");
        let env = Environment::native("amd64").with_platform("jammy");
        assert!(matches(&other, &[&any, &other], ClauseKind::For, &env));
    }

    #[test]
    fn test_a_platform_named_other_is_not_selected_by_name() {
        let env = Environment::native("amd64").with_platform("other");
        assert!(!matches_by_name(&set("other"), ClauseKind::For, &env));
    }

    #[test]
    fn test_try_always_applies() {
        let env = Environment::native("amd64");
        assert!(matches(&set("x"), &[], ClauseKind::Try, &env));
    }
}
