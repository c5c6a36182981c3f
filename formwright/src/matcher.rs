//! Case-insensitive text predicates over accessible names and values.
//!
//! Every pattern is compiled from a literal that is escaped first, so a value
//! like `A.B (C)` only ever matches itself. Patterns are built per request and
//! never cached.

use crate::errors::AutomationError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffixes an accessibility tree may append to a field label, e.g. `Account, Lookup`.
const LABEL_SUFFIXES: &[&str] = &[
    "Lookup",
    "Required",
    "Required field",
    "Option set",
    "Multi-select option set",
    "Multiselect option set",
    "Date",
    "Date and time",
    "Two options",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Anchored at both ends.
    Exact,
    /// Anchored at the start only.
    Prefix,
    /// Exact, but tolerating a trailing required marker or type suffix.
    Label,
}

/// A compiled predicate derived from a literal value.
#[derive(Clone)]
pub struct MatchPattern {
    literal: String,
    mode: MatchMode,
    regex: Regex,
}

/// Escapes regex metacharacters in `s`.
pub fn escape(s: &str) -> String {
    regex::escape(s)
}

/// Case-insensitive, whole-string match of `value`.
pub fn exact_pattern(value: &str) -> Result<MatchPattern, AutomationError> {
    MatchPattern::new(value, MatchMode::Exact)
}

/// Case-insensitive match of anything starting with `value`.
pub fn prefix_pattern(value: &str) -> Result<MatchPattern, AutomationError> {
    MatchPattern::new(value, MatchMode::Prefix)
}

/// Exact match of a field label, allowing `*` and `, Lookup`-style suffixes.
pub fn label_pattern(label: &str) -> Result<MatchPattern, AutomationError> {
    MatchPattern::new(label, MatchMode::Label)
}

impl MatchPattern {
    pub fn new(literal: &str, mode: MatchMode) -> Result<Self, AutomationError> {
        let literal = literal.trim().to_string();
        let escaped = escape(&literal);
        let source = match mode {
            MatchMode::Exact => format!(r"^\s*{escaped}\s*$"),
            MatchMode::Prefix => format!(r"^\s*{escaped}"),
            MatchMode::Label => {
                let suffixes = LABEL_SUFFIXES
                    .iter()
                    .map(|s| escape(s))
                    .collect::<Vec<_>>()
                    .join("|");
                format!(r"^\s*{escaped}\s*\*?\s*(?:,\s*(?:{suffixes})\s*)?\*?\s*$")
            }
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                AutomationError::InvalidArgument(format!(
                    "cannot build {mode:?} pattern for '{literal}': {e}"
                ))
            })?;

        Ok(Self {
            literal,
            mode,
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for MatchPattern {}

impl fmt::Debug for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.mode, self.literal)
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            MatchMode::Prefix => write!(f, "{}*", self.literal),
            _ => write!(f, "{}", self.literal),
        }
    }
}
