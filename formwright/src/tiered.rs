//! Exact-then-prefix matching of a target value against a rendered option set.
//!
//! Exact wins so "Jane" never picks "Jane Doe" when "Jane" itself is on screen;
//! prefix exists for UIs that ellipsize long labels. Each tier gets a short
//! probe because callers run this inside retry loops.

use crate::matcher::{exact_pattern, prefix_pattern, MatchPattern};
use crate::{AutomationError, Form, Selector, UIElement};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Prefix,
}

/// Role of the entries inside an option container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    /// `option` inside a `listbox`
    Option,
    /// `row` inside a `grid` or `dialog`
    Row,
}

impl EntryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryRole::Option => "option",
            EntryRole::Row => "row",
        }
    }
}

/// A collection of selectable entries, possibly virtualized.
#[derive(Debug, Clone)]
pub struct OptionContainer {
    pub element: UIElement,
    pub entry_role: EntryRole,
}

impl OptionContainer {
    pub fn listbox(element: UIElement) -> Self {
        Self {
            element,
            entry_role: EntryRole::Option,
        }
    }

    pub fn grid(element: UIElement) -> Self {
        Self {
            element,
            entry_role: EntryRole::Row,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TieredMatch {
    pub element: UIElement,
    pub tier: MatchTier,
}

/// A prefix-tier entry held back while an exact entry may still render further down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixCandidate {
    /// The entry's full accessible name.
    pub name: String,
    /// Forward scrolls from a freshly opened list to the window that showed it.
    pub scrolls: usize,
}

impl PrefixCandidate {
    pub fn of(found: &TieredMatch, scrolls: usize) -> Self {
        Self {
            name: found.element.name_or_empty(),
            scrolls,
        }
    }
}

/// A blank target would prefix-match every entry, so it is refused outright.
pub fn require_value(label: &str, value: &str) -> Result<(), AutomationError> {
    if value.trim().is_empty() {
        return Err(AutomationError::InvalidArgument(format!(
            "no value given for '{label}'; clear the field instead"
        )));
    }
    Ok(())
}

/// Which tier, if any, `text` satisfies for `value`. Pure; used for read-back checks.
pub fn match_tier(
    text: &str,
    value: &str,
    allow_prefix: bool,
) -> Result<Option<MatchTier>, AutomationError> {
    if exact_pattern(value)?.is_match(text) {
        return Ok(Some(MatchTier::Exact));
    }
    if allow_prefix && !value.trim().is_empty() && prefix_pattern(value)?.is_match(text) {
        return Ok(Some(MatchTier::Prefix));
    }
    Ok(None)
}

pub struct TieredSelector<'a> {
    form: &'a Form,
}

impl<'a> TieredSelector<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form }
    }

    /// First visible entry matching `value`, exact tier before prefix tier.
    ///
    /// `Ok(None)` means nothing matched within the probe; whether to scroll,
    /// escalate or fail is the caller's call.
    pub async fn find(
        &self,
        container: &OptionContainer,
        value: &str,
        allow_prefix: bool,
        probe: Duration,
    ) -> Result<Option<TieredMatch>, AutomationError> {
        let exact = exact_pattern(value)?;
        if let Some(element) = self.probe_tier(container, exact, probe).await? {
            debug!("exact match for '{value}'");
            return Ok(Some(TieredMatch {
                element,
                tier: MatchTier::Exact,
            }));
        }

        if allow_prefix && !value.trim().is_empty() {
            let prefix = prefix_pattern(value)?;
            if let Some(element) = self.probe_tier(container, prefix, probe).await? {
                debug!("prefix match for '{value}': {:?}", element.name());
                return Ok(Some(TieredMatch {
                    element,
                    tier: MatchTier::Prefix,
                }));
            }
        }

        Ok(None)
    }

    async fn probe_tier(
        &self,
        container: &OptionContainer,
        pattern: MatchPattern,
        probe: Duration,
    ) -> Result<Option<UIElement>, AutomationError> {
        self.form
            .locator(Selector::role_named(container.entry_role.as_str(), pattern))
            .within(container.element.clone())
            .probe(probe)
            .await
    }
}
