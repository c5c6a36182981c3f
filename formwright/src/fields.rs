//! Field-kind plumbing on top of the resolver: text, numbers, booleans,
//! multi-select option sets, clearing, and batch fills.

use crate::calendar::DateInput;
use crate::matcher::exact_pattern;
use crate::orchestrator::{CommitPath, SelectionOrchestrator, SelectionRequest, SelectionResult};
use crate::resolver::{ControlHandle, ControlResolver, ControlRole};
use crate::tiered::{match_tier, require_value, MatchTier, OptionContainer, TieredSelector};
use crate::{AutomationError, Form, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub(crate) const TEXT_ROLES: &[ControlRole] = &[ControlRole::Textbox, ControlRole::Combobox];
pub(crate) const BOOLEAN_ROLES: &[ControlRole] = &[
    ControlRole::Combobox,
    ControlRole::Checkbox,
    ControlRole::Switch,
];
/// Multi-select option sets list their picks as `"Music; Travel"`.
const MULTI_VALUE_SEPARATOR: char = ';';

pub(crate) const ANY_ROLE: &[ControlRole] = &[
    ControlRole::Combobox,
    ControlRole::Textbox,
    ControlRole::Checkbox,
    ControlRole::Switch,
];

/// A value to put into one field, tagged by field kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Lookup(String),
    OptionSet(String),
    MultiOptionSet(Vec<String>),
    Date(DateInput),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub label: String,
    pub field: FieldValue,
}

/// An ordered list of field assignments, applied one at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormFill {
    pub fields: Vec<FieldEntry>,
}

impl FormFill {
    pub fn from_json_str(json: &str) -> Result<Self, AutomationError> {
        serde_json::from_str(json)
            .map_err(|e| AutomationError::InvalidArgument(format!("invalid form fill: {e}")))
    }
}

/// Integers without a trailing `.0`, everything else as Rust prints it.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

pub struct FieldSetter<'a> {
    form: &'a Form,
}

impl<'a> FieldSetter<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form }
    }

    #[instrument(level = "debug", skip(self, value))]
    pub async fn set_text(&self, label: &str, value: &str) -> Result<SelectionResult, AutomationError> {
        let control = ControlResolver::new(self.form)
            .resolve(label, TEXT_ROLES, None)
            .await?;
        control.element.set_text("").await?;
        control.element.type_text(value).await?;

        let shown = self.verify_text(label, control.role, value).await?;
        info!("'{label}' set to '{shown}'");
        Ok(SelectionResult {
            label: label.to_string(),
            value: shown,
            tier: Some(MatchTier::Exact),
            path: CommitPath::Typed,
        })
    }

    pub async fn set_number(&self, label: &str, value: f64) -> Result<SelectionResult, AutomationError> {
        if !value.is_finite() {
            return Err(AutomationError::InvalidArgument(format!(
                "'{label}' cannot hold {value}"
            )));
        }
        self.set_text(label, &format_number(value)).await
    }

    /// Booleans render as a yes/no combobox, a checkbox or a switch; whichever
    /// role resolves first decides the strategy.
    #[instrument(level = "debug", skip(self))]
    pub async fn set_boolean(&self, label: &str, value: bool) -> Result<SelectionResult, AutomationError> {
        let control = ControlResolver::new(self.form)
            .resolve(label, BOOLEAN_ROLES, None)
            .await?;

        match control.role {
            ControlRole::Combobox => {
                let config = self.form.config();
                let option = if value {
                    &config.true_label
                } else {
                    &config.false_label
                };
                SelectionOrchestrator::new(self.form)
                    .select(&SelectionRequest::option_set(label, option, false))
                    .await
            }
            ControlRole::Checkbox | ControlRole::Switch => self.toggle(control, value).await,
            ControlRole::Textbox => Err(AutomationError::InvalidArgument(format!(
                "'{label}' resolved to a textbox, not a boolean control"
            ))),
        }
    }

    async fn toggle(&self, control: ControlHandle, value: bool) -> Result<SelectionResult, AutomationError> {
        if control.element.is_toggled().await? != value {
            control.element.click().await?;
        } else {
            debug!("'{}' already {value}", control.label);
        }

        if self.form.config().verify_after_set {
            let fresh = ControlResolver::new(self.form)
                .resolve(&control.label, &[control.role], None)
                .await?;
            let shown = fresh.element.is_toggled().await?;
            if shown != value {
                return Err(AutomationError::VerificationFailed {
                    label: control.label.clone(),
                    expected: value.to_string(),
                    actual: shown.to_string(),
                });
            }
        }

        Ok(SelectionResult {
            label: control.label,
            value: value.to_string(),
            tier: None,
            path: CommitPath::Toggle,
        })
    }

    /// Selects every value in a multi-select option set, leaving already-selected ones alone.
    #[instrument(level = "debug", skip(self, values))]
    pub async fn set_options(
        &self,
        label: &str,
        values: &[String],
    ) -> Result<SelectionResult, AutomationError> {
        if values.is_empty() {
            return Err(AutomationError::InvalidArgument(format!(
                "no values given for '{label}'"
            )));
        }
        for value in values {
            require_value(label, value)?;
        }
        let config = self.form.config();
        let mut role = ControlRole::Combobox;

        for value in values {
            let not_found = || AutomationError::OptionNotFound {
                label: label.to_string(),
                value: value.clone(),
            };
            let control = ControlResolver::new(self.form)
                .resolve(label, &[ControlRole::Combobox], None)
                .await?;
            role = control.role;
            control.element.click().await?;

            let listbox = self
                .form
                .page_locator(Selector::role("listbox"))
                .probe(config.listbox_timeout())
                .await?
                .ok_or_else(not_found)?;
            let found = TieredSelector::new(self.form)
                .find(
                    &OptionContainer::listbox(listbox),
                    value,
                    false,
                    config.option_probe(),
                )
                .await?;

            let Some(found) = found else {
                control.element.press_key(&config.dismiss_key).await?;
                return Err(not_found());
            };
            if found.element.is_selected().await? {
                debug!("'{value}' already selected in '{label}'");
            } else {
                found.element.click().await?;
            }
            control.element.press_key(&config.dismiss_key).await?;
        }

        let shown = if config.verify_after_set {
            let shown = self.form.read_control(label, &[role]).await?;
            let tokens: Vec<&str> = shown
                .split(MULTI_VALUE_SEPARATOR)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            for value in values {
                let pattern = exact_pattern(value)?;
                if !tokens.iter().any(|t| pattern.is_match(t)) {
                    return Err(AutomationError::VerificationFailed {
                        label: label.to_string(),
                        expected: values.join("; "),
                        actual: shown,
                    });
                }
            }
            shown
        } else {
            values.join("; ")
        };

        info!("'{label}' set to '{shown}'");
        Ok(SelectionResult {
            label: label.to_string(),
            value: shown,
            tier: Some(MatchTier::Exact),
            path: CommitPath::DirectEntry,
        })
    }

    /// Empties a field. A field that is already empty is left untouched.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear(&self, label: &str) -> Result<SelectionResult, AutomationError> {
        let control = ControlResolver::new(self.form)
            .resolve(label, TEXT_ROLES, None)
            .await?;
        let cleared = || SelectionResult {
            label: label.to_string(),
            value: String::new(),
            tier: None,
            path: CommitPath::Cleared,
        };

        if control.element.displayed_value().await?.is_empty() {
            debug!("'{label}' is already empty");
            return Ok(cleared());
        }

        control.element.set_text("").await?;
        if self.form.config().verify_after_set {
            let shown = self.form.read_control(label, &[control.role]).await?;
            if !shown.is_empty() {
                return Err(AutomationError::VerificationFailed {
                    label: label.to_string(),
                    expected: String::new(),
                    actual: shown,
                });
            }
        }
        Ok(cleared())
    }

    async fn verify_text(
        &self,
        label: &str,
        role: ControlRole,
        value: &str,
    ) -> Result<String, AutomationError> {
        if !self.form.config().verify_after_set {
            return Ok(value.to_string());
        }
        let shown = self.form.read_control(label, &[role]).await?;
        if match_tier(&shown, value, false)?.is_none() {
            return Err(AutomationError::VerificationFailed {
                label: label.to_string(),
                expected: value.to_string(),
                actual: shown,
            });
        }
        Ok(shown)
    }
}
