//! Finds the one live control behind a human-readable field label.

use crate::config::AmbiguityPolicy;
use crate::matcher::label_pattern;
use crate::{AutomationError, Form, Selector, UIElement};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument, warn};

/// Roles a logical form field can be rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlRole {
    Textbox,
    Combobox,
    Checkbox,
    Switch,
}

impl ControlRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlRole::Textbox => "textbox",
            ControlRole::Combobox => "combobox",
            ControlRole::Checkbox => "checkbox",
            ControlRole::Switch => "switch",
        }
    }
}

impl fmt::Display for ControlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role order used when the caller has no better idea.
pub const DEFAULT_ROLES: &[ControlRole] = &[ControlRole::Combobox, ControlRole::Textbox];

/// A live control plus the role it was found under. Valid for one field operation.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    pub element: UIElement,
    pub role: ControlRole,
    pub label: String,
}

pub struct ControlResolver<'a> {
    form: &'a Form,
}

impl<'a> ControlResolver<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form }
    }

    /// Returns the first visible control named `label`, trying `roles` in order on every poll.
    ///
    /// All roles share one deadline, so a textbox is found without first burning
    /// the whole bound on a combobox probe.
    #[instrument(level = "debug", skip(self, roles, timeout))]
    pub async fn resolve(
        &self,
        label: &str,
        roles: &[ControlRole],
        timeout: Option<Duration>,
    ) -> Result<ControlHandle, AutomationError> {
        if roles.is_empty() {
            return Err(AutomationError::InvalidArgument(format!(
                "no candidate roles given for '{label}'"
            )));
        }

        let config = self.form.config();
        let timeout = timeout.unwrap_or_else(|| config.control_timeout());
        let deadline = Instant::now() + timeout;
        let pattern = label_pattern(label)?;

        loop {
            for role in roles {
                let visible = self
                    .form
                    .locator(Selector::role_named(role.as_str(), pattern.clone()))
                    .visible_now()
                    .await?;

                if visible.is_empty() {
                    continue;
                }

                if visible.len() > 1 {
                    match config.ambiguity {
                        AmbiguityPolicy::Strict => {
                            return Err(AutomationError::AmbiguousControl {
                                label: label.to_string(),
                                count: visible.len(),
                            });
                        }
                        AmbiguityPolicy::FirstMatch => warn!(
                            "{} visible {role} controls are labelled '{label}', using the first",
                            visible.len()
                        ),
                    }
                }

                debug!("resolved '{label}' as {role}");
                let element = visible.into_iter().next().ok_or_else(|| {
                    AutomationError::Internal("visible match list emptied".to_string())
                })?;
                return Ok(ControlHandle {
                    element,
                    role: *role,
                    label: label.to_string(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::ControlNotFound {
                    label: label.to_string(),
                });
            }
            sleep(config.poll_interval().min(deadline - now)).await;
        }
    }
}
