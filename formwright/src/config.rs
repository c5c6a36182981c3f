//! Tunables for every bounded wait, retry budget and UI affordance the engine relies on.
//!
//! All durations are stored in milliseconds so the config round-trips through JSON.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What the resolver does when several visible controls share a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Take the first match in document order and log a warning.
    #[default]
    FirstMatch,
    /// Fail with `AmbiguousControl`.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub control_timeout_ms: u64,
    /// Per-tier probe used for dropdown options, also inside the scroll loop.
    pub option_probe_ms: u64,
    pub listbox_timeout_ms: u64,
    pub network_settle_ms: u64,
    pub search_url_pattern: String,
    pub poll_interval_ms: u64,

    pub lookup_scroll_iterations: usize,
    /// Fallback scroll step when a container reports no height.
    pub default_scroll_step: f64,

    pub dialog_open_timeout_ms: u64,
    pub dialog_search_probe_ms: u64,
    pub dialog_row_probe_ms: u64,
    pub dialog_close_timeout_ms: u64,
    /// How long a double-click gets to close the dialog before the checkbox path is tried.
    pub dialog_activate_grace_ms: u64,

    pub calendar_popup_timeout_ms: u64,
    pub calendar_safety_margin: u32,
    pub calendar_max_hops: u32,

    pub ambiguity: AmbiguityPolicy,
    pub verify_after_set: bool,

    pub reveal_options_key: String,
    pub escalation_key: String,
    pub submit_key: String,
    pub dismiss_key: String,
    pub calendar_open_key: String,
    pub calendar_next_key: String,
    pub calendar_previous_key: String,

    pub lookup_more_names: Vec<String>,
    pub confirm_button_names: Vec<String>,
    pub calendar_trigger_names: Vec<String>,
    pub next_month_names: Vec<String>,
    pub previous_month_names: Vec<String>,
    pub true_label: String,
    pub false_label: String,
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            control_timeout_ms: 3000,
            option_probe_ms: 1000,
            listbox_timeout_ms: 2000,
            network_settle_ms: 2000,
            search_url_pattern: "/api/data/".to_string(),
            poll_interval_ms: 100,

            lookup_scroll_iterations: 10,
            default_scroll_step: 300.0,

            dialog_open_timeout_ms: 15000,
            dialog_search_probe_ms: 2000,
            dialog_row_probe_ms: 5000,
            dialog_close_timeout_ms: 5000,
            dialog_activate_grace_ms: 1500,

            calendar_popup_timeout_ms: 3000,
            calendar_safety_margin: 3,
            calendar_max_hops: 240,

            ambiguity: AmbiguityPolicy::FirstMatch,
            verify_after_set: true,

            reveal_options_key: "ArrowDown".to_string(),
            escalation_key: "Control+Shift+L".to_string(),
            submit_key: "Enter".to_string(),
            dismiss_key: "Escape".to_string(),
            calendar_open_key: "Alt+ArrowDown".to_string(),
            calendar_next_key: "PageDown".to_string(),
            calendar_previous_key: "PageUp".to_string(),

            lookup_more_names: names(&["Look up more records", "Advanced lookup"]),
            confirm_button_names: names(&["Done", "Select", "Add", "OK"]),
            calendar_trigger_names: names(&["Choose date", "Open calendar", "Calendar"]),
            next_month_names: names(&["Next month", "Go to next month"]),
            previous_month_names: names(&["Previous month", "Go to previous month"]),
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AutomationError> {
        serde_json::from_str(json)
            .map_err(|e| AutomationError::InvalidArgument(format!("invalid engine config: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn option_probe(&self) -> Duration {
        Duration::from_millis(self.option_probe_ms)
    }

    pub fn listbox_timeout(&self) -> Duration {
        Duration::from_millis(self.listbox_timeout_ms)
    }

    pub fn network_settle(&self) -> Duration {
        Duration::from_millis(self.network_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dialog_open_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_open_timeout_ms)
    }

    pub fn dialog_search_probe(&self) -> Duration {
        Duration::from_millis(self.dialog_search_probe_ms)
    }

    pub fn dialog_row_probe(&self) -> Duration {
        Duration::from_millis(self.dialog_row_probe_ms)
    }

    pub fn dialog_close_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_close_timeout_ms)
    }

    pub fn dialog_activate_grace(&self) -> Duration {
        Duration::from_millis(self.dialog_activate_grace_ms)
    }

    pub fn calendar_popup_timeout(&self) -> Duration {
        Duration::from_millis(self.calendar_popup_timeout_ms)
    }
}
