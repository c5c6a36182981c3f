//! Resilient form automation over an accessibility tree.
//!
//! Fields are found by role and accessible name only. Values are typed, picked
//! from (possibly virtualized) dropdowns, scroll-searched, or, for lookups,
//! committed through the "look up more records" dialog when everything else
//! misses. Dates go through the calendar popup.
//!
//! The browser driver is not part of this crate: implement [`AutomationEngine`]
//! and [`UIElementImpl`] for it and hand the engine to [`Form`].

use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub mod calendar;
pub mod config;
pub mod dialog;
pub mod element;
pub mod errors;
pub mod fields;
pub mod locator;
pub mod matcher;
pub mod orchestrator;
pub mod platforms;
pub mod resolver;
pub mod scroll_search;
pub mod selector;
pub mod tiered;
#[cfg(test)]
mod tests;

pub use calendar::{parse_date, CalendarNavigator, DateInput};
pub use config::{AmbiguityPolicy, EngineConfig};
pub use element::{UIElement, UIElementAttributes, UIElementImpl};
pub use errors::AutomationError;
pub use fields::{FieldEntry, FieldSetter, FieldValue, FormFill};
pub use locator::Locator;
pub use matcher::{escape, exact_pattern, label_pattern, prefix_pattern, MatchMode, MatchPattern};
pub use orchestrator::{
    CommitPath, SelectionKind, SelectionOrchestrator, SelectionRequest, SelectionResult,
    StageOutcome,
};
pub use platforms::{AutomationEngine, EngineRef};
pub use resolver::{ControlHandle, ControlResolver, ControlRole};
pub use selector::Selector;
pub use tiered::{MatchTier, OptionContainer, PrefixCandidate, TieredMatch, TieredSelector};

/// The main entry point: one automated form session against one driver.
///
/// Operations run strictly one after another; the engine assumes it is the
/// only actor on the page while an operation is in flight.
pub struct Form {
    engine: EngineRef,
    config: Arc<EngineConfig>,
    root: Option<UIElement>,
}

impl Form {
    pub fn new(engine: Arc<dyn AutomationEngine>) -> Self {
        Self::with_config(engine, EngineConfig::default())
    }

    pub fn with_config(engine: Arc<dyn AutomationEngine>, config: EngineConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            root: None,
        }
    }

    /// A copy of this form whose control lookups are limited to `root`.
    ///
    /// Dropdowns, dialogs and calendar popups are still searched page-wide,
    /// since they usually render outside the form region.
    pub fn within(&self, root: UIElement) -> Self {
        Self {
            engine: self.engine.clone(),
            config: self.config.clone(),
            root: Some(root),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &EngineRef {
        &self.engine
    }

    /// Locator scoped to the form root, if one is set.
    pub fn locator(&self, selector: impl Into<Selector>) -> Locator {
        let locator = self.page_locator(selector);
        match &self.root {
            Some(root) => locator.within(root.clone()),
            None => locator,
        }
    }

    /// Locator over the whole page, for overlays rendered outside the form.
    pub fn page_locator(&self, selector: impl Into<Selector>) -> Locator {
        Locator::new(self.engine.clone(), selector)
            .set_default_timeout(self.config.control_timeout())
            .set_poll_interval(self.config.poll_interval())
    }

    /// Bounded wait for the backing search call. Advisory only: a timeout or
    /// driver error never blocks progress.
    pub async fn settle_network(&self) {
        match self
            .engine
            .wait_for_network_response(&self.config.search_url_pattern, self.config.network_settle())
            .await
        {
            Ok(true) => debug!("network settled"),
            Ok(false) => debug!(
                "no response matching '{}' within {:?}",
                self.config.search_url_pattern,
                self.config.network_settle()
            ),
            Err(e) => warn!("network settle wait failed: {e}"),
        }
    }

    /// Resolve `label` afresh and read what it displays.
    pub async fn read_control(
        &self,
        label: &str,
        roles: &[ControlRole],
    ) -> Result<String, AutomationError> {
        let control = ControlResolver::new(self).resolve(label, roles, None).await?;
        match control.role {
            ControlRole::Checkbox | ControlRole::Switch => {
                Ok(control.element.is_toggled().await?.to_string())
            }
            ControlRole::Textbox | ControlRole::Combobox => control.element.displayed_value().await,
        }
    }

    /// The displayed value of any field kind; toggles read as `true`/`false`.
    pub async fn read_field(&self, label: &str) -> Result<String, AutomationError> {
        self.read_control(label, fields::ANY_ROLE).await
    }

    /// `allow_prefix` lets an entry that merely starts with `value` stand in
    /// when no exact entry turns up anywhere along the pipeline.
    pub async fn set_lookup(
        &self,
        label: &str,
        value: &str,
        allow_prefix: bool,
    ) -> Result<SelectionResult, AutomationError> {
        SelectionOrchestrator::new(self)
            .select(&SelectionRequest::lookup(label, value, allow_prefix))
            .await
    }

    pub async fn set_option(
        &self,
        label: &str,
        value: &str,
        allow_prefix: bool,
    ) -> Result<SelectionResult, AutomationError> {
        SelectionOrchestrator::new(self)
            .select(&SelectionRequest::option_set(label, value, allow_prefix))
            .await
    }

    pub async fn set_options(
        &self,
        label: &str,
        values: &[String],
    ) -> Result<SelectionResult, AutomationError> {
        FieldSetter::new(self).set_options(label, values).await
    }

    pub async fn set_boolean(&self, label: &str, value: bool) -> Result<SelectionResult, AutomationError> {
        FieldSetter::new(self).set_boolean(label, value).await
    }

    pub async fn set_text(&self, label: &str, value: &str) -> Result<SelectionResult, AutomationError> {
        FieldSetter::new(self).set_text(label, value).await
    }

    pub async fn set_number(&self, label: &str, value: f64) -> Result<SelectionResult, AutomationError> {
        FieldSetter::new(self).set_number(label, value).await
    }

    pub async fn set_date(
        &self,
        label: &str,
        date: impl Into<DateInput>,
    ) -> Result<SelectionResult, AutomationError> {
        CalendarNavigator::new(self).set_date(label, &date.into()).await
    }

    pub async fn clear_field(&self, label: &str) -> Result<SelectionResult, AutomationError> {
        FieldSetter::new(self).clear(label).await
    }

    pub async fn set_field(
        &self,
        label: &str,
        value: &FieldValue,
    ) -> Result<SelectionResult, AutomationError> {
        match value {
            FieldValue::Text(text) => self.set_text(label, text).await,
            FieldValue::Number(number) => self.set_number(label, *number).await,
            FieldValue::Boolean(flag) => self.set_boolean(label, *flag).await,
            FieldValue::Lookup(value) => self.set_lookup(label, value, true).await,
            FieldValue::OptionSet(value) => self.set_option(label, value, false).await,
            FieldValue::MultiOptionSet(values) => self.set_options(label, values).await,
            FieldValue::Date(date) => CalendarNavigator::new(self).set_date(label, date).await,
            FieldValue::Clear => self.clear_field(label).await,
        }
    }

    /// Applies every entry in order, stopping at the first failure.
    #[instrument(skip(self, fill), fields(fields = fill.fields.len()))]
    pub async fn fill(&self, fill: &FormFill) -> Result<Vec<SelectionResult>, AutomationError> {
        let mut results = Vec::with_capacity(fill.fields.len());
        for entry in &fill.fields {
            results.push(self.set_field(&entry.label, &entry.field).await?);
        }
        Ok(results)
    }
}

impl Clone for Form {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            config: self.config.clone(),
            root: self.root.clone(),
        }
    }
}
