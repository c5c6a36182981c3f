use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

/// Interval used by the default polling implementation of `wait_hidden`.
const VISIBILITY_POLL: Duration = Duration::from_millis(100);

/// Snapshot of the accessibility properties of an element.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UIElementAttributes {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_toggled: Option<bool>,
}

impl fmt::Debug for UIElementAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("UIElementAttributes");
        debug_struct.field("role", &self.role);
        if let Some(name) = self.name.as_ref().filter(|s| !s.is_empty()) {
            debug_struct.field("name", name);
        }
        if let Some(value) = self.value.as_ref().filter(|s| !s.is_empty()) {
            debug_struct.field("value", value);
        }
        if let Some(selected) = self.is_selected {
            debug_struct.field("is_selected", &selected);
        }
        if let Some(toggled) = self.is_toggled {
            debug_struct.field("is_toggled", &toggled);
        }
        debug_struct.finish()
    }
}

/// Capabilities a driver exposes for one live, rendered element.
///
/// Handles may be invalidated by any re-render; callers hold them for the
/// duration of a single field operation only.
#[async_trait::async_trait]
pub trait UIElementImpl: Send + Sync + Debug {
    fn object_id(&self) -> usize;
    fn role(&self) -> String;
    fn attributes(&self) -> UIElementAttributes;
    fn name(&self) -> Option<String> {
        self.attributes().name
    }
    async fn is_visible(&self) -> Result<bool, AutomationError>;
    async fn click(&self) -> Result<(), AutomationError>;
    async fn double_click(&self) -> Result<(), AutomationError>;
    /// Types `text` at the caret, like a user would.
    async fn type_text(&self, text: &str) -> Result<(), AutomationError>;
    /// Replaces the whole value in one step.
    async fn set_text(&self, text: &str) -> Result<(), AutomationError>;
    async fn press_key(&self, key: &str) -> Result<(), AutomationError>;
    /// Displayed text (readDisplayedText).
    async fn text(&self) -> Result<String, AutomationError>;
    /// Current input value (readValue).
    async fn value(&self) -> Result<String, AutomationError>;
    async fn scroll_by(&self, delta: f64) -> Result<(), AutomationError>;
    async fn bounds(&self) -> Result<(f64, f64, f64, f64), AutomationError>; // x, y, width, height
    async fn is_toggled(&self) -> Result<bool, AutomationError>;

    async fn is_selected(&self) -> Result<bool, AutomationError> {
        Ok(self.attributes().is_selected.unwrap_or(false))
    }

    /// Waits until the element is hidden or detached. Drivers with native waits should override this.
    async fn wait_hidden(&self, timeout: Duration) -> Result<bool, AutomationError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.is_visible().await {
                Ok(false) | Err(AutomationError::ElementNotFound(_)) => return Ok(true),
                Ok(true) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(VISIBILITY_POLL).await;
        }
    }
}

/// Represents a live UI element rendered by the driven application
#[derive(Debug, Clone)]
pub struct UIElement {
    inner: Arc<dyn UIElementImpl>,
}

impl UIElement {
    /// Create a new UI element from any driver-specific implementation
    pub fn new(impl_: Arc<dyn UIElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn role(&self) -> String {
        self.inner.role()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    pub fn name_or_empty(&self) -> String {
        self.name().unwrap_or_default()
    }

    pub fn attributes(&self) -> UIElementAttributes {
        self.inner.attributes()
    }

    pub async fn is_visible(&self) -> Result<bool, AutomationError> {
        self.inner.is_visible().await
    }

    #[instrument(level = "debug", skip(self), fields(role = %self.role(), name = ?self.name()))]
    pub async fn click(&self) -> Result<(), AutomationError> {
        self.inner.click().await
    }

    #[instrument(level = "debug", skip(self), fields(role = %self.role(), name = ?self.name()))]
    pub async fn double_click(&self) -> Result<(), AutomationError> {
        self.inner.double_click().await
    }

    pub async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        debug!(role = %self.role(), "typing {} chars", text.chars().count());
        self.inner.type_text(text).await
    }

    pub async fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.set_text(text).await
    }

    pub async fn press_key(&self, key: &str) -> Result<(), AutomationError> {
        debug!(role = %self.role(), key, "pressing key");
        self.inner.press_key(key).await
    }

    pub async fn text(&self) -> Result<String, AutomationError> {
        self.inner.text().await
    }

    pub async fn value(&self) -> Result<String, AutomationError> {
        self.inner.value().await
    }

    /// The value a user would read off the control: its input value, or its text when empty.
    pub async fn displayed_value(&self) -> Result<String, AutomationError> {
        let value = self.inner.value().await?;
        if !value.trim().is_empty() {
            return Ok(value.trim().to_string());
        }
        Ok(self.inner.text().await?.trim().to_string())
    }

    pub async fn scroll_by(&self, delta: f64) -> Result<(), AutomationError> {
        self.inner.scroll_by(delta).await
    }

    pub async fn bounds(&self) -> Result<(f64, f64, f64, f64), AutomationError> {
        self.inner.bounds().await
    }

    pub async fn is_toggled(&self) -> Result<bool, AutomationError> {
        self.inner.is_toggled().await
    }

    pub async fn is_selected(&self) -> Result<bool, AutomationError> {
        self.inner.is_selected().await
    }

    pub async fn wait_hidden(&self, timeout: Duration) -> Result<bool, AutomationError> {
        self.inner.wait_hidden(timeout).await
    }
}

impl PartialEq for UIElement {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for UIElement {}
