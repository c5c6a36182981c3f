//! The driver seam.
//!
//! Concrete browser drivers (CDP, WebDriver, a Playwright bridge) live outside
//! this crate and plug in by implementing [`AutomationEngine`] for the page and
//! [`crate::UIElementImpl`] for the elements it returns.

use crate::{AutomationError, Selector, UIElement};
use std::sync::Arc;
use std::time::Duration;

/// Page-level capabilities every driver must provide
#[async_trait::async_trait]
pub trait AutomationEngine: Send + Sync {
    /// Snapshot of every element matching `selector` under `root` (or the page),
    /// in document order. Must not wait: bounded waiting is done by [`crate::Locator`].
    async fn find_elements(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
    ) -> Result<Vec<UIElement>, AutomationError>;

    /// Wait for a network response whose URL contains `url_pattern`.
    ///
    /// Returns `Ok(false)` on timeout. Only ever used as a settle heuristic.
    async fn wait_for_network_response(
        &self,
        url_pattern: &str,
        timeout: Duration,
    ) -> Result<bool, AutomationError>;
}

/// Shared handle to a driver, as held by [`crate::Form`] and every stage.
pub type EngineRef = Arc<dyn AutomationEngine>;
