use tracing::{debug, instrument};

use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::platforms::EngineRef;
use crate::selector::Selector;
use std::time::Duration;
use tokio::time::{sleep, Instant};

// Default timeout if none is specified on the locator itself
const DEFAULT_LOCATOR_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A bounded-wait view over a selector.
///
/// For maximum precision, prefer role|name selectors (e.g. "role:option|name:Jane Doe")
/// over a bare role that could match every entry in a list.
#[derive(Clone)]
pub struct Locator {
    engine: EngineRef,
    selector: Selector,
    timeout: Duration, // Default timeout for this locator instance
    poll_interval: Duration,
    root: Option<UIElement>,
}

impl Locator {
    /// Create a new locator with the given selector
    pub fn new(engine: EngineRef, selector: impl Into<Selector>) -> Self {
        Self {
            engine,
            selector: selector.into(),
            timeout: DEFAULT_LOCATOR_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            root: None,
        }
    }

    /// Set a default timeout for waiting operations on this locator instance.
    /// This timeout is used if no specific timeout is passed to wait methods.
    pub fn set_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn set_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the root element for this locator
    pub fn within(mut self, element: UIElement) -> Self {
        self.root = Some(element);
        self
    }

    /// Every element currently matching the selector, visible or not. Does not wait.
    pub async fn all(&self) -> Result<Vec<UIElement>, AutomationError> {
        if let Selector::Invalid(reason) = &self.selector {
            return Err(AutomationError::InvalidSelector(reason.clone()));
        }
        match self
            .engine
            .find_elements(&self.selector, self.root.as_ref())
            .await
        {
            Ok(elements) => Ok(elements),
            // A root that re-rendered away simply has no matches right now.
            Err(AutomationError::ElementNotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Currently visible matches, in document order. Does not wait.
    pub async fn visible_now(&self) -> Result<Vec<UIElement>, AutomationError> {
        let mut visible = Vec::new();
        for element in self.all().await? {
            if element.is_visible().await? {
                visible.push(element);
            }
        }
        Ok(visible)
    }

    /// Wait for a visible element matching the locator, up to the specified timeout.
    /// If no timeout is provided, uses the locator's default timeout.
    #[instrument(level = "debug", skip(self, timeout), fields(selector = %self.selector))]
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<UIElement, AutomationError> {
        let mut matches = self.wait_all(timeout).await?;
        Ok(matches.remove(0))
    }

    /// Wait until at least one match is visible, then return every visible match.
    pub async fn wait_all(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Vec<UIElement>, AutomationError> {
        let effective_timeout = timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + effective_timeout;

        loop {
            let visible = self.visible_now().await?;
            if !visible.is_empty() {
                debug!("found {} visible match(es) for {}", visible.len(), self.selector);
                return Ok(visible);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::Timeout(format!(
                    "Timed out after {effective_timeout:?} waiting for element {}",
                    self.selector_string()
                )));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Like [`Locator::wait`], but a timeout is reported as `None` instead of an error.
    pub async fn probe(&self, timeout: Duration) -> Result<Option<UIElement>, AutomationError> {
        match self.wait(Some(timeout)).await {
            Ok(element) => Ok(Some(element)),
            Err(AutomationError::Timeout(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn selector_string(&self) -> String {
        self.selector.to_string()
    }
}
