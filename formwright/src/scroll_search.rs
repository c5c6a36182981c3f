//! Incremental forward scrolling over a virtualized option container.

use crate::orchestrator::StageOutcome;
use crate::tiered::{MatchTier, OptionContainer, PrefixCandidate, TieredMatch, TieredSelector};
use crate::{AutomationError, Form};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// What a forward search saw: an exact hit, or exhaustion together with the
/// first prefix-only entry passed on the way.
#[derive(Debug)]
pub struct ScrollReport {
    pub outcome: StageOutcome<TieredMatch>,
    pub prefix_candidate: Option<PrefixCandidate>,
}

/// Scrolls a container one viewport at a time and re-runs the tiered matcher.
///
/// Scrolling only ever moves forward: results are expected in a stable,
/// most-relevant-first order, so anything scrolled past is not revisited.
/// Only an exact entry ends the search early; a prefix entry is noted and the
/// search goes on, since the exact entry may sit further down.
pub struct ScrollSearch<'a> {
    form: &'a Form,
    max_iterations: usize,
    probe: Duration,
}

impl<'a> ScrollSearch<'a> {
    pub fn new(form: &'a Form, max_iterations: usize) -> Self {
        Self {
            form,
            max_iterations,
            probe: form.config().option_probe(),
        }
    }

    #[instrument(level = "debug", skip(self, container))]
    pub async fn run(
        &self,
        container: &OptionContainer,
        value: &str,
        allow_prefix: bool,
    ) -> Result<ScrollReport, AutomationError> {
        let selector = TieredSelector::new(self.form);
        let mut prefix_candidate = None;

        for iteration in 1..=self.max_iterations {
            let step = self.viewport_height(container).await;
            container.element.scroll_by(step).await?;
            debug!("scroll {iteration}/{} by {step}", self.max_iterations);

            match selector
                .find(container, value, allow_prefix, self.probe)
                .await?
            {
                Some(found) if found.tier == MatchTier::Exact => {
                    debug!("'{value}' rendered after {iteration} scroll(s)");
                    return Ok(ScrollReport {
                        outcome: StageOutcome::Success(found),
                        prefix_candidate,
                    });
                }
                Some(found) => {
                    if prefix_candidate.is_none() {
                        debug!("holding prefix match {:?}", found.element.name());
                        prefix_candidate = Some(PrefixCandidate::of(&found, iteration));
                    }
                }
                None => {}
            }
        }

        warn!(
            "'{value}' not rendered after {} scroll(s)",
            self.max_iterations
        );
        Ok(ScrollReport {
            outcome: StageOutcome::Exhausted,
            prefix_candidate,
        })
    }

    async fn viewport_height(&self, container: &OptionContainer) -> f64 {
        match container.element.bounds().await {
            Ok((_, _, _, height)) if height > 0.0 => height,
            _ => self.form.config().default_scroll_step,
        }
    }
}
