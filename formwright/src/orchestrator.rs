//! The escalation pipeline behind every dropdown-backed field.
//!
//! ```text
//! Idle -> Resolving -> DirectEntryAttempted -> OptionVisible -> Committed
//!                                          \-> NotRendered -> ScrollSearching -> Found -> Committed
//!                                                                            \-> Exhausted -> PrefixFallback -> Committed
//!                                                                                         \-> Escalating -> Committed
//! ```
//!
//! Each stage reports a [`StageOutcome`] or a fatal error; [`SelectionOrchestrator::step`]
//! is the only place that decides where a miss goes next.
//!
//! Virtualized lists only show a window of their entries, so a prefix hit in
//! one window says nothing about an exact entry further down. For those kinds
//! the first prefix hit is held as a [`PrefixCandidate`] and taken only once
//! scrolling has run out without an exact hit.

use crate::dialog::DialogEscalation;
use crate::resolver::{ControlHandle, ControlResolver, ControlRole};
use crate::scroll_search::ScrollSearch;
use crate::tiered::{
    match_tier, require_value, MatchTier, OptionContainer, PrefixCandidate, TieredMatch,
    TieredSelector,
};
use crate::{AutomationError, Form, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Result of one fallback stage. Fatal failures travel as `Err`.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Success(T),
    /// The stage ran out of budget; the next fallback, if any, takes over.
    Exhausted,
}

/// Dropdown-backed field families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    /// Reference to another record; virtualized search results, escalates to a dialog.
    Lookup,
    /// Fixed choice list rendered in full.
    OptionSet,
}

impl SelectionKind {
    pub fn roles(&self) -> &'static [ControlRole] {
        match self {
            SelectionKind::Lookup => &[ControlRole::Combobox, ControlRole::Textbox],
            SelectionKind::OptionSet => &[ControlRole::Combobox],
        }
    }

    pub fn is_virtualized(&self) -> bool {
        matches!(self, SelectionKind::Lookup)
    }

    pub fn escalates(&self) -> bool {
        matches!(self, SelectionKind::Lookup)
    }
}

/// The stage that made a value stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPath {
    DirectEntry,
    ScrollSearch,
    Dialog,
    Toggle,
    Calendar,
    Typed,
    Cleared,
}

/// A committed value as the field displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<MatchTier>,
    pub path: CommitPath,
}

#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub label: String,
    pub value: String,
    pub kind: SelectionKind,
    pub allow_prefix: bool,
}

impl SelectionRequest {
    pub fn lookup(label: &str, value: &str, allow_prefix: bool) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            kind: SelectionKind::Lookup,
            allow_prefix,
        }
    }

    pub fn option_set(label: &str, value: &str, allow_prefix: bool) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            kind: SelectionKind::OptionSet,
            allow_prefix,
        }
    }

    fn not_found(&self) -> AutomationError {
        AutomationError::OptionNotFound {
            label: self.label.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Debug)]
pub enum PipelineState {
    Idle,
    Resolving,
    DirectEntryAttempted {
        control: ControlHandle,
        container: Option<OptionContainer>,
    },
    OptionVisible {
        control: ControlHandle,
        option: TieredMatch,
    },
    NotRendered {
        control: ControlHandle,
        container: Option<OptionContainer>,
        candidate: Option<PrefixCandidate>,
    },
    ScrollSearching {
        control: ControlHandle,
        container: OptionContainer,
        candidate: Option<PrefixCandidate>,
    },
    Found {
        control: ControlHandle,
        option: TieredMatch,
    },
    Exhausted {
        control: ControlHandle,
        candidate: Option<PrefixCandidate>,
    },
    PrefixFallback {
        control: ControlHandle,
        candidate: PrefixCandidate,
    },
    Escalating {
        control: ControlHandle,
    },
    Committed {
        control: ControlHandle,
        option_name: String,
        tier: MatchTier,
        path: CommitPath,
    },
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Resolving => "resolving",
            PipelineState::DirectEntryAttempted { .. } => "direct_entry_attempted",
            PipelineState::OptionVisible { .. } => "option_visible",
            PipelineState::NotRendered { .. } => "not_rendered",
            PipelineState::ScrollSearching { .. } => "scroll_searching",
            PipelineState::Found { .. } => "found",
            PipelineState::Exhausted { .. } => "exhausted",
            PipelineState::PrefixFallback { .. } => "prefix_fallback",
            PipelineState::Escalating { .. } => "escalating",
            PipelineState::Committed { .. } => "committed",
        }
    }
}

pub struct SelectionOrchestrator<'a> {
    form: &'a Form,
}

impl<'a> SelectionOrchestrator<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form }
    }

    /// Runs the pipeline to a committed value or the first terminal error.
    #[instrument(level = "debug", skip(self), fields(label = %request.label, value = %request.value))]
    pub async fn select(
        &self,
        request: &SelectionRequest,
    ) -> Result<SelectionResult, AutomationError> {
        require_value(&request.label, &request.value)?;
        let mut state = PipelineState::Idle;
        loop {
            debug!(state = state.name(), "selection pipeline");
            state = match state {
                PipelineState::Committed {
                    control,
                    option_name,
                    tier,
                    path,
                } => {
                    return self
                        .finish(request, control, option_name, tier, path)
                        .await;
                }
                other => self.step(request, other).await?,
            };
        }
    }

    /// The transition table.
    pub async fn step(
        &self,
        request: &SelectionRequest,
        state: PipelineState,
    ) -> Result<PipelineState, AutomationError> {
        let config = self.form.config();
        let next = match state {
            PipelineState::Idle => PipelineState::Resolving,

            PipelineState::Resolving => {
                let control = ControlResolver::new(self.form)
                    .resolve(&request.label, request.kind.roles(), None)
                    .await?;
                let container = self.direct_entry(request, &control).await?;
                PipelineState::DirectEntryAttempted { control, container }
            }

            PipelineState::DirectEntryAttempted { control, container } => {
                let found = match &container {
                    Some(container) => {
                        TieredSelector::new(self.form)
                            .find(
                                container,
                                &request.value,
                                request.allow_prefix,
                                config.option_probe(),
                            )
                            .await?
                    }
                    None => None,
                };
                match found {
                    Some(option)
                        if option.tier == MatchTier::Prefix && request.kind.is_virtualized() =>
                    {
                        debug!("holding prefix match {:?} until scrolling is done", option.element.name());
                        PipelineState::NotRendered {
                            control,
                            container,
                            candidate: Some(PrefixCandidate::of(&option, 0)),
                        }
                    }
                    Some(option) => PipelineState::OptionVisible { control, option },
                    None => PipelineState::NotRendered {
                        control,
                        container,
                        candidate: None,
                    },
                }
            }

            PipelineState::OptionVisible { control, option } => {
                let option_name = option.element.name_or_empty();
                option.element.click().await?;
                PipelineState::Committed {
                    control,
                    option_name,
                    tier: option.tier,
                    path: CommitPath::DirectEntry,
                }
            }

            PipelineState::NotRendered {
                control,
                container,
                candidate,
            } => {
                if !request.kind.is_virtualized() {
                    self.dismiss(&control).await;
                    return Err(request.not_found());
                }
                match container {
                    Some(container) => PipelineState::ScrollSearching {
                        control,
                        container,
                        candidate,
                    },
                    None => {
                        warn!("no option list rendered for '{}'", request.label);
                        PipelineState::Exhausted { control, candidate }
                    }
                }
            }

            PipelineState::ScrollSearching {
                control,
                container,
                candidate,
            } => {
                let report = ScrollSearch::new(self.form, config.lookup_scroll_iterations)
                    .run(&container, &request.value, request.allow_prefix)
                    .await?;
                match report.outcome {
                    StageOutcome::Success(option) => PipelineState::Found { control, option },
                    StageOutcome::Exhausted => PipelineState::Exhausted {
                        control,
                        candidate: candidate.or(report.prefix_candidate),
                    },
                }
            }

            PipelineState::Found { control, option } => {
                let option_name = option.element.name_or_empty();
                option.element.click().await?;
                PipelineState::Committed {
                    control,
                    option_name,
                    tier: option.tier,
                    path: CommitPath::ScrollSearch,
                }
            }

            PipelineState::Exhausted { control, candidate } => {
                if let Some(candidate) = candidate {
                    PipelineState::PrefixFallback { control, candidate }
                } else if request.kind.escalates() {
                    // The dropdown stays open: it usually hosts the lookup-more button.
                    PipelineState::Escalating { control }
                } else {
                    self.dismiss(&control).await;
                    return Err(request.not_found());
                }
            }

            PipelineState::PrefixFallback { control, candidate } => {
                match self.reselect(request, &control, &candidate).await? {
                    Some(option) => {
                        option.element.click().await?;
                        PipelineState::Committed {
                            control,
                            option_name: candidate.name,
                            tier: MatchTier::Prefix,
                            path: if candidate.scrolls == 0 {
                                CommitPath::DirectEntry
                            } else {
                                CommitPath::ScrollSearch
                            },
                        }
                    }
                    None if request.kind.escalates() => {
                        warn!("prefix match '{}' did not render again", candidate.name);
                        PipelineState::Escalating { control }
                    }
                    None => {
                        self.dismiss(&control).await;
                        return Err(request.not_found());
                    }
                }
            }

            PipelineState::Escalating { control } => {
                let option = DialogEscalation::new(self.form)
                    .run(&control, &request.value, request.allow_prefix)
                    .await?;
                PipelineState::Committed {
                    control,
                    option_name: option.element.name_or_empty(),
                    tier: option.tier,
                    path: CommitPath::Dialog,
                }
            }

            committed @ PipelineState::Committed { .. } => committed,
        };
        Ok(next)
    }

    /// Drive the control's own entry gesture and return the option list it reveals, if any.
    async fn direct_entry(
        &self,
        request: &SelectionRequest,
        control: &ControlHandle,
    ) -> Result<Option<OptionContainer>, AutomationError> {
        let config = self.form.config();
        match request.kind {
            SelectionKind::Lookup => {
                control.element.set_text("").await?;
                control.element.type_text(&request.value).await?;
                control.element.press_key(&config.reveal_options_key).await?;
                self.form.settle_network().await;
            }
            SelectionKind::OptionSet => control.element.click().await?,
        }

        let listbox = self
            .form
            .page_locator(Selector::role("listbox"))
            .probe(config.listbox_timeout())
            .await?;
        Ok(listbox.map(OptionContainer::listbox))
    }

    /// Reopen the list from the top and walk back to the held prefix entry.
    async fn reselect(
        &self,
        request: &SelectionRequest,
        control: &ControlHandle,
        candidate: &PrefixCandidate,
    ) -> Result<Option<TieredMatch>, AutomationError> {
        let Some(container) = self.direct_entry(request, control).await? else {
            return Ok(None);
        };
        let probe = self.form.config().option_probe();
        if let Some(found) = TieredSelector::new(self.form)
            .find(&container, &candidate.name, false, probe)
            .await?
        {
            return Ok(Some(found));
        }
        let report = ScrollSearch::new(self.form, candidate.scrolls)
            .run(&container, &candidate.name, false)
            .await?;
        match report.outcome {
            StageOutcome::Success(found) => Ok(Some(found)),
            StageOutcome::Exhausted => Ok(None),
        }
    }

    /// Close a dropdown left open by a miss. Best effort.
    async fn dismiss(&self, control: &ControlHandle) {
        let key = &self.form.config().dismiss_key;
        if let Err(e) = control.element.press_key(key).await {
            debug!("could not dismiss dropdown for '{}': {e}", control.label);
        }
    }

    /// Read the committed value back through a freshly resolved control.
    async fn finish(
        &self,
        request: &SelectionRequest,
        control: ControlHandle,
        option_name: String,
        tier: MatchTier,
        path: CommitPath,
    ) -> Result<SelectionResult, AutomationError> {
        let value = if self.form.config().verify_after_set {
            let displayed = self
                .form
                .read_control(&request.label, &[control.role])
                .await?;
            let allow_prefix = request.allow_prefix || tier == MatchTier::Prefix;
            if match_tier(&displayed, &request.value, allow_prefix)?.is_none() {
                return Err(AutomationError::VerificationFailed {
                    label: request.label.clone(),
                    expected: request.value.clone(),
                    actual: displayed,
                });
            }
            displayed
        } else {
            option_name
        };

        info!("'{}' set to '{value}' via {path:?}", request.label);
        Ok(SelectionResult {
            label: request.label.clone(),
            value,
            tier: Some(tier),
            path,
        })
    }
}
