//! Terminal fallback for lookups: the "look up more records" picker dialog.

use crate::matcher::exact_pattern;
use crate::resolver::ControlHandle;
use crate::tiered::{require_value, OptionContainer, TieredMatch, TieredSelector};
use crate::{AutomationError, Form, Selector, UIElement};
use tracing::{debug, info, instrument, warn};

pub struct DialogEscalation<'a> {
    form: &'a Form,
}

impl<'a> DialogEscalation<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form }
    }

    /// Opens the picker, narrows it with a search, selects the matching row and
    /// waits for the dialog to close.
    #[instrument(level = "debug", skip(self, control), fields(label = %control.label))]
    pub async fn run(
        &self,
        control: &ControlHandle,
        value: &str,
        allow_prefix: bool,
    ) -> Result<TieredMatch, AutomationError> {
        require_value(&control.label, value)?;
        let config = self.form.config();

        self.trigger(control).await?;

        let dialog = self
            .form
            .page_locator(Selector::role("dialog"))
            .wait(Some(config.dialog_open_timeout()))
            .await
            .map_err(|e| match e {
                AutomationError::Timeout(_) => AutomationError::DialogDidNotOpen {
                    label: control.label.clone(),
                },
                other => other,
            })?;
        debug!("lookup dialog open: {:?}", dialog.name());

        self.search(&dialog, value).await?;

        let found = TieredSelector::new(self.form)
            .find(
                &OptionContainer::grid(dialog.clone()),
                value,
                allow_prefix,
                config.dialog_row_probe(),
            )
            .await?;

        let Some(found) = found else {
            // Leave the page the way we found it before reporting.
            if let Err(e) = dialog.press_key(&config.dismiss_key).await {
                warn!("could not dismiss lookup dialog: {e}");
            }
            return Err(AutomationError::OptionNotFound {
                label: control.label.clone(),
                value: value.to_string(),
            });
        };

        let row_name = found.element.name_or_empty();
        self.commit(&dialog, &found.element, control, value).await?;
        info!(
            "committed '{row_name}' for '{}' through the lookup dialog",
            control.label
        );
        Ok(found)
    }

    /// Click a visible "look up more records" affordance, or fall back to the keyboard gesture.
    async fn trigger(&self, control: &ControlHandle) -> Result<(), AutomationError> {
        let config = self.form.config();
        for name in &config.lookup_more_names {
            let button = self
                .form
                .page_locator(Selector::role_named("button", exact_pattern(name)?))
                .probe(config.option_probe())
                .await?;
            if let Some(button) = button {
                debug!("opening lookup dialog via '{name}'");
                return button.click().await;
            }
        }

        warn!(
            "no lookup-more button visible for '{}', trying {}",
            control.label, config.escalation_key
        );
        control.element.press_key(&config.escalation_key).await
    }

    async fn search(&self, dialog: &UIElement, value: &str) -> Result<(), AutomationError> {
        let config = self.form.config();
        for role in ["searchbox", "textbox"] {
            let search_box = self
                .form
                .locator(Selector::role(role))
                .within(dialog.clone())
                .probe(config.dialog_search_probe())
                .await?;
            if let Some(search_box) = search_box {
                search_box.set_text(value).await?;
                search_box.press_key(&config.submit_key).await?;
                self.form.settle_network().await;
                return Ok(());
            }
        }
        debug!("lookup dialog has no search box, matching rows as rendered");
        Ok(())
    }

    /// Double-click first; if the dialog stays open, tick the row and confirm.
    async fn commit(
        &self,
        dialog: &UIElement,
        row: &UIElement,
        control: &ControlHandle,
        value: &str,
    ) -> Result<(), AutomationError> {
        let config = self.form.config();
        let not_committed = || AutomationError::SelectionNotCommitted {
            label: control.label.clone(),
            value: value.to_string(),
        };

        row.double_click().await?;
        if dialog.wait_hidden(config.dialog_activate_grace()).await? {
            return Ok(());
        }

        warn!("double-click left the lookup dialog open, using checkbox and confirm");
        let checkbox = self
            .form
            .locator(Selector::role("checkbox"))
            .within(row.clone())
            .probe(config.option_probe())
            .await?;
        if let Some(checkbox) = checkbox {
            if !checkbox.is_toggled().await? {
                checkbox.click().await?;
            }
        } else {
            row.click().await?;
        }

        let mut confirmed = false;
        for name in &config.confirm_button_names {
            let button = self
                .form
                .locator(Selector::role_named("button", exact_pattern(name)?))
                .within(dialog.clone())
                .probe(config.option_probe())
                .await?;
            if let Some(button) = button {
                button.click().await?;
                confirmed = true;
                break;
            }
        }
        if !confirmed {
            return Err(not_committed());
        }

        if dialog.wait_hidden(config.dialog_close_timeout()).await? {
            Ok(())
        } else {
            Err(not_committed())
        }
    }
}
