//! Date entry through a calendar popup.
//!
//! The popup heading is re-read before every hop: a click can fail silently or
//! the UI can batch re-renders, so no month counter is trusted across clicks.

use crate::matcher::{exact_pattern, prefix_pattern};
use crate::orchestrator::{CommitPath, SelectionResult};
use crate::resolver::{ControlHandle, ControlResolver, ControlRole};
use crate::{AutomationError, Form, Selector, UIElement};
use chrono::{Datelike, Month, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

/// `23/10/1990`
pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";
/// `1990-10-23`
pub const ISO_FORMAT: &str = "%Y-%m-%d";

const DATE_ROLES: &[ControlRole] = &[ControlRole::Textbox, ControlRole::Combobox];

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]+)\.?,?\s+(\d{4})").expect("heading regex is a valid literal")
});

/// A date as supplied by a caller: text in one of the accepted layouts, or a structured value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Date(NaiveDate),
    Text(String),
}

impl DateInput {
    pub fn resolve(&self) -> Result<NaiveDate, AutomationError> {
        match self {
            DateInput::Date(date) => Ok(*date),
            DateInput::Text(text) => parse_date(text),
        }
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl fmt::Display for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateInput::Date(date) => write!(f, "{}", date.format(ISO_FORMAT)),
            DateInput::Text(text) => f.write_str(text),
        }
    }
}

/// Parses `dd/mm/yyyy` or `yyyy-mm-dd`; anything else is `UnparsableDate`.
pub fn parse_date(input: &str) -> Result<NaiveDate, AutomationError> {
    let trimmed = input.trim();
    [DAY_FIRST_FORMAT, ISO_FORMAT]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| AutomationError::UnparsableDate {
            input: input.to_string(),
        })
}

/// The month and year a calendar heading shows, e.g. `"September 2025"` or `"Sep. 2025"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub year: i32,
    pub month: u32,
}

impl CalendarCursor {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(heading: &str) -> Option<Self> {
        HEADING_RE.captures_iter(heading).find_map(|caps| {
            let month = caps[1].parse::<Month>().ok()?;
            let year = caps[2].parse::<i32>().ok()?;
            Some(Self {
                year,
                month: month.number_from_month(),
            })
        })
    }

    /// Signed number of months from `self` to `target`.
    pub fn months_until(&self, target: CalendarCursor) -> i64 {
        (i64::from(target.year) - i64::from(self.year)) * 12
            + (i64::from(target.month) - i64::from(self.month))
    }
}

/// Whether `heading` already shows the month of `date`, in long or abbreviated form.
pub fn heading_shows(heading: &str, date: NaiveDate) -> bool {
    let heading = heading.to_lowercase();
    let long = date.format("%B %Y").to_string().to_lowercase();
    let short = date.format("%b %Y").to_string().to_lowercase();
    heading.contains(&long) || heading.contains(&short)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopPlan {
    pub direction: HopDirection,
    pub budget: u32,
}

/// Direction and hop ceiling from the displayed month to `target`.
///
/// An unreadable heading gets the large fallback bound and an optimistic forward direction.
pub fn plan_hops(
    displayed: Option<CalendarCursor>,
    target: NaiveDate,
    safety_margin: u32,
    fallback_budget: u32,
) -> HopPlan {
    match displayed {
        Some(cursor) => {
            let diff = cursor.months_until(CalendarCursor::of(target));
            let direction = if diff > 0 {
                HopDirection::Forward
            } else {
                HopDirection::Backward
            };
            let distance = u32::try_from(diff.unsigned_abs()).unwrap_or(u32::MAX);
            HopPlan {
                direction,
                budget: distance.saturating_add(safety_margin),
            }
        }
        None => HopPlan {
            direction: HopDirection::Forward,
            budget: fallback_budget,
        },
    }
}

pub struct CalendarNavigator<'a> {
    form: &'a Form,
}

impl<'a> CalendarNavigator<'a> {
    pub fn new(form: &'a Form) -> Self {
        Self { form }
    }

    #[instrument(level = "debug", skip(self, input), fields(input = %input))]
    pub async fn set_date(
        &self,
        label: &str,
        input: &DateInput,
    ) -> Result<SelectionResult, AutomationError> {
        let target = input.resolve()?;
        let control = ControlResolver::new(self.form)
            .resolve(label, DATE_ROLES, None)
            .await?;

        let popup = self.open_popup(&control).await?;
        self.navigate(&popup, target).await?;
        self.pick_day(&popup, label, target).await?;

        let value = if self.form.config().verify_after_set {
            let displayed = self.form.read_control(label, &[control.role]).await?;
            match parse_date(&displayed) {
                Ok(shown) if shown == target => displayed,
                _ => {
                    return Err(AutomationError::VerificationFailed {
                        label: label.to_string(),
                        expected: target.format(ISO_FORMAT).to_string(),
                        actual: displayed,
                    })
                }
            }
        } else {
            target.format(DAY_FIRST_FORMAT).to_string()
        };

        info!("'{label}' set to {value}");
        Ok(SelectionResult {
            label: label.to_string(),
            value,
            tier: None,
            path: CommitPath::Calendar,
        })
    }

    async fn open_popup(&self, control: &ControlHandle) -> Result<UIElement, AutomationError> {
        let config = self.form.config();

        match self.find_trigger(control).await? {
            Some(trigger) => trigger.click().await?,
            None => {
                warn!(
                    "no calendar button for '{}', trying {}",
                    control.label, config.calendar_open_key
                );
                control.element.press_key(&config.calendar_open_key).await?;
            }
        }

        self.wait_for_popup(control).await
    }

    /// A page-level dialog that holds a heading and day cells but not the field
    /// itself. Other dialogs, such as a quick-create host or a lookup picker,
    /// are passed over.
    async fn wait_for_popup(&self, control: &ControlHandle) -> Result<UIElement, AutomationError> {
        let config = self.form.config();
        let deadline = Instant::now() + config.calendar_popup_timeout();
        loop {
            for dialog in self
                .form
                .page_locator(Selector::role("dialog"))
                .visible_now()
                .await?
            {
                if self.is_calendar(&dialog, control).await? {
                    debug!("calendar popup: {:?}", dialog.name());
                    return Ok(dialog);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::ElementNotFound(format!(
                    "calendar popup for '{}'",
                    control.label
                )));
            }
            sleep(config.poll_interval().min(deadline - now)).await;
        }
    }

    async fn is_calendar(
        &self,
        dialog: &UIElement,
        control: &ControlHandle,
    ) -> Result<bool, AutomationError> {
        let hosts_field = self
            .form
            .page_locator(Selector::role(control.role.as_str()))
            .within(dialog.clone())
            .all()
            .await?
            .contains(&control.element);
        if hosts_field {
            return Ok(false);
        }
        for role in ["heading", "gridcell"] {
            let found = self
                .form
                .page_locator(Selector::role(role))
                .within(dialog.clone())
                .all()
                .await?;
            if found.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The calendar button belonging to this field: one that names the label,
    /// or the only one on the form.
    async fn find_trigger(&self, control: &ControlHandle) -> Result<Option<UIElement>, AutomationError> {
        let config = self.form.config();
        let mut candidates = Vec::new();
        for name in &config.calendar_trigger_names {
            let locator = self
                .form
                .locator(Selector::role_named("button", prefix_pattern(name)?));
            if locator.probe(config.option_probe()).await?.is_some() {
                for button in locator.visible_now().await? {
                    if !candidates.contains(&button) {
                        candidates.push(button);
                    }
                }
            }
        }

        let label = control.label.to_lowercase();
        if let Some(own) = candidates
            .iter()
            .find(|b| b.name_or_empty().to_lowercase().contains(&label))
        {
            return Ok(Some(own.clone()));
        }
        if candidates.len() > 1 {
            debug!(
                "{} calendar buttons on the form, none names '{}'",
                candidates.len(),
                control.label
            );
            return Ok(None);
        }
        Ok(candidates.pop())
    }

    async fn read_heading(&self, popup: &UIElement) -> Result<Option<String>, AutomationError> {
        let heading = self
            .form
            .locator(Selector::role("heading"))
            .within(popup.clone())
            .probe(self.form.config().option_probe())
            .await?;
        match heading {
            Some(heading) => {
                let text = heading.text().await?;
                if text.trim().is_empty() {
                    Ok(heading.name())
                } else {
                    Ok(Some(text))
                }
            }
            None => Ok(None),
        }
    }

    /// Walks month by month until the heading shows the target month.
    async fn navigate(&self, popup: &UIElement, target: NaiveDate) -> Result<(), AutomationError> {
        let config = self.form.config();
        let heading = self.read_heading(popup).await?;
        let cursor = heading.as_deref().and_then(CalendarCursor::parse);
        if cursor.is_none() {
            warn!("cannot read calendar heading {heading:?}, walking forward");
        }
        let plan = plan_hops(
            cursor,
            target,
            config.calendar_safety_margin,
            config.calendar_max_hops,
        );
        debug!(?plan, ?cursor, "calendar hop plan");

        let mut last_heading = heading;
        for _ in 0..plan.budget {
            let heading = self.read_heading(popup).await?;
            if heading.as_deref().is_some_and(|h| heading_shows(h, target)) {
                return Ok(());
            }
            last_heading = heading;
            self.hop(popup, plan.direction).await?;
        }

        let heading = self.read_heading(popup).await?;
        if heading.as_deref().is_some_and(|h| heading_shows(h, target)) {
            return Ok(());
        }
        Err(AutomationError::CalendarNavigation {
            target: target.format("%B %Y").to_string(),
            displayed: heading.or(last_heading),
        })
    }

    async fn hop(&self, popup: &UIElement, direction: HopDirection) -> Result<(), AutomationError> {
        let config = self.form.config();
        let (names, key) = match direction {
            HopDirection::Forward => (&config.next_month_names, &config.calendar_next_key),
            HopDirection::Backward => (&config.previous_month_names, &config.calendar_previous_key),
        };

        for name in names {
            let button = self
                .form
                .locator(Selector::role_named("button", prefix_pattern(name)?))
                .within(popup.clone())
                .probe(config.option_probe())
                .await?;
            if let Some(button) = button {
                return button.click().await;
            }
        }

        debug!("no {direction:?} month button, pressing {key}");
        popup.press_key(key).await
    }

    /// Day cells are matched exactly: "1" must never prefix-match "10".
    ///
    /// Grids also render the tail of the previous month and the head of the
    /// next one. The displayed month starts at the first cell reading "1", so
    /// the target is the first exact match from there on.
    async fn pick_day(
        &self,
        popup: &UIElement,
        label: &str,
        target: NaiveDate,
    ) -> Result<(), AutomationError> {
        let missing =
            || AutomationError::ElementNotFound(format!("day {} in calendar for '{label}'", target.day()));
        let cells = match self
            .form
            .page_locator(Selector::role("gridcell"))
            .within(popup.clone())
            .wait_all(Some(self.form.config().option_probe()))
            .await
        {
            Ok(cells) => cells,
            Err(AutomationError::Timeout(_)) => return Err(missing()),
            Err(e) => return Err(e),
        };

        let first = exact_pattern("1")?;
        let day = exact_pattern(&target.day().to_string())?;
        let month_start = cells
            .iter()
            .position(|c| first.is_match(&c.name_or_empty()))
            .unwrap_or(0);
        let cell = cells[month_start..]
            .iter()
            .find(|c| day.is_match(&c.name_or_empty()))
            .ok_or_else(missing)?;
        if month_start > 0 {
            debug!("skipped {month_start} leading cell(s) from the previous month");
        }
        cell.click().await
    }
}
