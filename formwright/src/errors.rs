use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Control not found for label '{label}'")]
    ControlNotFound { label: String },

    #[error("Option '{value}' not found for field '{label}'")]
    OptionNotFound { label: String, value: String },

    #[error("Lookup dialog did not open for field '{label}'")]
    DialogDidNotOpen { label: String },

    #[error("Selection of '{value}' for field '{label}' was not committed: dialog stayed open")]
    SelectionNotCommitted { label: String, value: String },

    #[error("Unparsable date: '{input}' (expected dd/mm/yyyy or yyyy-mm-dd)")]
    UnparsableDate { input: String },

    #[error("Label '{label}' matches {count} visible controls")]
    AmbiguousControl { label: String, count: usize },

    #[error("Field '{label}' shows '{actual}' after setting '{expected}'")]
    VerificationFailed {
        label: String,
        expected: String,
        actual: String,
    },

    #[error("Calendar did not reach '{target}' (last heading: {displayed:?})")]
    CalendarNavigation {
        target: String,
        displayed: Option<String>,
    },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
