mod calendar_tests;
mod selector_tests;

use crate::{EngineConfig, Form};
use mock_page::{MockField, MockPage};
use std::sync::Arc;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_test_writer()
        .try_init();
}

/// A form over a fresh mock page with default settings.
pub fn form_with(fields: Vec<MockField>) -> (Arc<MockPage>, Form) {
    form_with_config(fields, EngineConfig::default())
}

pub fn form_with_config(fields: Vec<MockField>, config: EngineConfig) -> (Arc<MockPage>, Form) {
    init_tracing();
    let page = MockPage::arc(fields);
    let form = Form::with_config(page.clone(), config);
    (page, form)
}
