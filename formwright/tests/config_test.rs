use formwright::{AmbiguityPolicy, AutomationError, EngineConfig};
use std::io::Write;
use std::time::Duration;

#[test]
fn defaults_are_bounded() {
    let config = EngineConfig::default();
    assert_eq!(config.control_timeout(), Duration::from_secs(3));
    assert_eq!(config.lookup_scroll_iterations, 10);
    assert_eq!(config.ambiguity, AmbiguityPolicy::FirstMatch);
    assert!(config.verify_after_set);
    assert!(config.calendar_max_hops > 0);
}

#[test]
fn partial_json_keeps_remaining_defaults() -> anyhow::Result<()> {
    let config = EngineConfig::from_json_str(
        r#"{ "control_timeout_ms": 750, "ambiguity": "strict", "confirm_button_names": ["Save"] }"#,
    )?;
    assert_eq!(config.control_timeout(), Duration::from_millis(750));
    assert_eq!(config.ambiguity, AmbiguityPolicy::Strict);
    assert_eq!(config.confirm_button_names, vec!["Save".to_string()]);
    assert_eq!(config.dismiss_key, "Escape");
    Ok(())
}

#[test]
fn config_loads_from_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{ "lookup_scroll_iterations": 4, "escalation_key": "F4" }}"#)?;
    file.flush()?;
    let config = EngineConfig::from_json_file(file.path())?;
    assert_eq!(config.lookup_scroll_iterations, 4);
    assert_eq!(config.escalation_key, "F4");
    Ok(())
}

#[test]
fn bad_config_is_an_invalid_argument() {
    let err = EngineConfig::from_json_str(r#"{ "poll_interval_ms": "fast" }"#).unwrap_err();
    assert!(matches!(err, AutomationError::InvalidArgument(_)));

    let err = EngineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, AutomationError::InvalidArgument(_)));
}
