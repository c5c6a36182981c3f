use super::form_with;
use super::mock_page::MockField;
use crate::{AutomationError, Selector};
use std::time::Duration;

#[test]
fn test_selector_parsing() {
    assert_eq!(Selector::from("button"), Selector::role("button"));
    assert_eq!(Selector::from("role:listbox"), Selector::role("listbox"));

    match Selector::from("role:option|name:Jane Doe") {
        Selector::Role { role, name } => {
            assert_eq!(role, "option");
            let name = name.expect("name pattern");
            assert!(name.is_match("jane doe"));
            assert!(!name.is_match("Jane Doe Jr"));
        }
        other => panic!("unexpected selector {other:?}"),
    }

    match Selector::from("role:dialog >> role:row") {
        Selector::Chain(parts) => {
            assert_eq!(parts.len(), 2);
            assert_eq!(parts[0], Selector::role("dialog"));
            assert_eq!(parts[1], Selector::role("row"));
        }
        other => panic!("unexpected selector {other:?}"),
    }

    assert!(matches!(Selector::from("xpath://div"), Selector::Invalid(_)));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_selector_is_rejected() {
    let (_page, form) = form_with(vec![MockField::text("Name")]);
    let err = form
        .page_locator("xpath://input")
        .all()
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::InvalidSelector(_)));
}

#[tokio::test(start_paused = true)]
async fn test_locator_wait_times_out() {
    let (_page, form) = form_with(vec![MockField::text("Name")]);
    let err = form
        .page_locator(Selector::role("dialog"))
        .wait(Some(Duration::from_millis(300)))
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::Timeout(_)));

    let probed = form
        .page_locator(Selector::role("dialog"))
        .probe(Duration::from_millis(300))
        .await
        .unwrap();
    assert!(probed.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_locator_skips_hidden_elements() {
    let (_page, form) = form_with(vec![
        MockField::text("Name").hidden(),
        MockField::text("Name"),
    ]);
    let all = form.page_locator(Selector::role("textbox")).all().await.unwrap();
    assert_eq!(all.len(), 2);
    let visible = form
        .page_locator(Selector::role("textbox"))
        .visible_now()
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scoped_locator() {
    let (_page, form) = form_with(vec![MockField::option_set("Status", &["Active", "Inactive"])]);
    let control = form
        .page_locator("role:combobox|name:Status")
        .wait(None)
        .await
        .unwrap();
    control.click().await.unwrap();

    let listbox = form
        .page_locator(Selector::role("listbox"))
        .wait(None)
        .await
        .unwrap();
    let options = form
        .page_locator(Selector::role("option"))
        .within(listbox.clone())
        .all()
        .await
        .unwrap();
    assert_eq!(options.len(), 2);

    let chained = form
        .page_locator("role:listbox >> role:option|name:inactive")
        .all()
        .await
        .unwrap();
    assert_eq!(chained.len(), 1);
    assert_eq!(chained[0].name_or_empty(), "Inactive");

    // Nothing of role option lives under the control itself.
    let under_control = form
        .page_locator(Selector::role("option"))
        .within(control)
        .all()
        .await
        .unwrap();
    assert!(under_control.is_empty());
}
