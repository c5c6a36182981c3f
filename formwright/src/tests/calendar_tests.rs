use super::mock_page::{DialogCommit, DialogSetup, HeadingStyle, MockField, ESCALATION_KEY};
use super::{form_with, form_with_config};
use crate::calendar::{heading_shows, plan_hops, CalendarCursor, HopDirection};
use crate::{parse_date, AutomationError, CommitPath, DateInput, EngineConfig, Selector};
use chrono::NaiveDate;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_both_layouts_parse_to_the_same_date() {
    assert_eq!(parse_date("23/10/1990").unwrap(), ymd(1990, 10, 23));
    assert_eq!(parse_date("1990-10-23").unwrap(), ymd(1990, 10, 23));
    assert_eq!(parse_date(" 01/02/2024 ").unwrap(), ymd(2024, 2, 1));
}

#[test]
fn test_unparsable_dates() {
    for input in ["10/23/1990", "23.10.1990", "31/02/2024", "", "tomorrow"] {
        let err = parse_date(input).unwrap_err();
        assert!(
            matches!(err, AutomationError::UnparsableDate { .. }),
            "{input:?} should not parse"
        );
    }
}

#[test]
fn test_heading_parsing() {
    assert_eq!(
        CalendarCursor::parse("January 2024"),
        Some(CalendarCursor { year: 2024, month: 1 })
    );
    assert_eq!(
        CalendarCursor::parse("Sep. 2025"),
        Some(CalendarCursor { year: 2025, month: 9 })
    );
    assert_eq!(
        CalendarCursor::parse("Calendar, March 2023"),
        Some(CalendarCursor { year: 2023, month: 3 })
    );
    assert_eq!(CalendarCursor::parse("Pick a date"), None);
    assert!(heading_shows("March 2024", ymd(2024, 3, 15)));
    assert!(heading_shows("mar 2024", ymd(2024, 3, 1)));
    assert!(!heading_shows("March 2023", ymd(2024, 3, 1)));
}

#[test]
fn test_hop_plans() {
    let jan = Some(CalendarCursor { year: 2024, month: 1 });

    let plan = plan_hops(jan, ymd(2024, 3, 15), 3, 240);
    assert_eq!(plan.direction, HopDirection::Forward);
    assert_eq!(plan.budget, 5);

    let plan = plan_hops(jan, ymd(2023, 11, 2), 3, 240);
    assert_eq!(plan.direction, HopDirection::Backward);
    assert_eq!(plan.budget, 5);

    let plan = plan_hops(jan, ymd(2024, 1, 20), 3, 240);
    assert_eq!(plan.budget, 3);

    let plan = plan_hops(None, ymd(2024, 1, 20), 3, 240);
    assert_eq!(plan.direction, HopDirection::Forward);
    assert_eq!(plan.budget, 240);
}

#[test]
fn test_date_input_deserializes_both_shapes() {
    let structured: DateInput = serde_json::from_str("\"1990-10-23\"").unwrap();
    let text: DateInput = serde_json::from_str("\"23/10/1990\"").unwrap();
    assert_eq!(structured.resolve().unwrap(), text.resolve().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_navigates_forward_by_month_difference() {
    let (page, form) = form_with(vec![MockField::date("Birthday", (2024, 1))]);
    let result = form.set_date("Birthday", "15/03/2024").await.unwrap();
    assert_eq!(result.path, CommitPath::Calendar);
    assert_eq!(result.value, "15/03/2024");
    assert_eq!(page.field_value("Birthday"), "15/03/2024");
    let counters = page.counters();
    assert_eq!(counters.forward_hops, 2);
    assert_eq!(counters.backward_hops, 0);
}

#[tokio::test(start_paused = true)]
async fn test_navigates_backward_by_month_difference() {
    let (page, form) = form_with(vec![MockField::date("Birthday", (2024, 1))]);
    form.set_date("Birthday", "2023-11-02").await.unwrap();
    assert_eq!(page.field_value("Birthday"), "02/11/2023");
    let counters = page.counters();
    assert_eq!(counters.forward_hops, 0);
    assert_eq!(counters.backward_hops, 2);
}

#[tokio::test(start_paused = true)]
async fn test_date_round_trip() {
    let (page, form) = form_with(vec![
        MockField::date("Birthday", (1990, 10)),
        MockField::date("Anniversary", (1990, 10)).date_setup(|s| s.display_iso = true),
    ]);
    form.set_date("Birthday", "23/10/1990").await.unwrap();
    form.set_date("Anniversary", "1990-10-23").await.unwrap();

    let birthday = parse_date(&form.read_field("Birthday").await.unwrap()).unwrap();
    let anniversary = parse_date(&form.read_field("Anniversary").await.unwrap()).unwrap();
    assert_eq!(birthday, ymd(1990, 10, 23));
    assert_eq!(birthday, anniversary);
    assert_eq!(page.counters().forward_hops + page.counters().backward_hops, 0);
}

#[tokio::test(start_paused = true)]
async fn test_structured_date_input() {
    let (page, form) = form_with(vec![MockField::date("Due Date", (2024, 6))]);
    form.set_date("Due Date", ymd(2024, 7, 31)).await.unwrap();
    assert_eq!(page.field_value("Due Date"), "31/07/2024");
}

#[tokio::test(start_paused = true)]
async fn test_abbreviated_heading_and_keyboard_navigation() {
    let (page, form) = form_with(vec![MockField::date("Start", (2024, 1)).date_setup(|s| {
        s.heading = HeadingStyle::Short;
        s.nav_buttons = false;
        s.trigger_button = false;
    })]);
    form.set_date("Start", "01/04/2024").await.unwrap();
    assert_eq!(page.field_value("Start"), "01/04/2024");
    let counters = page.counters();
    assert_eq!(counters.key_hops, 3);
    assert_eq!(counters.forward_hops, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_heading_is_bounded() {
    let config = EngineConfig {
        calendar_max_hops: 6,
        ..EngineConfig::default()
    };
    let (page, form) = form_with_config(
        vec![MockField::date("Start", (2024, 1)).date_setup(|s| s.heading = HeadingStyle::Garbled)],
        config,
    );
    let err = form.set_date("Start", "01/04/2024").await.unwrap_err();
    assert!(matches!(err, AutomationError::CalendarNavigation { .. }));
    assert_eq!(page.counters().forward_hops, 6);
    assert_eq!(page.field_value("Start"), "");
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_date_never_touches_the_page() {
    let (page, form) = form_with(vec![MockField::date("Start", (2024, 1))]);
    let err = form.set_date("Start", "2024/13/45").await.unwrap_err();
    assert!(matches!(err, AutomationError::UnparsableDate { ref input } if input == "2024/13/45"));
    let counters = page.counters();
    assert_eq!(counters.forward_hops + counters.backward_hops + counters.key_hops, 0);
}

#[tokio::test(start_paused = true)]
async fn test_days_from_adjacent_months_are_skipped() {
    // August 2024 starts on a Thursday: the grid opens with July 29-31 and ends with September 1.
    let (page, form) = form_with(vec![
        MockField::date("Close Date", (2024, 8)).date_setup(|s| s.adjacent_days = true)
    ]);

    form.set_date("Close Date", "31/08/2024").await.unwrap();
    assert_eq!(page.field_value("Close Date"), "31/08/2024");

    form.set_date("Close Date", "01/08/2024").await.unwrap();
    assert_eq!(page.field_value("Close Date"), "01/08/2024");
}

#[tokio::test(start_paused = true)]
async fn test_calendar_popup_is_told_apart_from_other_dialogs() {
    let (page, form) = form_with(vec![
        MockField::lookup("Parent Account", &["Contoso"]).lookup_setup(|s| {
            s.dialog = Some(DialogSetup {
                records: vec!["Contoso".to_string()],
                search_box: true,
                commit: DialogCommit::DoubleClick,
            });
        }),
        MockField::date("Due Date", (2024, 6)),
    ]);

    // Leave a lookup picker open in front of the form.
    let lookup = form
        .page_locator("role:combobox|name:Parent Account")
        .wait(None)
        .await
        .unwrap();
    lookup.press_key(ESCALATION_KEY).await.unwrap();
    form.page_locator(Selector::role("dialog"))
        .wait(None)
        .await
        .unwrap();

    form.set_date("Due Date", "15/06/2024").await.unwrap();
    assert_eq!(page.field_value("Due Date"), "15/06/2024");
    assert!(page.dialog_open());
}
