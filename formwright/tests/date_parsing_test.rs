use chrono::NaiveDate;
use formwright::{parse_date, AutomationError, DateInput};

#[test]
fn accepted_layouts_agree() -> anyhow::Result<()> {
    let expected = NaiveDate::from_ymd_opt(1990, 10, 23).expect("valid date");
    assert_eq!(parse_date("23/10/1990")?, expected);
    assert_eq!(parse_date("1990-10-23")?, expected);
    assert_eq!(DateInput::from(expected).resolve()?, expected);
    assert_eq!(DateInput::from("23/10/1990").to_string(), "23/10/1990");
    assert_eq!(DateInput::from(expected).to_string(), "1990-10-23");
    Ok(())
}

#[test]
fn other_layouts_are_rejected() {
    for input in ["1990/10/23", "23-10-1990", "Oct 23, 1990", "29/02/2023"] {
        match parse_date(input) {
            Err(AutomationError::UnparsableDate { input: reported }) => assert_eq!(reported, input),
            other => panic!("{input:?} gave {other:?}"),
        }
    }
}
