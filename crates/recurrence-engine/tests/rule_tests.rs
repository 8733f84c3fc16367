//! Tests for recurrence rule setters and their validation.

use chrono::Weekday;
use recurrence_engine::generator::Pattern;
use recurrence_engine::{
    CalendarDate, DayOfWeek, ErrorKind, Frequency, RecurrenceRule, Termination, WeekdaySet,
};

fn date(s: &str) -> CalendarDate {
    s.parse().expect("valid date literal")
}

#[test]
fn defaults() {
    let rule = RecurrenceRule::default();
    assert_eq!(rule.frequency(), Frequency::Daily);
    assert_eq!(rule.interval(), 1);
    assert_eq!(rule.termination(), Termination::Count(1));
    assert_eq!(rule.week_start(), Weekday::Mon);
    assert_eq!(rule.day_of_week(), None);
    assert_eq!(rule.day_of_month(), None);
    assert_eq!(rule.week_of_month(), None);
    assert_eq!(rule.month_of_year(), None);
}

#[test]
fn interval_range() {
    let mut rule = RecurrenceRule::default();
    assert_eq!(rule.set_interval(0).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(rule.set_interval(256).unwrap_err().kind(), ErrorKind::OutOfRange);
    rule.set_interval(255).unwrap();
    assert_eq!(rule.interval(), 255);
}

#[test]
fn count_and_until_are_exclusive() {
    let mut rule = RecurrenceRule::default();
    rule.set_until(date("2024-03-01"));
    assert_eq!(rule.until(), Some(date("2024-03-01")));
    assert_eq!(rule.count(), None);

    rule.set_count(5);
    assert_eq!(rule.count(), Some(5));
    assert_eq!(rule.until(), None);
}

#[test]
fn selectors_rejected_for_wrong_frequency() {
    let mut daily = RecurrenceRule::new(Frequency::Daily);
    assert_eq!(
        daily.set_day_of_week(WeekdaySet::MONDAY).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    assert_eq!(daily.set_day_of_month(3).unwrap_err().kind(), ErrorKind::TypeMismatch);

    let mut weekly = RecurrenceRule::new(Frequency::Weekly);
    assert_eq!(weekly.set_day_of_month(3).unwrap_err().kind(), ErrorKind::TypeMismatch);
    assert_eq!(weekly.set_week_of_month(1).unwrap_err().kind(), ErrorKind::TypeMismatch);

    let mut monthly = RecurrenceRule::new(Frequency::Monthly);
    assert_eq!(
        monthly.set_month_of_year(2).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn numeric_selector_ranges() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    assert_eq!(rule.set_day_of_month(0).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(rule.set_day_of_month(32).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(rule.set_week_of_month(6).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(rule.set_month_of_year(13).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(rule.set_month_of_year(0).unwrap_err().kind(), ErrorKind::OutOfRange);
}

#[test]
fn weekday_mask_validation() {
    let mut weekly = RecurrenceRule::new(Frequency::Weekly);
    assert_eq!(weekly.set_day_of_week(0x80).unwrap_err().kind(), ErrorKind::InvalidArg);
    assert_eq!(weekly.set_day_of_week(0).unwrap_err().kind(), ErrorKind::InvalidArg);
    weekly
        .set_day_of_week(WeekdaySet::TUESDAY | WeekdaySet::THURSDAY)
        .unwrap();
    let expected: WeekdaySet = [Weekday::Tue, Weekday::Thu].into_iter().collect();
    assert_eq!(weekly.day_of_week(), Some(DayOfWeek::Days(expected)));

    let mut monthly = RecurrenceRule::new(Frequency::Monthly);
    let err = monthly
        .set_day_of_week(WeekdaySet::TUESDAY | WeekdaySet::THURSDAY)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArg);
    monthly.set_day_of_week(WeekdaySet::THURSDAY).unwrap();
    assert_eq!(monthly.day_of_week(), Some(DayOfWeek::Day(Weekday::Thu)));
}

#[test]
fn failed_setter_leaves_rule_unchanged() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_day_of_month(15).unwrap();
    let before = rule.clone();
    assert!(rule.set_day_of_week(0xff).is_err());
    assert!(rule.set_week_of_month(9).is_err());
    assert!(rule.set_interval(1000).is_err());
    assert_eq!(rule, before);
}

#[test]
fn day_of_week_clears_day_of_month() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_day_of_month(15).unwrap();
    rule.set_weekday(Weekday::Mon).unwrap();
    assert_eq!(rule.day_of_month(), None);
    assert_eq!(rule.day_of_week(), Some(DayOfWeek::Day(Weekday::Mon)));
}

#[test]
fn day_of_month_clears_weekday_selectors() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_weekday(Weekday::Thu).unwrap();
    rule.set_week_of_month(4).unwrap();
    rule.set_day_of_month(1).unwrap();
    assert_eq!(rule.day_of_week(), None);
    assert_eq!(rule.week_of_month(), None);
    assert_eq!(rule.day_of_month(), Some(1));
}

#[test]
fn frequency_change_resets_selectors() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_month_of_year(11).unwrap();
    rule.set_weekday(Weekday::Thu).unwrap();
    rule.set_interval(2).unwrap();
    rule.set_frequency(Frequency::Weekly);
    assert_eq!(rule.month_of_year(), None);
    assert_eq!(rule.day_of_week(), None);
    assert_eq!(rule.interval(), 2);
}

// ---------------------------------------------------------------------------
// Pattern resolution against an anchor
// ---------------------------------------------------------------------------

#[test]
fn unset_selectors_come_from_anchor() {
    // 2024-01-18 is the third Thursday of January.
    let anchor = date("2024-01-18T09:00:00");

    let weekly = RecurrenceRule::new(Frequency::Weekly);
    assert_eq!(
        weekly.pattern(anchor).unwrap(),
        Pattern::Weekly {
            days: WeekdaySet::single(Weekday::Thu)
        }
    );

    let monthly = RecurrenceRule::new(Frequency::Monthly);
    assert_eq!(monthly.pattern(anchor).unwrap(), Pattern::MonthlyByDay { day: 18 });

    let mut nth = RecurrenceRule::new(Frequency::Monthly);
    nth.set_week_of_month(2).unwrap();
    assert_eq!(
        nth.pattern(anchor).unwrap(),
        Pattern::MonthlyByWeekday {
            weekday: Weekday::Thu,
            week: 2
        }
    );

    let yearly = RecurrenceRule::new(Frequency::Yearly);
    assert_eq!(
        yearly.pattern(anchor).unwrap(),
        Pattern::YearlyByDay { month: 1, day: 18 }
    );
}

#[test]
fn impossible_month_day_is_invalid_condition() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_month_of_year(2).unwrap();
    rule.set_day_of_month(30).unwrap();
    let err = rule.pattern(date("2024-01-01")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCondition);

    let mut leap = RecurrenceRule::new(Frequency::Yearly);
    leap.set_month_of_year(2).unwrap();
    leap.set_day_of_month(29).unwrap();
    assert!(leap.pattern(date("2024-01-01")).is_ok());
}

#[test]
fn first_on_or_after_searches_forward() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_day_of_month(15).unwrap();
    assert_eq!(
        rule.first_on_or_after(date("2024-01-20T08:30:00")).unwrap(),
        date("2024-02-15T08:30:00")
    );
    assert_eq!(
        rule.first_on_or_after(date("2024-01-15T08:30:00")).unwrap(),
        date("2024-01-15T08:30:00")
    );
}

#[test]
fn first_on_or_after_fails_when_nothing_matches() {
    // Every twelfth month from April is always April, which has no 31st.
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_interval(12).unwrap();
    rule.set_day_of_month(31).unwrap();
    let err = rule.first_on_or_after(date("2024-04-10")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCondition);
}

#[test]
fn serde_replays_validation() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_weekday(Weekday::Thu).unwrap();
    rule.set_week_of_month(1).unwrap();
    rule.set_count(10);

    let json = serde_json::to_string(&rule).unwrap();
    let back: RecurrenceRule = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rule);

    let bad = r#"{"frequency":"daily","interval":1,"termination":{"count":3},"week_start":"Mon","day_of_month":4}"#;
    assert!(serde_json::from_str::<RecurrenceRule>(bad).is_err());
}

#[test]
fn serde_fills_omitted_fields_with_defaults() {
    let json = r#"{"frequency":"weekly","day_of_week":20}"#;
    let rule: RecurrenceRule = serde_json::from_str(json).unwrap();
    assert_eq!(rule.interval(), 1);
    assert_eq!(rule.count(), Some(1));
    assert_eq!(rule.week_start(), Weekday::Mon);
    assert_eq!(
        rule.day_of_week().map(|d| d.to_set()),
        Some(WeekdaySet::from_bits(WeekdaySet::TUESDAY | WeekdaySet::THURSDAY).unwrap())
    );
}
