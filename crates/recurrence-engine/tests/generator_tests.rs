//! Tests for lazy occurrence generation.

use chrono::Weekday;
use recurrence_engine::{generate, CalendarDate, Frequency, RecurrenceRule, WeekdaySet};

fn date(s: &str) -> CalendarDate {
    s.parse().expect("valid date literal")
}

fn dates(list: &[&str]) -> Vec<CalendarDate> {
    list.iter().map(|s| date(s)).collect()
}

fn expand(rule: &RecurrenceRule, anchor: &str) -> Vec<CalendarDate> {
    generate(rule, date(anchor))
        .expect("rule should resolve")
        .collect()
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

#[test]
fn daily_count_ten() {
    let mut rule = RecurrenceRule::new(Frequency::Daily);
    rule.set_count(10);
    let result = expand(&rule, "2024-01-01T09:00:00");

    assert_eq!(result.len(), 10);
    for (i, d) in result.iter().enumerate() {
        assert_eq!(*d, CalendarDate::from_components(2024, 1, 1 + i as u32, 9, 0, 0).unwrap());
    }
}

#[test]
fn daily_interval_crosses_leap_day() {
    let mut rule = RecurrenceRule::new(Frequency::Daily);
    rule.set_interval(3).unwrap();
    rule.set_count(4);
    assert_eq!(
        expand(&rule, "2024-02-27T18:00:00"),
        dates(&[
            "2024-02-27T18:00:00",
            "2024-03-01T18:00:00",
            "2024-03-04T18:00:00",
            "2024-03-07T18:00:00",
        ])
    );
}

#[test]
fn until_is_inclusive() {
    let mut rule = RecurrenceRule::new(Frequency::Daily);
    rule.set_until(date("2024-01-03T09:00:00"));
    assert_eq!(
        expand(&rule, "2024-01-01T09:00:00"),
        dates(&["2024-01-01T09:00:00", "2024-01-02T09:00:00", "2024-01-03T09:00:00"])
    );
}

#[test]
fn count_zero_is_empty() {
    let mut rule = RecurrenceRule::new(Frequency::Daily);
    rule.set_count(0);
    assert!(expand(&rule, "2024-01-01").is_empty());
}

// ---------------------------------------------------------------------------
// Weekly
// ---------------------------------------------------------------------------

#[test]
fn biweekly_tue_thu_until_march() {
    let mut rule = RecurrenceRule::new(Frequency::Weekly);
    rule.set_interval(2).unwrap();
    rule.set_day_of_week(WeekdaySet::TUESDAY | WeekdaySet::THURSDAY)
        .unwrap();
    rule.set_until(date("2024-03-01"));

    // Weeks of Jan 1, Jan 15, Jan 29, Feb 12 and Feb 26 are included.
    assert_eq!(
        expand(&rule, "2024-01-02T10:00:00"),
        dates(&[
            "2024-01-02T10:00:00",
            "2024-01-04T10:00:00",
            "2024-01-16T10:00:00",
            "2024-01-18T10:00:00",
            "2024-01-30T10:00:00",
            "2024-02-01T10:00:00",
            "2024-02-13T10:00:00",
            "2024-02-15T10:00:00",
            "2024-02-27T10:00:00",
            "2024-02-29T10:00:00",
        ])
    );
}

#[test]
fn week_start_changes_biweekly_grouping() {
    // 1997-08-05 is a Tuesday.
    let mut rule = RecurrenceRule::new(Frequency::Weekly);
    rule.set_interval(2).unwrap();
    rule.set_weekdays([Weekday::Tue, Weekday::Sun].into_iter().collect())
        .unwrap();
    rule.set_count(4);

    assert_eq!(
        expand(&rule, "1997-08-05T09:00:00"),
        dates(&[
            "1997-08-05T09:00:00",
            "1997-08-10T09:00:00",
            "1997-08-19T09:00:00",
            "1997-08-24T09:00:00",
        ])
    );

    rule.set_week_start(Weekday::Sun);
    assert_eq!(
        expand(&rule, "1997-08-05T09:00:00"),
        dates(&[
            "1997-08-05T09:00:00",
            "1997-08-17T09:00:00",
            "1997-08-19T09:00:00",
            "1997-08-31T09:00:00",
        ])
    );
}

#[test]
fn weekly_skips_days_before_anchor_in_first_week() {
    let mut rule = RecurrenceRule::new(Frequency::Weekly);
    rule.set_day_of_week(WeekdaySet::MONDAY | WeekdaySet::FRIDAY)
        .unwrap();
    rule.set_count(3);
    // 2024-01-03 is a Wednesday; Monday Jan 1 is before the anchor.
    assert_eq!(
        expand(&rule, "2024-01-03T12:00:00"),
        dates(&["2024-01-05T12:00:00", "2024-01-08T12:00:00", "2024-01-12T12:00:00"])
    );
}

#[test]
fn weekly_defaults_to_anchor_weekday() {
    let mut rule = RecurrenceRule::new(Frequency::Weekly);
    rule.set_count(3);
    assert_eq!(
        expand(&rule, "2024-01-03"),
        dates(&["2024-01-03", "2024-01-10", "2024-01-17"])
    );
}

// ---------------------------------------------------------------------------
// Monthly
// ---------------------------------------------------------------------------

#[test]
fn first_thursday_ten_months() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_week_start(Weekday::Mon);
    rule.set_weekday(Weekday::Thu).unwrap();
    rule.set_week_of_month(1).unwrap();
    rule.set_count(10);

    assert_eq!(
        expand(&rule, "2024-01-04T15:00:00"),
        dates(&[
            "2024-01-04T15:00:00",
            "2024-02-01T15:00:00",
            "2024-03-07T15:00:00",
            "2024-04-04T15:00:00",
            "2024-05-02T15:00:00",
            "2024-06-06T15:00:00",
            "2024-07-04T15:00:00",
            "2024-08-01T15:00:00",
            "2024-09-05T15:00:00",
            "2024-10-03T15:00:00",
        ])
    );
}

#[test]
fn last_friday_of_month() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_weekday(Weekday::Fri).unwrap();
    rule.set_week_of_month(5).unwrap();
    rule.set_count(3);
    assert_eq!(
        expand(&rule, "2024-01-01"),
        dates(&["2024-01-26", "2024-02-23", "2024-03-29"])
    );
}

#[test]
fn day_31_skips_short_months() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_day_of_month(31).unwrap();
    rule.set_count(7);
    let result = expand(&rule, "2024-01-31");
    assert_eq!(
        result,
        dates(&[
            "2024-01-31",
            "2024-03-31",
            "2024-05-31",
            "2024-07-31",
            "2024-08-31",
            "2024-10-31",
            "2024-12-31",
        ])
    );
    for d in &result {
        assert!(![2, 4, 6, 9, 11].contains(&d.month()), "{d}");
    }
}

#[test]
fn monthly_interval_steps_from_anchor_month() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.set_interval(5).unwrap();
    rule.set_day_of_month(30).unwrap();
    rule.set_count(3);
    // Jan, Jun, Nov 2024, then Apr 2025.
    assert_eq!(
        expand(&rule, "2024-01-30"),
        dates(&["2024-01-30", "2024-06-30", "2024-11-30"])
    );
}

// ---------------------------------------------------------------------------
// Yearly
// ---------------------------------------------------------------------------

#[test]
fn leap_day_only_in_leap_years() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_month_of_year(2).unwrap();
    rule.set_day_of_month(29).unwrap();
    rule.set_count(3);
    assert_eq!(
        expand(&rule, "2024-02-29"),
        dates(&["2024-02-29", "2028-02-29", "2032-02-29"])
    );

    // 2100 is not a leap year.
    assert_eq!(
        expand(&rule, "2096-02-29"),
        dates(&["2096-02-29", "2104-02-29", "2108-02-29"])
    );
}

#[test]
fn fourth_thursday_of_november() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_month_of_year(11).unwrap();
    rule.set_weekday(Weekday::Thu).unwrap();
    rule.set_week_of_month(4).unwrap();
    rule.set_count(3);
    assert_eq!(
        expand(&rule, "2024-01-01T18:00:00"),
        dates(&["2024-11-28T18:00:00", "2025-11-27T18:00:00", "2026-11-26T18:00:00"])
    );
}

#[test]
fn yearly_anchor_after_target_month_starts_next_year() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_month_of_year(3).unwrap();
    rule.set_day_of_month(1).unwrap();
    rule.set_count(2);
    assert_eq!(expand(&rule, "2024-06-01"), dates(&["2025-03-01", "2026-03-01"]));
}

// ---------------------------------------------------------------------------
// Laziness and range end
// ---------------------------------------------------------------------------

#[test]
fn unbounded_series_is_lazy() {
    let mut rule = RecurrenceRule::new(Frequency::Daily);
    rule.set_until(CalendarDate::MAX);
    assert!(rule.is_unbounded());

    let first: Vec<CalendarDate> = generate(&rule, date("2024-01-01")).unwrap().take(3).collect();
    assert_eq!(first, dates(&["2024-01-01", "2024-01-02", "2024-01-03"]));
}

#[test]
fn generation_stops_at_end_of_range() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.set_until(CalendarDate::MAX);
    let result = expand(&rule, "9997-06-15");
    assert_eq!(result, dates(&["9997-06-15", "9998-06-15", "9999-06-15"]));
}

#[test]
fn restartable_and_deterministic() {
    let mut rule = RecurrenceRule::new(Frequency::Weekly);
    rule.set_day_of_week(WeekdaySet::MONDAY | WeekdaySet::WEDNESDAY | WeekdaySet::FRIDAY)
        .unwrap();
    rule.set_count(20);
    let occurrences = generate(&rule, date("2024-05-06")).unwrap();
    let copy = occurrences.clone();
    let a: Vec<CalendarDate> = occurrences.collect();
    let b: Vec<CalendarDate> = copy.collect();
    assert_eq!(a, b);
    assert_eq!(a, expand(&rule, "2024-05-06"));
}
