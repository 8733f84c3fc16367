//! Lazy expansion of a recurrence rule into occurrence start dates.
//!
//! [`generate`] is a pure function of the rule and the anchor: the returned
//! [`Occurrences`] iterator owns copies of its inputs and can be recreated at
//! any time to restart the sequence. Work is proportional to the number of
//! dates pulled, so callers cap unbounded series with `take(n)`.
//!
//! The sequence is strictly increasing. Dates before the anchor are never
//! produced, and every date keeps the anchor's time of day.

use std::collections::VecDeque;

use chrono::Weekday;

use crate::date::{days_in_month, nth_weekday_of_month, CalendarDate};
use crate::error::Result;
use crate::rule::{RecurrenceRule, Termination};
use crate::weekday::WeekdaySet;

const SECONDS_PER_DAY: i64 = 86_400;

/// A rule with every selector resolved against an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Daily,
    Weekly { days: WeekdaySet },
    MonthlyByDay { day: u32 },
    /// `week` 5 means the last such weekday of the month.
    MonthlyByWeekday { weekday: Weekday, week: u32 },
    YearlyByDay { month: u32, day: u32 },
    YearlyByWeekday { month: u32, weekday: Weekday, week: u32 },
}

/// Expand `rule` into occurrence dates starting at `anchor`.
///
/// # Errors
/// Returns `InvalidCondition` if the rule's selectors can never match
/// (see [`RecurrenceRule::pattern`]).
pub fn generate(rule: &RecurrenceRule, anchor: CalendarDate) -> Result<Occurrences> {
    let pattern = rule.pattern(anchor)?;
    Ok(Occurrences::new(
        pattern,
        rule.interval(),
        rule.week_start(),
        rule.termination(),
        anchor,
    ))
}

/// Iterator over the start dates of a series.
#[derive(Debug, Clone)]
pub struct Occurrences {
    pattern: Pattern,
    interval: i64,
    week_start: Weekday,
    termination: Termination,
    anchor: CalendarDate,
    /// Seconds of the anchor's week start (may precede `CalendarDate::MIN`).
    week_origin: i64,
    period: i64,
    pending: VecDeque<CalendarDate>,
    emitted: u32,
    exhausted: bool,
}

impl Occurrences {
    pub fn new(
        pattern: Pattern,
        interval: u32,
        week_start: Weekday,
        termination: Termination,
        anchor: CalendarDate,
    ) -> Self {
        let back = (anchor.weekday().num_days_from_monday() + 7
            - week_start.num_days_from_monday())
            % 7;
        Self {
            pattern,
            interval: i64::from(interval.max(1)),
            week_start,
            termination,
            anchor,
            week_origin: anchor.to_seconds() - i64::from(back) * SECONDS_PER_DAY,
            period: 0,
            pending: VecDeque::new(),
            emitted: 0,
            // An empty weekly set would otherwise scan forever.
            exhausted: matches!(pattern, Pattern::Weekly { days } if days.is_empty()),
        }
    }

    /// Queue the candidates of the next period. Marks the iterator exhausted
    /// once a period runs past the end of the representable range.
    fn fill_period(&mut self) {
        let step = self.period * self.interval;
        self.period += 1;
        let anchor = self.anchor;

        match self.pattern {
            Pattern::Daily => match anchor.add_days(step) {
                Ok(date) => self.pending.push_back(date),
                Err(_) => self.exhausted = true,
            },
            Pattern::Weekly { days } => {
                let week = self.week_origin + step * 7 * SECONDS_PER_DAY;
                let first = self.week_start.num_days_from_monday();
                for day in days.iter_from(self.week_start) {
                    let offset = (day.num_days_from_monday() + 7 - first) % 7;
                    let seconds = week + i64::from(offset) * SECONDS_PER_DAY;
                    if seconds < anchor.to_seconds() {
                        continue;
                    }
                    match CalendarDate::from_seconds(seconds) {
                        Ok(date) => self.pending.push_back(date),
                        Err(_) => {
                            self.exhausted = true;
                            break;
                        }
                    }
                }
            }
            Pattern::MonthlyByDay { day } => {
                let Some((year, month)) = shift_month(anchor, step) else {
                    self.exhausted = true;
                    return;
                };
                self.push_day(year, month, day);
            }
            Pattern::MonthlyByWeekday { weekday, week } => {
                let Some((year, month)) = shift_month(anchor, step) else {
                    self.exhausted = true;
                    return;
                };
                self.push_nth(year, month, weekday, week);
            }
            Pattern::YearlyByDay { month, day } => {
                let year = i64::from(anchor.year()) + step;
                if year > 9999 {
                    self.exhausted = true;
                    return;
                }
                self.push_day(year as i32, month, day);
            }
            Pattern::YearlyByWeekday {
                month,
                weekday,
                week,
            } => {
                let year = i64::from(anchor.year()) + step;
                if year > 9999 {
                    self.exhausted = true;
                    return;
                }
                self.push_nth(year as i32, month, weekday, week);
            }
        }
    }

    /// A month shorter than `day` contributes nothing; the date is never moved.
    fn push_day(&mut self, year: i32, month: u32, day: u32) {
        let fits = days_in_month(year, month).is_ok_and(|len| day <= u32::from(len));
        if !fits {
            return;
        }
        let anchor = self.anchor;
        if let Ok(date) = CalendarDate::from_components(
            year,
            month,
            day,
            anchor.hour(),
            anchor.minute(),
            anchor.second(),
        ) {
            self.push_if_not_before_anchor(date);
        }
    }

    fn push_nth(&mut self, year: i32, month: u32, weekday: Weekday, week: u32) {
        let anchor = self.anchor;
        let date = nth_weekday_of_month(year, month, weekday, week)
            .and_then(|d| d.with_time(anchor.hour(), anchor.minute(), anchor.second()));
        if let Ok(date) = date {
            self.push_if_not_before_anchor(date);
        }
    }

    fn push_if_not_before_anchor(&mut self, date: CalendarDate) {
        if date >= self.anchor {
            self.pending.push_back(date);
        }
    }
}

fn shift_month(anchor: CalendarDate, months: i64) -> Option<(i32, u32)> {
    let index = i64::from(anchor.year()) * 12 + i64::from(anchor.month()) - 1 + months;
    let year = index.div_euclid(12);
    if year > 9999 {
        return None;
    }
    Some((year as i32, index.rem_euclid(12) as u32 + 1))
}

impl Iterator for Occurrences {
    type Item = CalendarDate;

    fn next(&mut self) -> Option<CalendarDate> {
        if let Termination::Count(n) = self.termination {
            if self.emitted >= n {
                return None;
            }
        }
        loop {
            if let Some(candidate) = self.pending.pop_front() {
                if let Termination::Until(until) = self.termination {
                    if candidate > until {
                        self.pending.clear();
                        self.exhausted = true;
                        return None;
                    }
                }
                self.emitted += 1;
                return Some(candidate);
            }
            if self.exhausted {
                return None;
            }
            self.fill_period();
        }
    }
}

impl std::iter::FusedIterator for Occurrences {}
