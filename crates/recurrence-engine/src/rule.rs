//! Recurrence rules: a validated description of a repeating pattern.
//!
//! Setters validate immediately and leave the rule untouched on failure.
//! Selectors that the current [`Frequency`] cannot use are rejected with
//! `TypeMismatch`, and selectors that exclude each other clear one another:
//! `day_of_month` versus the `day_of_week` + `week_of_month` pair.
//!
//! Selectors left unset are filled in from the anchor date when the rule is
//! expanded (see [`RecurrenceRule::pattern`]).

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::date::{days_in_month, CalendarDate};
use crate::error::{RecurrenceError, Result};
use crate::generator::{Occurrences, Pattern};
use crate::weekday::WeekdaySet;

pub const MAX_INTERVAL: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// How a series ends. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /// Stop after this many produced occurrences.
    Count(u32),
    /// Stop at the last occurrence starting on or before this date.
    Until(CalendarDate),
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Count(1)
    }
}

/// The weekday selector.
///
/// Weekly rules may name several days; monthly and yearly rules name exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    Days(WeekdaySet),
    Day(Weekday),
}

impl DayOfWeek {
    pub fn to_set(self) -> WeekdaySet {
        match self {
            DayOfWeek::Days(set) => set,
            DayOfWeek::Day(day) => WeekdaySet::single(day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleFields", into = "RuleFields")]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u8,
    termination: Termination,
    week_start: Weekday,
    day_of_week: Option<DayOfWeek>,
    day_of_month: Option<u8>,
    week_of_month: Option<u8>,
    month_of_year: Option<u8>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            frequency: Frequency::Daily,
            interval: 1,
            termination: Termination::default(),
            week_start: Weekday::Mon,
            day_of_week: None,
            day_of_month: None,
            week_of_month: None,
            month_of_year: None,
        }
    }
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        u32::from(self.interval)
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn count(&self) -> Option<u32> {
        match self.termination {
            Termination::Count(n) => Some(n),
            Termination::Until(_) => None,
        }
    }

    pub fn until(&self) -> Option<CalendarDate> {
        match self.termination {
            Termination::Until(date) => Some(date),
            Termination::Count(_) => None,
        }
    }

    /// True when the series only ends at the end of the representable range.
    pub fn is_unbounded(&self) -> bool {
        self.termination == Termination::Until(CalendarDate::MAX)
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn day_of_week(&self) -> Option<DayOfWeek> {
        self.day_of_week
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.day_of_month.map(u32::from)
    }

    pub fn week_of_month(&self) -> Option<u32> {
        self.week_of_month.map(u32::from)
    }

    pub fn month_of_year(&self) -> Option<u32> {
        self.month_of_year.map(u32::from)
    }

    /// Change the frequency and reset every selector.
    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
        self.day_of_week = None;
        self.day_of_month = None;
        self.week_of_month = None;
        self.month_of_year = None;
    }

    pub fn set_interval(&mut self, interval: u32) -> Result<()> {
        if !(1..=MAX_INTERVAL).contains(&interval) {
            return Err(RecurrenceError::OutOfRange(format!(
                "interval {} not in 1..={}",
                interval, MAX_INTERVAL
            )));
        }
        self.interval = interval as u8;
        Ok(())
    }

    /// End the series after `count` occurrences; clears any `until` date.
    pub fn set_count(&mut self, count: u32) {
        self.termination = Termination::Count(count);
    }

    /// End the series at `until`; clears any count.
    pub fn set_until(&mut self, until: CalendarDate) {
        self.termination = Termination::Until(until);
    }

    pub fn set_week_start(&mut self, day: Weekday) {
        self.week_start = day;
    }

    /// Set the weekday selector from a raw platform mask.
    ///
    /// # Errors
    /// - `TypeMismatch` for daily rules.
    /// - `InvalidArg` if the mask is empty, has bits outside the seven weekday
    ///   flags, or names more than one day for a monthly or yearly rule.
    pub fn set_day_of_week(&mut self, mask: u8) -> Result<()> {
        self.require(
            matches!(
                self.frequency,
                Frequency::Weekly | Frequency::Monthly | Frequency::Yearly
            ),
            "day_of_week",
        )?;
        let set = WeekdaySet::from_bits(mask)?;
        self.set_weekdays(set)
    }

    /// Typed form of [`RecurrenceRule::set_day_of_week`].
    pub fn set_weekdays(&mut self, set: WeekdaySet) -> Result<()> {
        self.require(
            matches!(
                self.frequency,
                Frequency::Weekly | Frequency::Monthly | Frequency::Yearly
            ),
            "day_of_week",
        )?;
        if set.is_empty() {
            return Err(RecurrenceError::InvalidArg(
                "day_of_week mask names no weekday".to_string(),
            ));
        }
        let selector = if self.frequency == Frequency::Weekly {
            DayOfWeek::Days(set)
        } else {
            let day = set.as_single().ok_or_else(|| {
                RecurrenceError::InvalidArg(format!(
                    "{:?} rules take a single weekday, got {:?}",
                    self.frequency, set
                ))
            })?;
            DayOfWeek::Day(day)
        };
        self.day_of_week = Some(selector);
        self.day_of_month = None;
        Ok(())
    }

    /// Select a single weekday.
    pub fn set_weekday(&mut self, day: Weekday) -> Result<()> {
        self.set_weekdays(WeekdaySet::single(day))
    }

    pub fn set_day_of_month(&mut self, day: u32) -> Result<()> {
        self.require(
            matches!(self.frequency, Frequency::Monthly | Frequency::Yearly),
            "day_of_month",
        )?;
        if !(1..=31).contains(&day) {
            return Err(RecurrenceError::OutOfRange(format!(
                "day of month {} not in 1..=31",
                day
            )));
        }
        self.day_of_month = Some(day as u8);
        self.day_of_week = None;
        self.week_of_month = None;
        Ok(())
    }

    /// Select the week of the month; 5 means the last week.
    pub fn set_week_of_month(&mut self, week: u32) -> Result<()> {
        self.require(
            matches!(self.frequency, Frequency::Monthly | Frequency::Yearly),
            "week_of_month",
        )?;
        if !(1..=5).contains(&week) {
            return Err(RecurrenceError::OutOfRange(format!(
                "week of month {} not in 1..=5",
                week
            )));
        }
        self.week_of_month = Some(week as u8);
        self.day_of_month = None;
        Ok(())
    }

    pub fn set_month_of_year(&mut self, month: u32) -> Result<()> {
        self.require(self.frequency == Frequency::Yearly, "month_of_year")?;
        if !(1..=12).contains(&month) {
            return Err(RecurrenceError::OutOfRange(format!(
                "month of year {} not in 1..=12",
                month
            )));
        }
        self.month_of_year = Some(month as u8);
        Ok(())
    }

    fn require(&self, supported: bool, field: &str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(RecurrenceError::TypeMismatch(format!(
                "{} is not valid for {:?} rules",
                field, self.frequency
            )))
        }
    }

    /// Resolve the concrete pattern for expansion from `anchor`.
    ///
    /// Unset selectors take the anchor's value: its weekday for weekly rules,
    /// its day of month for monthly rules, and its month for yearly rules.
    ///
    /// # Errors
    /// Returns `InvalidCondition` for a month/day pair that never exists,
    /// such as day 30 of February.
    pub fn pattern(&self, anchor: CalendarDate) -> Result<Pattern> {
        let pattern = match self.frequency {
            Frequency::Daily => Pattern::Daily,
            Frequency::Weekly => Pattern::Weekly {
                days: self
                    .day_of_week
                    .map(DayOfWeek::to_set)
                    .unwrap_or_else(|| WeekdaySet::single(anchor.weekday())),
            },
            Frequency::Monthly => match self.month_day(anchor) {
                MonthDay::Day(day) => Pattern::MonthlyByDay { day },
                MonthDay::Nth(weekday, week) => Pattern::MonthlyByWeekday { weekday, week },
            },
            Frequency::Yearly => {
                let month = self.month_of_year().unwrap_or_else(|| anchor.month());
                match self.month_day(anchor) {
                    MonthDay::Day(day) => {
                        // February is checked against its leap-year length.
                        let longest = days_in_month(2000, month)?;
                        if day > u32::from(longest) {
                            return Err(RecurrenceError::InvalidCondition(format!(
                                "month {} never has a day {}",
                                month, day
                            )));
                        }
                        Pattern::YearlyByDay { month, day }
                    }
                    MonthDay::Nth(weekday, week) => Pattern::YearlyByWeekday {
                        month,
                        weekday,
                        week,
                    },
                }
            }
        };
        Ok(pattern)
    }

    fn month_day(&self, anchor: CalendarDate) -> MonthDay {
        if let Some(day) = self.day_of_month() {
            return MonthDay::Day(day);
        }
        let weekday = self.day_of_week.map(|selector| match selector {
            DayOfWeek::Day(day) => day,
            DayOfWeek::Days(set) => set.as_single().unwrap_or_else(|| anchor.weekday()),
        });
        match (weekday, self.week_of_month()) {
            (None, None) => MonthDay::Day(anchor.day()),
            (weekday, week) => MonthDay::Nth(
                weekday.unwrap_or_else(|| anchor.weekday()),
                week.unwrap_or_else(|| anchor.week_of_month()),
            ),
        }
    }

    /// Lazily expand this rule from `anchor`; see [`crate::generator::generate`].
    pub fn occurrences(&self, anchor: CalendarDate) -> Result<Occurrences> {
        crate::generator::generate(self, anchor)
    }

    /// The first date matching this rule on or after `anchor`, ignoring termination.
    ///
    /// Searches forward only, keeping the anchor's time of day.
    ///
    /// # Errors
    /// Returns `InvalidCondition` if no matching date exists before the end of
    /// the representable range.
    pub fn first_on_or_after(&self, anchor: CalendarDate) -> Result<CalendarDate> {
        let mut unbounded = self.clone();
        unbounded.set_until(CalendarDate::MAX);
        unbounded.occurrences(anchor)?.next().ok_or_else(|| {
            RecurrenceError::InvalidCondition(format!(
                "rule never matches a date on or after {}",
                anchor
            ))
        })
    }
}

enum MonthDay {
    Day(u32),
    Nth(Weekday, u32),
}

/// Plain serialized shape of a rule; deserializing replays the setters.
#[derive(Serialize, Deserialize)]
struct RuleFields {
    frequency: Frequency,
    #[serde(default = "default_interval")]
    interval: u32,
    #[serde(default)]
    termination: Termination,
    #[serde(default = "default_week_start")]
    week_start: Weekday,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_week: Option<WeekdaySet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    week_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    month_of_year: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

fn default_week_start() -> Weekday {
    Weekday::Mon
}

impl TryFrom<RuleFields> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(fields: RuleFields) -> Result<Self> {
        let mut rule = RecurrenceRule::new(fields.frequency);
        rule.set_interval(fields.interval)?;
        rule.termination = fields.termination;
        rule.set_week_start(fields.week_start);
        if let Some(set) = fields.day_of_week {
            rule.set_weekdays(set)?;
        }
        if let Some(week) = fields.week_of_month {
            rule.set_week_of_month(week)?;
        }
        if let Some(day) = fields.day_of_month {
            rule.set_day_of_month(day)?;
        }
        if let Some(month) = fields.month_of_year {
            rule.set_month_of_year(month)?;
        }
        Ok(rule)
    }
}

impl From<RecurrenceRule> for RuleFields {
    fn from(rule: RecurrenceRule) -> Self {
        RuleFields {
            frequency: rule.frequency,
            interval: rule.interval(),
            termination: rule.termination,
            week_start: rule.week_start,
            day_of_week: rule.day_of_week.map(DayOfWeek::to_set),
            day_of_month: rule.day_of_month(),
            week_of_month: rule.week_of_month(),
            month_of_year: rule.month_of_year(),
        }
    }
}
