//! Proleptic-Gregorian date/time values with range-checked calendar arithmetic.
//!
//! A [`CalendarDate`] is always valid: every constructor and every arithmetic
//! operation checks the result against `0001-01-01T00:00:00 ..= 9999-12-31T23:59:59`
//! and fails with [`RecurrenceError::OutOfRange`] instead of saturating.
//!
//! All arithmetic goes through an absolute second count whose day component
//! comes from [`count_days`], so add/subtract and comparison are O(1).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{RecurrenceError, Result};
use crate::weekday::weekday_from_monday;

const SECONDS_PER_DAY: i64 = 86_400;

/// Cumulative day counts before each month in a common year.
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Standard Gregorian leap-year test.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of leap years in `1..year`.
pub fn count_leap_years(year: i32) -> i64 {
    let y = i64::from(year) - 1;
    y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)
}

/// Number of days from 0001-01-01 to January 1st of `year`.
pub fn count_days(year: i32) -> i64 {
    (i64::from(year) - 1) * 365 + count_leap_years(year)
}

/// Length of `month` in `year`.
///
/// # Errors
/// Returns `OutOfRange` if the year is outside 1..=9999 or the month outside 1..=12.
pub fn days_in_month(year: i32, month: u32) -> Result<u8> {
    check_year(year)?;
    month_length(year, month)
}

fn month_length(year: i32, month: u32) -> Result<u8> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Ok(31),
        4 | 6 | 9 | 11 => Ok(30),
        2 if is_leap_year(year) => Ok(29),
        2 => Ok(28),
        _ => Err(RecurrenceError::OutOfRange(format!(
            "month {} not in 1..=12",
            month
        ))),
    }
}

fn check_year(year: i32) -> Result<()> {
    if (1..=9999).contains(&year) {
        Ok(())
    } else {
        Err(RecurrenceError::OutOfRange(format!(
            "year {} not in 1..=9999",
            year
        )))
    }
}

/// An immutable, always-valid Gregorian date and wall-clock time.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl CalendarDate {
    pub const MIN: CalendarDate = CalendarDate {
        year: 1,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub const MAX: CalendarDate = CalendarDate {
        year: 9999,
        month: 12,
        day: 31,
        hour: 23,
        minute: 59,
        second: 59,
    };

    /// Build a date from its components.
    ///
    /// # Errors
    /// Returns `OutOfRange` if any component is outside its domain, including a
    /// day that does not exist in the given month (e.g. 2025-02-29).
    pub fn from_components(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        check_year(year)?;
        let len = month_length(year, month)?;
        if day < 1 || day > u32::from(len) {
            return Err(RecurrenceError::OutOfRange(format!(
                "day {} not in 1..={} for {:04}-{:02}",
                day, len, year, month
            )));
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(RecurrenceError::OutOfRange(format!(
                "time {:02}:{:02}:{:02} is not a valid wall-clock time",
                hour, minute, second
            )));
        }
        Ok(Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }

    /// Midnight on the given day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        Self::from_components(year, month, day, 0, 0, 0)
    }

    pub fn year(&self) -> i32 {
        i32::from(self.year)
    }

    pub fn month(&self) -> u32 {
        u32::from(self.month)
    }

    pub fn day(&self) -> u32 {
        u32::from(self.day)
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    pub fn second(&self) -> u32 {
        u32::from(self.second)
    }

    /// Days elapsed since 0001-01-01.
    pub fn day_number(&self) -> i64 {
        let mut before_month = i64::from(DAYS_BEFORE_MONTH[usize::from(self.month) - 1]);
        if self.month > 2 && is_leap_year(self.year()) {
            before_month += 1;
        }
        count_days(self.year()) + before_month + i64::from(self.day) - 1
    }

    /// Seconds elapsed since 0001-01-01T00:00:00.
    pub fn to_seconds(&self) -> i64 {
        self.day_number() * SECONDS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// Inverse of [`CalendarDate::to_seconds`].
    ///
    /// # Errors
    /// Returns `OutOfRange` if `seconds` falls outside `MIN..=MAX`.
    pub fn from_seconds(seconds: i64) -> Result<Self> {
        if seconds < 0 || seconds > Self::MAX.to_seconds() {
            return Err(RecurrenceError::OutOfRange(format!(
                "{} seconds is outside 0001-01-01T00:00:00..=9999-12-31T23:59:59",
                seconds
            )));
        }
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let secs_of_day = seconds.rem_euclid(SECONDS_PER_DAY);

        // 146097 days per 400-year cycle gives a year estimate within one of the answer.
        let mut year = (days * 400 / 146_097 + 1) as i32;
        while count_days(year + 1) <= days {
            year += 1;
        }
        while count_days(year) > days {
            year -= 1;
        }

        let mut remaining = days - count_days(year);
        let mut month = 1u32;
        loop {
            let len = i64::from(month_length(year, month)?);
            if remaining < len {
                break;
            }
            remaining -= len;
            month += 1;
        }

        Self::from_components(
            year,
            month,
            remaining as u32 + 1,
            (secs_of_day / 3600) as u32,
            (secs_of_day % 3600 / 60) as u32,
            (secs_of_day % 60) as u32,
        )
    }

    pub fn weekday(&self) -> Weekday {
        // 0001-01-01 was a Monday in the proleptic Gregorian calendar.
        weekday_from_monday(self.day_number().rem_euclid(7) as u32)
    }

    /// Which occurrence of its weekday this date is within its month (1-based).
    pub fn week_of_month(&self) -> u32 {
        (u32::from(self.day) - 1) / 7 + 1
    }

    /// True when no later day in the same month shares this date's weekday.
    pub fn is_last_weekday_of_month(&self) -> bool {
        let len = month_length(self.year(), self.month()).unwrap_or(31);
        self.day + 7 > len
    }

    /// The same day at another wall-clock time.
    pub fn with_time(&self, hour: u32, minute: u32, second: u32) -> Result<Self> {
        Self::from_components(self.year(), self.month(), self.day(), hour, minute, second)
    }

    pub fn add_seconds(&self, n: i64) -> Result<Self> {
        let total = self
            .to_seconds()
            .checked_add(n)
            .ok_or_else(|| RecurrenceError::OutOfRange(format!("{} + {}s overflows", self, n)))?;
        Self::from_seconds(total)
    }

    pub fn add_minutes(&self, n: i64) -> Result<Self> {
        self.add_seconds(scaled(n, 60)?)
    }

    pub fn add_hours(&self, n: i64) -> Result<Self> {
        self.add_seconds(scaled(n, 3600)?)
    }

    pub fn add_days(&self, n: i64) -> Result<Self> {
        self.add_seconds(scaled(n, SECONDS_PER_DAY)?)
    }

    /// Move by whole months, keeping the day and time.
    ///
    /// # Errors
    /// Returns `OutOfRange` when the target month does not contain this day
    /// (e.g. Jan 31 + 1 month) or the year leaves 1..=9999. Dates are never
    /// clamped into a shorter month.
    pub fn add_months(&self, n: i64) -> Result<Self> {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1;
        let target = index
            .checked_add(n)
            .ok_or_else(|| RecurrenceError::OutOfRange(format!("{} + {} months overflows", self, n)))?;
        let year = target.div_euclid(12);
        if !(1..=9999).contains(&year) {
            return Err(RecurrenceError::OutOfRange(format!(
                "{} + {} months leaves year range",
                self, n
            )));
        }
        Self::from_components(
            year as i32,
            target.rem_euclid(12) as u32 + 1,
            self.day(),
            self.hour(),
            self.minute(),
            self.second(),
        )
    }

    pub fn add_years(&self, n: i64) -> Result<Self> {
        self.add_months(scaled(n, 12)?)
    }

    /// Signed number of seconds from `other` to `self`.
    pub fn diff_seconds(&self, other: &CalendarDate) -> i64 {
        self.to_seconds() - other.to_seconds()
    }
}

fn scaled(n: i64, factor: i64) -> Result<i64> {
    n.checked_mul(factor)
        .ok_or_else(|| RecurrenceError::OutOfRange(format!("offset {} overflows", n)))
}

/// The `n`-th `weekday` of a month at midnight; `n == 5` means the last one.
///
/// # Errors
/// Returns `OutOfRange` for an invalid year/month or `n` outside 1..=5.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Result<CalendarDate> {
    let len = days_in_month(year, month)?;
    let first = CalendarDate::from_ymd(year, month, 1)?;
    let offset = (weekday.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
    let first_match = 1 + offset;
    let day = match n {
        1..=4 => first_match + (n - 1) * 7,
        5 => {
            let mut day = first_match;
            while day + 7 <= u32::from(len) {
                day += 7;
            }
            day
        }
        _ => {
            return Err(RecurrenceError::OutOfRange(format!(
                "week of month {} not in 1..=5",
                n
            )))
        }
    };
    CalendarDate::from_ymd(year, month, day)
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl FromStr for CalendarDate {
    type Err = RecurrenceError;

    /// Accepts `YYYY-MM-DDTHH:MM:SS`, the same with a space separator, or a bare
    /// `YYYY-MM-DD` meaning midnight.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RecurrenceError::InvalidArg(format!("unparseable date: {:?}", s));
        let s = s.trim();
        let (date, time) = match s.split_once(['T', ' ']) {
            Some((date, time)) => (date, Some(time)),
            None => (s, None),
        };

        let mut parts = date.splitn(3, '-');
        let mut field = |len: usize| -> Result<u32> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != len || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let year = field(4)?;
        let month = field(2)?;
        let day = field(2)?;

        let (hour, minute, second) = match time {
            None => (0, 0, 0),
            Some(time) => {
                let fields: Vec<&str> = time.split(':').collect();
                if fields.len() != 3
                    || fields
                        .iter()
                        .any(|f| f.len() != 2 || !f.bytes().all(|b| b.is_ascii_digit()))
                {
                    return Err(invalid());
                }
                let parse = |f: &str| f.parse::<u32>().map_err(|_| invalid());
                (parse(fields[0])?, parse(fields[1])?, parse(fields[2])?)
            }
        };

        Self::from_components(year as i32, month, day, hour, minute, second)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl TryFrom<CalendarDate> for NaiveDateTime {
    type Error = RecurrenceError;

    fn try_from(date: CalendarDate) -> Result<Self> {
        NaiveDate::from_ymd_opt(date.year(), date.month(), date.day())
            .and_then(|d| d.and_hms_opt(date.hour(), date.minute(), date.second()))
            .ok_or_else(|| RecurrenceError::OutOfRange(format!("{} not representable", date)))
    }
}

impl TryFrom<NaiveDateTime> for CalendarDate {
    type Error = RecurrenceError;

    fn try_from(dt: NaiveDateTime) -> Result<Self> {
        CalendarDate::from_components(
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }
}
