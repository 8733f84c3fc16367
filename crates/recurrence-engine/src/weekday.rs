//! Weekday flags and weekday sets used as rule selectors.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// Map `0..7` (Monday-based) to a [`Weekday`]; values wrap modulo 7.
pub fn weekday_from_monday(n: u32) -> Weekday {
    match n % 7 {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Bit flag for a single weekday (Sunday = 0x01 .. Saturday = 0x40).
pub fn weekday_flag(day: Weekday) -> u8 {
    1 << day.num_days_from_sunday()
}

/// A set of weekdays stored as the seven weekday flags.
///
/// The bit layout matches the platform's `dayOfWeek` mask, so raw masks coming
/// from storage convert with [`WeekdaySet::from_bits`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const SUNDAY: u8 = 0x01;
    pub const MONDAY: u8 = 0x02;
    pub const TUESDAY: u8 = 0x04;
    pub const WEDNESDAY: u8 = 0x08;
    pub const THURSDAY: u8 = 0x10;
    pub const FRIDAY: u8 = 0x20;
    pub const SATURDAY: u8 = 0x40;
    pub const ALL_BITS: u8 = 0x7f;

    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    /// Build a set from a raw mask.
    ///
    /// # Errors
    /// Returns `InvalidArg` if any bit outside the seven weekday flags is set.
    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & !Self::ALL_BITS != 0 {
            return Err(RecurrenceError::InvalidArg(format!(
                "weekday mask {:#04x} has bits outside {:#04x}",
                bits,
                Self::ALL_BITS
            )));
        }
        Ok(Self(bits))
    }

    pub fn single(day: Weekday) -> Self {
        Self(weekday_flag(day))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & weekday_flag(day) != 0
    }

    #[must_use]
    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | weekday_flag(day))
    }

    /// The only member, if the set has exactly one.
    pub fn as_single(&self) -> Option<Weekday> {
        if self.len() == 1 {
            self.iter_from(Weekday::Mon).next()
        } else {
            None
        }
    }

    /// Members in weekday order beginning at `start`.
    pub fn iter_from(&self, start: Weekday) -> impl Iterator<Item = Weekday> + '_ {
        let mut day = start;
        (0..7).filter_map(move |_| {
            let current = day;
            day = day.succ();
            self.contains(current).then_some(current)
        })
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(WeekdaySet::EMPTY, WeekdaySet::with)
    }
}

impl TryFrom<u8> for WeekdaySet {
    type Error = RecurrenceError;

    fn try_from(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<WeekdaySet> for u8 {
    fn from(set: WeekdaySet) -> u8 {
        set.0
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_from(Weekday::Mon)).finish()
    }
}
