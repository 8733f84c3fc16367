//! # recurrence-engine
//!
//! Deterministic recurrence expansion for calendar entries.
//!
//! A recurring entry is a base event plus a [`RecurrenceRule`] and an
//! [`ExceptionSet`]. The rule is validated against the entry's start date,
//! expanded lazily into occurrence dates, and the exception set then removes
//! cancelled occurrences and substitutes modified ones.
//!
//! ## Modules
//!
//! - [`date`] — Gregorian date/time values with range-checked arithmetic
//! - [`weekday`] — Weekday flags and sets used by rule selectors
//! - [`rule`] — Recurrence rules and their setter validation
//! - [`generator`] — Rule + anchor → lazy sequence of occurrence dates
//! - [`exception`] — Cancelled and modified occurrences keyed by recurrence id
//! - [`event`] — Recurring entries, materialized instances
//! - [`zone`] / [`dst`] — Wall-clock to UTC resolution and DST gap policies
//! - [`store`] — Storage port and the calendar book built on it
//! - [`error`] — Error types

pub mod date;
pub mod dst;
pub mod error;
pub mod event;
pub mod exception;
pub mod generator;
pub mod rule;
pub mod store;
pub mod weekday;
pub mod zone;

pub use chrono::Weekday;
pub use date::CalendarDate;
pub use dst::DstPolicy;
pub use error::{ErrorKind, RecurrenceError};
pub use event::{CalEvent, EventDetails, EventInstance, RecurringEvent};
pub use exception::{ExceptionSet, RecurrenceException, RecurrenceId};
pub use generator::{generate, Occurrences};
pub use rule::{DayOfWeek, Frequency, RecurrenceRule, Termination};
pub use store::{Calendarbook, EventId, EventStore, MemoryEventStore};
pub use weekday::WeekdaySet;
pub use zone::{UtcInstance, ZoneResolver};
