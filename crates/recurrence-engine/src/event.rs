//! Recurring calendar entries and the instances materialized from them.
//!
//! A [`RecurringEvent`] is an *entry*: the stored event with an optional
//! [`RecurrenceRule`] and an [`ExceptionSet`]. An [`EventInstance`] is one
//! concrete occurrence identified by its [`RecurrenceId`]. Instances are only
//! produced by expansion; they never carry a rule and materializing them never
//! mutates the entry.
//!
//! Attaching a rule validates it against the entry's start date and moves the
//! start forward to the first matching date when they disagree.

use serde::{Deserialize, Serialize};

use crate::date::CalendarDate;
use crate::error::{RecurrenceError, Result};
use crate::exception::{ExceptionSet, Override, RecurrenceException, RecurrenceId};
use crate::generator::Occurrences;
use crate::rule::{Frequency, RecurrenceRule, Termination};

const SECONDS_PER_DAY: i64 = 86_400;

/// The content of an event: what the rule repeats and what a change exception replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl EventDetails {
    /// # Errors
    /// Returns `InvalidArg` if `end` is before `start`.
    pub fn new(subject: impl Into<String>, start: CalendarDate, end: CalendarDate) -> Result<Self> {
        let details = Self {
            subject: subject.into(),
            description: None,
            location: None,
            start,
            end,
        };
        details.check_time_range()?;
        Ok(details)
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn duration_seconds(&self) -> i64 {
        self.end.diff_seconds(&self.start)
    }

    fn check_time_range(&self) -> Result<()> {
        if self.end < self.start {
            return Err(RecurrenceError::InvalidArg(format!(
                "event ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// The same content moved to start at `start`, keeping the duration.
    fn shifted_to(&self, start: CalendarDate) -> Result<Self> {
        let end = start.add_seconds(self.duration_seconds())?;
        Ok(Self {
            start,
            end,
            ..self.clone()
        })
    }
}

/// One materialized occurrence of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInstance {
    pub recurrence_id: RecurrenceId,
    pub details: EventDetails,
    /// True when the content comes from a change exception.
    pub modified: bool,
}

impl EventInstance {
    pub fn start(&self) -> CalendarDate {
        self.details.start
    }

    pub fn end(&self) -> CalendarDate {
        self.details.end
    }

    fn overlaps(&self, from: CalendarDate, to: CalendarDate) -> bool {
        self.start() < to && (self.end() > from || self.start() >= from)
    }
}

/// Exception-applied instances in recurrence-id order.
///
/// Yields an `OutOfRange` error, and nothing after it, for an occurrence
/// whose end falls past 9999-12-31T23:59:59.
pub struct Instances<'a, I> {
    ids: I,
    base: &'a EventDetails,
    exceptions: &'a ExceptionSet,
    failed: bool,
}

impl<'a, I> Instances<'a, I>
where
    I: Iterator<Item = CalendarDate>,
{
    pub fn new(ids: I, base: &'a EventDetails, exceptions: &'a ExceptionSet) -> Self {
        Self {
            ids,
            base,
            exceptions,
            failed: false,
        }
    }
}

impl<I> Iterator for Instances<'_, I>
where
    I: Iterator<Item = CalendarDate>,
{
    type Item = Result<EventInstance>;

    fn next(&mut self) -> Option<Result<EventInstance>> {
        if self.failed {
            return None;
        }
        for date in self.ids.by_ref() {
            let id = RecurrenceId(date);
            match self.exceptions.lookup(id) {
                Override::Skip => {
                    tracing::trace!(%id, "skipping cancelled occurrence");
                }
                Override::Replace(details) => {
                    return Some(Ok(EventInstance {
                        recurrence_id: id,
                        details: details.clone(),
                        modified: true,
                    }));
                }
                Override::Keep => {
                    let instance = self.base.shifted_to(date).map(|details| EventInstance {
                        recurrence_id: id,
                        details,
                        modified: false,
                    });
                    self.failed = instance.is_err();
                    return Some(instance);
                }
            }
        }
        None
    }
}

/// Instances overlapping `[from, to)` in `(start, recurrence id)` order.
///
/// Rule-derived instances start at their ids, so they arrive already ordered
/// and are generated only up to `to`. Replacements are checked by their own
/// times and merged in.
pub struct Window<'a> {
    ids: OccurrenceIds,
    base: &'a EventDetails,
    exceptions: &'a ExceptionSet,
    from: CalendarDate,
    to: CalendarDate,
    pending: Option<EventInstance>,
    series_done: bool,
    moved: std::iter::Peekable<std::vec::IntoIter<EventInstance>>,
}

impl Window<'_> {
    fn next_from_series(&mut self) -> Result<Option<EventInstance>> {
        while !self.series_done {
            let Some(date) = self.ids.next().filter(|date| *date < self.to) else {
                self.series_done = true;
                break;
            };
            let id = RecurrenceId(date);
            if !matches!(self.exceptions.lookup(id), Override::Keep) {
                continue;
            }
            let instance = EventInstance {
                recurrence_id: id,
                details: self.base.shifted_to(date)?,
                modified: false,
            };
            if instance.overlaps(self.from, self.to) {
                return Ok(Some(instance));
            }
        }
        Ok(None)
    }
}

impl Iterator for Window<'_> {
    type Item = Result<EventInstance>;

    fn next(&mut self) -> Option<Result<EventInstance>> {
        if self.pending.is_none() {
            match self.next_from_series() {
                Ok(next) => self.pending = next,
                Err(err) => {
                    self.series_done = true;
                    return Some(Err(err));
                }
            }
        }
        let take_moved = match (&self.pending, self.moved.peek()) {
            (Some(series), Some(moved)) => sort_key(moved) < sort_key(series),
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if take_moved {
            self.moved.next().map(Ok)
        } else {
            self.pending.take().map(Ok)
        }
    }
}

impl ExceptionSet {
    /// Apply this set to a sequence of generated occurrence dates.
    pub fn apply<'a, I>(&'a self, ids: I, base: &'a EventDetails) -> Instances<'a, I::IntoIter>
    where
        I: IntoIterator<Item = CalendarDate>,
    {
        Instances::new(ids.into_iter(), base, self)
    }
}

/// Occurrence dates of an entry: the lone start of a one-off event, or a rule's expansion.
#[derive(Debug, Clone)]
pub enum OccurrenceIds {
    Single(std::option::IntoIter<CalendarDate>),
    Series(Occurrences),
}

impl Iterator for OccurrenceIds {
    type Item = CalendarDate;

    fn next(&mut self) -> Option<CalendarDate> {
        match self {
            OccurrenceIds::Single(once) => once.next(),
            OccurrenceIds::Series(series) => series.next(),
        }
    }
}

/// A stored calendar entry, possibly recurring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEvent {
    details: EventDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rule: Option<RecurrenceRule>,
    #[serde(default)]
    exceptions: ExceptionSet,
}

impl RecurringEvent {
    /// A one-off entry; it has exactly one instance until a rule is attached.
    pub fn new(details: EventDetails) -> Result<Self> {
        details.check_time_range()?;
        Ok(Self {
            details,
            rule: None,
            exceptions: ExceptionSet::new(),
        })
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn start(&self) -> CalendarDate {
        self.details.start
    }

    pub fn end(&self) -> CalendarDate {
        self.details.end
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.details.subject = subject.into();
    }

    pub fn set_location(&mut self, location: Option<String>) {
        self.details.location = location;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.details.description = description;
    }

    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.rule.as_ref()
    }

    pub fn exceptions(&self) -> &ExceptionSet {
        &self.exceptions
    }

    pub fn is_recurring(&self) -> bool {
        self.rule.is_some()
    }

    /// Attach `rule`, validating it against this entry's start and end.
    ///
    /// When the start date does not match the rule, the entry is moved forward
    /// to the first matching date (same time of day, same duration). Existing
    /// exceptions refer to the previous series and are dropped.
    ///
    /// # Errors
    /// `InvalidCondition` when the rule can never produce an occurrence for
    /// this entry: impossible month/day, a zero count, an `until` before the
    /// first match, or an event longer than one recurrence interval. On error
    /// the entry is unchanged.
    pub fn set_rule(&mut self, rule: RecurrenceRule) -> Result<()> {
        let duration = self.details.duration_seconds();
        let span = shortest_period_seconds(&rule);
        if duration > span {
            return Err(RecurrenceError::InvalidCondition(format!(
                "event lasts {}s but the rule repeats every {}s",
                duration, span
            )));
        }
        if rule.termination() == Termination::Count(0) {
            return Err(RecurrenceError::InvalidCondition(
                "count of 0 produces no occurrences".to_string(),
            ));
        }

        let start = rule.first_on_or_after(self.details.start)?;
        if let Termination::Until(until) = rule.termination() {
            if start > until {
                return Err(RecurrenceError::InvalidCondition(format!(
                    "first occurrence {} is after until {}",
                    start, until
                )));
            }
        }
        let details = self.details.shifted_to(start)?;

        if start != self.details.start {
            tracing::debug!(from = %self.details.start, to = %start, "recomputed start date to match rule");
        }
        tracing::debug!(frequency = ?rule.frequency(), interval = rule.interval(), "attached recurrence rule");
        self.details = details;
        self.rule = Some(rule);
        self.exceptions.clear();
        Ok(())
    }

    /// Make this entry a one-off event again, dropping its exceptions.
    pub fn clear_rule(&mut self) {
        self.rule = None;
        self.exceptions.clear();
    }

    /// Raw occurrence dates of this entry, before exceptions.
    pub fn occurrence_ids(&self) -> Result<OccurrenceIds> {
        match &self.rule {
            None => Ok(OccurrenceIds::Single(Some(self.details.start).into_iter())),
            Some(rule) => Ok(OccurrenceIds::Series(rule.occurrences(self.details.start)?)),
        }
    }

    /// True when `id` is a member of the generated sequence, exceptions aside.
    pub fn is_occurrence(&self, id: RecurrenceId) -> bool {
        let Ok(ids) = self.occurrence_ids() else {
            return false;
        };
        ids.take_while(|date| *date <= id.0).any(|date| date == id.0)
    }

    /// Lazy, exception-applied instances in recurrence-id order.
    pub fn instances(&self) -> Result<Instances<'_, OccurrenceIds>> {
        Ok(self.exceptions.apply(self.occurrence_ids()?, &self.details))
    }

    /// Every instance of a bounded series, sorted by start.
    ///
    /// # Errors
    /// Returns `InvalidCondition` for an unbounded series; use
    /// [`RecurringEvent::instances`] and cap consumption instead. Returns
    /// `OutOfRange` when an occurrence would end past the representable range.
    pub fn all_instances(&self) -> Result<Vec<EventInstance>> {
        if self.rule.as_ref().is_some_and(RecurrenceRule::is_unbounded) {
            return Err(RecurrenceError::InvalidCondition(
                "series is unbounded; iterate instances() instead".to_string(),
            ));
        }
        let mut all = self.instances()?.collect::<Result<Vec<_>>>()?;
        sort_by_start(&mut all);
        Ok(all)
    }

    /// Lazy instances overlapping `[from, to)`, sorted by start.
    ///
    /// Suitable for unbounded series with an open end (`to` of
    /// [`CalendarDate::MAX`]) as long as the caller caps consumption.
    pub fn window(&self, from: CalendarDate, to: CalendarDate) -> Result<Window<'_>> {
        let mut moved: Vec<EventInstance> = self
            .exceptions
            .list_replacements()
            .into_iter()
            .map(|(id, details)| EventInstance {
                recurrence_id: id,
                details: details.clone(),
                modified: true,
            })
            .filter(|instance| instance.overlaps(from, to))
            .collect();
        sort_by_start(&mut moved);
        Ok(Window {
            ids: self.occurrence_ids()?,
            base: &self.details,
            exceptions: &self.exceptions,
            from,
            to,
            pending: None,
            series_done: false,
            moved: moved.into_iter().peekable(),
        })
    }

    /// Every instance overlapping `[from, to)`, sorted by start.
    ///
    /// # Errors
    /// Returns `InvalidCondition` for an unbounded series with `to` left at
    /// [`CalendarDate::MAX`]; use [`RecurringEvent::window`] instead.
    pub fn instances_between(&self, from: CalendarDate, to: CalendarDate) -> Result<Vec<EventInstance>> {
        if to == CalendarDate::MAX && self.rule.as_ref().is_some_and(RecurrenceRule::is_unbounded) {
            return Err(RecurrenceError::InvalidCondition(
                "window has no end on an unbounded series; iterate window() instead".to_string(),
            ));
        }
        self.window(from, to)?.collect()
    }

    /// The materialized occurrence with identity `id`.
    ///
    /// # Errors
    /// `InvalidArg` if `id` is not in the generated sequence, `ObjNotFound`
    /// if that occurrence has been cancelled, `OutOfRange` if it would end
    /// past the representable range.
    pub fn instance(&self, id: RecurrenceId) -> Result<EventInstance> {
        if !self.is_occurrence(id) {
            return Err(RecurrenceError::InvalidArg(format!(
                "{} is not an occurrence of this event",
                id
            )));
        }
        match self.exceptions.apply(std::iter::once(id.0), &self.details).next() {
            Some(instance) => instance,
            None => Err(RecurrenceError::ObjNotFound(format!("occurrence {} is cancelled", id))),
        }
    }

    fn check_exception_target(&self, id: RecurrenceId) -> Result<()> {
        if self.rule.is_none() {
            return Err(RecurrenceError::InvalidState(
                "exceptions need a recurring entry".to_string(),
            ));
        }
        if !self.is_occurrence(id) {
            return Err(RecurrenceError::InvalidArg(format!(
                "{} is not an occurrence of this event",
                id
            )));
        }
        Ok(())
    }

    pub fn add_recurrence_exception(&mut self, exception: RecurrenceException) -> Result<()> {
        self.check_exception_target(exception.id())?;
        match exception {
            RecurrenceException::Skip { id } => {
                self.exceptions.add_skip(id)?;
                tracing::debug!(%id, "cancelled occurrence");
            }
            RecurrenceException::Change { id, details } => {
                details.check_time_range()?;
                self.exceptions.add_replacement(id, details)?;
                tracing::debug!(%id, "modified occurrence");
            }
        }
        Ok(())
    }

    /// Replace the content of an existing change exception.
    ///
    /// # Errors
    /// `ObjNotFound` if `id` has no change exception (a cancelled occurrence
    /// must be restored before it can be changed).
    pub fn update_recurrence_exception(&mut self, id: RecurrenceId, details: EventDetails) -> Result<()> {
        self.check_exception_target(id)?;
        details.check_time_range()?;
        self.exceptions.update_replacement(id, details)?;
        tracing::debug!(%id, "updated modified occurrence");
        Ok(())
    }

    /// Drop whichever exception `id` has, restoring the rule-derived occurrence.
    pub fn remove_recurrence_exception(&mut self, id: RecurrenceId) -> Result<()> {
        self.check_exception_target(id)?;
        if self.exceptions.is_skipped(id) {
            self.exceptions.remove_skip(id)?;
        } else {
            self.exceptions.remove_replacement(id)?;
        }
        tracing::debug!(%id, "restored occurrence");
        Ok(())
    }
}

/// Shortest gap the frequency and interval allow between two periods.
fn shortest_period_seconds(rule: &RecurrenceRule) -> i64 {
    let days = match rule.frequency() {
        Frequency::Daily => 1,
        Frequency::Weekly => 7,
        Frequency::Monthly => 28,
        Frequency::Yearly => 365,
    };
    i64::from(rule.interval()) * days * SECONDS_PER_DAY
}

fn sort_key(instance: &EventInstance) -> (CalendarDate, RecurrenceId) {
    (instance.start(), instance.recurrence_id)
}

/// Order instances by start, then recurrence id.
pub fn sort_by_start(instances: &mut [EventInstance]) {
    instances.sort_by_key(sort_key);
}

/// Either a stored entry or one of its materialized occurrences.
#[derive(Debug, Clone, PartialEq)]
pub enum CalEvent {
    Entry(RecurringEvent),
    Instance(EventInstance),
}

impl CalEvent {
    pub fn is_entry(&self) -> bool {
        matches!(self, CalEvent::Entry(_))
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, CalEvent::Instance(_))
    }

    pub fn details(&self) -> &EventDetails {
        match self {
            CalEvent::Entry(entry) => entry.details(),
            CalEvent::Instance(instance) => &instance.details,
        }
    }

    /// The instance identity; entries have none.
    pub fn recurrence_id(&self) -> Option<RecurrenceId> {
        match self {
            CalEvent::Entry(_) => None,
            CalEvent::Instance(instance) => Some(instance.recurrence_id),
        }
    }

    /// The entry, for rule and exception edits.
    ///
    /// # Errors
    /// Returns `InvalidState` for an instance.
    pub fn entry_mut(&mut self) -> Result<&mut RecurringEvent> {
        match self {
            CalEvent::Entry(entry) => Ok(entry),
            CalEvent::Instance(instance) => Err(RecurrenceError::InvalidState(format!(
                "occurrence {} is an instance, not an entry",
                instance.recurrence_id
            ))),
        }
    }
}

impl From<RecurringEvent> for CalEvent {
    fn from(entry: RecurringEvent) -> Self {
        CalEvent::Entry(entry)
    }
}

impl From<EventInstance> for CalEvent {
    fn from(instance: EventInstance) -> Self {
        CalEvent::Instance(instance)
    }
}
