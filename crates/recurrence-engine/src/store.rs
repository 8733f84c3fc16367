//! Storage port for recurring entries and the calendar book that consumes it.
//!
//! The engine never persists anything itself. An [`EventStore`] keeps entries
//! however it likes; [`MemoryEventStore`] keeps each one as an opaque JSON blob
//! that it stores and returns without interpreting. [`Calendarbook`] answers
//! range queries and applies single-occurrence edits on top of any store.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::date::CalendarDate;
use crate::error::{RecurrenceError, Result};
use crate::event::{EventDetails, EventInstance, RecurringEvent};
use crate::exception::{RecurrenceException, RecurrenceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub trait EventStore {
    fn insert(&mut self, entry: &RecurringEvent) -> Result<EventId>;

    /// # Errors
    /// Returns `ObjNotFound` for an unknown id.
    fn get(&self, id: EventId) -> Result<RecurringEvent>;

    fn update(&mut self, id: EventId, entry: &RecurringEvent) -> Result<()>;

    fn remove(&mut self, id: EventId) -> Result<()>;

    /// Stored ids in ascending order.
    fn ids(&self) -> Vec<EventId>;
}

/// In-process store keeping every entry as a serialized blob.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    blobs: BTreeMap<EventId, String>,
    next_id: u64,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn not_found(id: EventId) -> RecurrenceError {
        RecurrenceError::ObjNotFound(format!("no event with id {}", id))
    }
}

impl EventStore for MemoryEventStore {
    fn insert(&mut self, entry: &RecurringEvent) -> Result<EventId> {
        let blob = serde_json::to_string(entry)?;
        self.next_id += 1;
        let id = EventId(self.next_id);
        tracing::debug!(%id, bytes = blob.len(), "stored event");
        self.blobs.insert(id, blob);
        Ok(id)
    }

    fn get(&self, id: EventId) -> Result<RecurringEvent> {
        let blob = self.blobs.get(&id).ok_or_else(|| Self::not_found(id))?;
        Ok(serde_json::from_str(blob)?)
    }

    fn update(&mut self, id: EventId, entry: &RecurringEvent) -> Result<()> {
        let blob = serde_json::to_string(entry)?;
        let slot = self.blobs.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        tracing::debug!(%id, bytes = blob.len(), "updated event");
        *slot = blob;
        Ok(())
    }

    fn remove(&mut self, id: EventId) -> Result<()> {
        self.blobs
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    fn ids(&self) -> Vec<EventId> {
        self.blobs.keys().copied().collect()
    }
}

/// An instance together with the entry it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstance {
    pub event_id: EventId,
    pub instance: EventInstance,
}

/// Calendar-level operations over a store.
#[derive(Debug, Default)]
pub struct Calendarbook<S> {
    store: S,
}

impl<S: EventStore> Calendarbook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add_event(&mut self, entry: &RecurringEvent) -> Result<EventId> {
        self.store.insert(entry)
    }

    pub fn event(&self, id: EventId) -> Result<RecurringEvent> {
        self.store.get(id)
    }

    pub fn remove_event(&mut self, id: EventId) -> Result<()> {
        self.store.remove(id)
    }

    /// Instances of every entry overlapping `[from, to)`, sorted by start then event.
    ///
    /// Fails like [`RecurringEvent::instances_between`] when an entry repeats
    /// forever and `to` is [`CalendarDate::MAX`].
    pub fn instances_between(&self, from: CalendarDate, to: CalendarDate) -> Result<Vec<BookInstance>> {
        let mut found = Vec::new();
        for event_id in self.store.ids() {
            let entry = self.store.get(event_id)?;
            found.extend(
                entry
                    .instances_between(from, to)?
                    .into_iter()
                    .map(|instance| BookInstance { event_id, instance }),
            );
        }
        found.sort_by_key(|b| (b.instance.start(), b.event_id, b.instance.recurrence_id));
        Ok(found)
    }

    pub fn cancel_occurrence(&mut self, event_id: EventId, id: RecurrenceId) -> Result<()> {
        self.edit(event_id, |entry| {
            entry.add_recurrence_exception(RecurrenceException::Skip { id })
        })
    }

    /// Change one occurrence, creating or overwriting its change exception.
    pub fn modify_occurrence(
        &mut self,
        event_id: EventId,
        id: RecurrenceId,
        details: EventDetails,
    ) -> Result<()> {
        self.edit(event_id, |entry| {
            if entry.exceptions().replacement(id).is_some() {
                entry.update_recurrence_exception(id, details)
            } else {
                entry.add_recurrence_exception(RecurrenceException::Change { id, details })
            }
        })
    }

    pub fn restore_occurrence(&mut self, event_id: EventId, id: RecurrenceId) -> Result<()> {
        self.edit(event_id, |entry| entry.remove_recurrence_exception(id))
    }

    fn edit<F>(&mut self, event_id: EventId, change: F) -> Result<()>
    where
        F: FnOnce(&mut RecurringEvent) -> Result<()>,
    {
        let mut entry = self.store.get(event_id)?;
        change(&mut entry)?;
        self.store.update(event_id, &entry)
    }
}
