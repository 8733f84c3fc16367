//! Per-occurrence overrides of a recurring series.
//!
//! An [`ExceptionSet`] holds cancelled occurrences ("exdates") and modified
//! occurrences ("change exceptions"), both keyed by [`RecurrenceId`]. An id is
//! a member of at most one of the two collections.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::date::CalendarDate;
use crate::error::{RecurrenceError, Result};
use crate::event::EventDetails;

/// The original start date of one occurrence; the identity of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurrenceId(pub CalendarDate);

impl RecurrenceId {
    pub fn date(&self) -> CalendarDate {
        self.0
    }
}

impl From<CalendarDate> for RecurrenceId {
    fn from(date: CalendarDate) -> Self {
        RecurrenceId(date)
    }
}

impl fmt::Display for RecurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single override, as passed to the exception operations of a recurring entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecurrenceException {
    /// Drop the occurrence from the series.
    Skip { id: RecurrenceId },
    /// Replace the occurrence's content while keeping its identity.
    Change { id: RecurrenceId, details: EventDetails },
}

impl RecurrenceException {
    pub fn id(&self) -> RecurrenceId {
        match self {
            RecurrenceException::Skip { id } | RecurrenceException::Change { id, .. } => *id,
        }
    }
}

/// How an exception set treats one generated occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Override<'a> {
    Keep,
    Skip,
    Replace(&'a EventDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionSet {
    #[serde(default)]
    skipped: BTreeSet<RecurrenceId>,
    #[serde(default)]
    replaced: BTreeMap<RecurrenceId, EventDetails>,
}

impl ExceptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty() && self.replaced.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skipped.len() + self.replaced.len()
    }

    pub fn contains(&self, id: RecurrenceId) -> bool {
        self.skipped.contains(&id) || self.replaced.contains_key(&id)
    }

    pub fn is_skipped(&self, id: RecurrenceId) -> bool {
        self.skipped.contains(&id)
    }

    pub fn replacement(&self, id: RecurrenceId) -> Option<&EventDetails> {
        self.replaced.get(&id)
    }

    /// # Errors
    /// `ObjAlreadyExist` if `id` is already skipped, `InvalidState` if it is
    /// currently replaced.
    pub fn add_skip(&mut self, id: RecurrenceId) -> Result<()> {
        if self.replaced.contains_key(&id) {
            return Err(RecurrenceError::InvalidState(format!(
                "occurrence {} is already replaced",
                id
            )));
        }
        if !self.skipped.insert(id) {
            return Err(RecurrenceError::ObjAlreadyExist(format!(
                "occurrence {} is already skipped",
                id
            )));
        }
        Ok(())
    }

    pub fn remove_skip(&mut self, id: RecurrenceId) -> Result<()> {
        if self.skipped.remove(&id) {
            Ok(())
        } else {
            Err(RecurrenceError::ObjNotFound(format!(
                "no skip for occurrence {}",
                id
            )))
        }
    }

    /// # Errors
    /// `ObjAlreadyExist` if `id` is already replaced, `InvalidState` if it is
    /// currently skipped.
    pub fn add_replacement(&mut self, id: RecurrenceId, details: EventDetails) -> Result<()> {
        if self.skipped.contains(&id) {
            return Err(RecurrenceError::InvalidState(format!(
                "occurrence {} is already skipped",
                id
            )));
        }
        if self.replaced.contains_key(&id) {
            return Err(RecurrenceError::ObjAlreadyExist(format!(
                "occurrence {} is already replaced",
                id
            )));
        }
        self.replaced.insert(id, details);
        Ok(())
    }

    /// Overwrite an existing replacement.
    pub fn update_replacement(&mut self, id: RecurrenceId, details: EventDetails) -> Result<()> {
        match self.replaced.get_mut(&id) {
            Some(slot) => {
                *slot = details;
                Ok(())
            }
            None => Err(RecurrenceError::ObjNotFound(format!(
                "no replacement for occurrence {}",
                id
            ))),
        }
    }

    /// Remove a replacement, returning the stored payload.
    pub fn remove_replacement(&mut self, id: RecurrenceId) -> Result<EventDetails> {
        self.replaced.remove(&id).ok_or_else(|| {
            RecurrenceError::ObjNotFound(format!("no replacement for occurrence {}", id))
        })
    }

    /// Skipped ids in ascending order.
    pub fn list_skips(&self) -> Vec<RecurrenceId> {
        self.skipped.iter().copied().collect()
    }

    /// Replacements in ascending id order.
    pub fn list_replacements(&self) -> Vec<(RecurrenceId, &EventDetails)> {
        self.replaced.iter().map(|(id, details)| (*id, details)).collect()
    }

    pub fn clear(&mut self) {
        self.skipped.clear();
        self.replaced.clear();
    }

    /// Decide what happens to a generated occurrence.
    pub fn lookup(&self, id: RecurrenceId) -> Override<'_> {
        if self.skipped.contains(&id) {
            Override::Skip
        } else if let Some(details) = self.replaced.get(&id) {
            Override::Replace(details)
        } else {
            Override::Keep
        }
    }
}
