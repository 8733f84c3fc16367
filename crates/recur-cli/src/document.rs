//! The JSON entry document read by `expand` and `check`.
//!
//! ```json
//! {
//!   "subject": "standup",
//!   "start": "2024-01-01T09:00:00",
//!   "end": "2024-01-01T09:15:00",
//!   "rule": { "frequency": "daily", "termination": { "count": 10 } },
//!   "exceptions": [{ "kind": "skip", "id": "2024-01-03T09:00:00" }]
//! }
//! ```

use recurrence_engine::error::Result;
use recurrence_engine::{
    CalendarDate, EventDetails, RecurrenceException, RecurrenceRule, RecurringEvent,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventDocument {
    pub subject: String,
    pub start: CalendarDate,
    pub end: CalendarDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rule: Option<RecurrenceRule>,
    #[serde(default)]
    pub exceptions: Vec<RecurrenceException>,
}

impl EventDocument {
    /// Build the entry: attach the rule (which may move the start forward),
    /// then record each exception against the resulting series.
    pub fn into_event(self) -> Result<RecurringEvent> {
        let mut details = EventDetails::new(self.subject, self.start, self.end)?;
        details.location = self.location;
        details.description = self.description;

        let mut event = RecurringEvent::new(details)?;
        if let Some(rule) = self.rule {
            event.set_rule(rule)?;
        }
        for exception in self.exceptions {
            event.add_recurrence_exception(exception)?;
        }
        Ok(event)
    }
}
