//! Wall-clock to UTC resolution for materialized instances.
//!
//! The engine expands rules on a single wall-clock time base. This module is
//! the boundary where those times meet a real zone: an instance at 14:00
//! stays at 14:00 local time across DST changes, so its UTC offset moves.

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::date::CalendarDate;
use crate::dst::DstPolicy;
use crate::error::{RecurrenceError, Result};
use crate::event::EventInstance;
use crate::exception::RecurrenceId;

/// An instance resolved to absolute time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtcInstance {
    pub recurrence_id: RecurrenceId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub modified: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneResolver {
    tz: Tz,
    policy: DstPolicy,
}

impl ZoneResolver {
    /// # Errors
    /// Returns `InvalidArg` if `name` is not a valid IANA identifier.
    pub fn new(name: &str, policy: DstPolicy) -> Result<Self> {
        let tz: Tz = name
            .parse()
            .map_err(|_| RecurrenceError::InvalidArg(format!("unknown time zone: {}", name)))?;
        Ok(Self { tz, policy })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn policy(&self) -> DstPolicy {
        self.policy
    }

    /// Resolve a wall-clock time in this zone to UTC.
    ///
    /// Returns `None` only for a time inside a DST gap under [`DstPolicy::Skip`].
    pub fn to_utc(&self, local: CalendarDate) -> Result<Option<DateTime<Utc>>> {
        let naive = NaiveDateTime::try_from(local)?;
        if let Some(resolved) = self.tz.from_local_datetime(&naive).earliest() {
            return Ok(Some(resolved.with_timezone(&Utc)));
        }
        match self.policy {
            DstPolicy::Skip => Ok(None),
            DstPolicy::ShiftForward => {
                // Reading the gap time with the offset in force before the gap
                // moves it forward by exactly the gap length.
                let before = self
                    .tz
                    .from_local_datetime(&(naive - Duration::days(1)))
                    .earliest()
                    .ok_or_else(|| {
                        RecurrenceError::InvalidCondition(format!(
                            "cannot resolve {} in {}",
                            local, self.tz
                        ))
                    })?;
                let offset = i64::from(before.offset().fix().local_minus_utc());
                Ok(Some(Utc.from_utc_datetime(&(naive - Duration::seconds(offset)))))
            }
        }
    }

    /// Wall-clock time in this zone for a UTC instant.
    pub fn from_utc(&self, utc: DateTime<Utc>) -> Result<CalendarDate> {
        CalendarDate::try_from(utc.with_timezone(&self.tz).naive_local())
    }

    /// Resolve instances to UTC, keeping each instance's absolute duration.
    pub fn resolve_instances(&self, instances: &[EventInstance]) -> Result<Vec<UtcInstance>> {
        let mut resolved = Vec::with_capacity(instances.len());
        for instance in instances {
            let Some(start) = self.to_utc(instance.start())? else {
                tracing::warn!(id = %instance.recurrence_id, tz = %self.tz, "dropping instance inside DST gap");
                continue;
            };
            let duration = Duration::seconds(instance.end().diff_seconds(&instance.start()));
            resolved.push(UtcInstance {
                recurrence_id: instance.recurrence_id,
                start,
                end: start + duration,
                modified: instance.modified,
            });
        }
        Ok(resolved)
    }
}
