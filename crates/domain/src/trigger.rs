//! Trigger — a resolved, armable firing derived from a schedule.
//!
//! Triggers are never persisted and never mutated in place: every rebuild
//! produces a fresh set that replaces the previous one wholesale.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::device::DeviceRef;
use crate::id::ScheduleId;
use crate::schedule::ActiveSchedule;
use crate::time::TimeOfDay;

/// Outcome of resolving a schedule's override policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "time", rename_all = "snake_case")]
pub enum FireAt {
    /// Fire at this local time of day.
    At(TimeOfDay),
    /// Do not arm anything for this schedule this cycle.
    Suppressed,
}

impl FireAt {
    #[must_use]
    pub fn time(self) -> Option<TimeOfDay> {
        match self {
            Self::At(t) => Some(t),
            Self::Suppressed => None,
        }
    }

    #[must_use]
    pub fn is_suppressed(self) -> bool {
        matches!(self, Self::Suppressed)
    }
}

/// Snapshot of everything a firing needs, copied out of the schedule at
/// resolution time so later edits to the record cannot leak into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTrigger {
    pub schedule_id: ScheduleId,
    pub schedule_name: String,
    pub fire_at: TimeOfDay,
    pub device_ref: DeviceRef,
    pub fallback_address: Option<String>,
    pub desired_power: bool,
}

impl ResolvedTrigger {
    /// Freeze `schedule` at `fire_at`.
    #[must_use]
    pub fn snapshot(schedule: &ActiveSchedule, fire_at: TimeOfDay) -> Self {
        Self {
            schedule_id: schedule.record.id,
            schedule_name: schedule.record.name.clone(),
            fire_at,
            device_ref: schedule.record.device_ref.clone(),
            fallback_address: schedule.fallback_address().map(ToOwned::to_owned),
            desired_power: schedule.record.desired_power,
        }
    }
}

/// A trigger currently armed in the registry together with its due time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedTrigger {
    #[serde(flatten)]
    pub trigger: ResolvedTrigger,
    /// Local date-time the timer will wake at.
    pub due_at: NaiveDateTime,
}
