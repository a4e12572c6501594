//! Schedule control port — the driving side of the schedule engine.
//!
//! Services and the HTTP layer talk to the engine through this trait so they
//! do not carry the engine's adapter generics around.

use std::future::Future;

use plugsched_domain::error::PlugSchedError;
use plugsched_domain::trigger::ArmedTrigger;

use crate::schedule_engine::{EngineStatus, RebuildReport};

pub trait ScheduleControl: Send + Sync {
    /// Recompute and re-arm every trigger from the store.
    fn rebuild(&self) -> impl Future<Output = Result<RebuildReport, PlugSchedError>> + Send;

    /// Consistent copy of the currently armed triggers, ordered by due time.
    fn snapshot(&self) -> Vec<ArmedTrigger>;

    fn status(&self) -> EngineStatus;
}
