//! Schedule service — use-cases for managing schedules.
//!
//! Every successful write is followed by a rebuild of the engine. The save
//! and the rebuild are reported separately: a failed rebuild never turns a
//! successful save into an error.

use plugsched_domain::error::{NotFoundError, PlugSchedError};
use plugsched_domain::id::ScheduleId;
use plugsched_domain::schedule::{SchedulePatch, ScheduleRecord};
use serde::Serialize;

use crate::ports::{ScheduleControl, ScheduleStore};
use crate::schedule_engine::RebuildReport;

/// What happened to the engine after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RebuildOutcome {
    Applied(RebuildReport),
    Failed { error: String },
}

/// Result of a successful write together with the follow-up rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome<T> {
    pub saved: T,
    pub rebuild: RebuildOutcome,
}

/// Application service for schedule CRUD operations.
pub struct ScheduleService<R, E> {
    repo: R,
    engine: E,
}

impl<R, E> ScheduleService<R, E>
where
    R: ScheduleStore,
    E: ScheduleControl,
{
    /// Create a new service backed by the given store and engine.
    pub fn new(repo: R, engine: E) -> Self {
        Self { repo, engine }
    }

    /// List every schedule, active or not.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_schedules(&self) -> Result<Vec<ScheduleRecord>, PlugSchedError> {
        self.repo.list_all().await
    }

    /// Look up a schedule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::NotFound`] when no schedule with `id` exists,
    /// or a storage error from the store.
    #[tracing::instrument(skip(self))]
    pub async fn get_schedule(&self, id: ScheduleId) -> Result<ScheduleRecord, PlugSchedError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Schedule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Create a schedule, then rebuild.
    ///
    /// New schedules must carry both an hour and a minute.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::Validation`] if invariants fail, or a
    /// storage error propagated from the store.
    #[tracing::instrument(skip(self, record), fields(schedule = %record.name))]
    pub async fn create_schedule(
        &self,
        record: ScheduleRecord,
    ) -> Result<MutationOutcome<ScheduleRecord>, PlugSchedError> {
        record.validate()?;
        record.base_time()?;
        let saved = self.repo.create(record).await?;
        Ok(self.resync(saved).await)
    }

    /// Apply a partial update, then rebuild.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::NotFound`] for an unknown id,
    /// [`PlugSchedError::Validation`] if the patched record is invalid, or a
    /// storage error propagated from the store.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_schedule(
        &self,
        id: ScheduleId,
        patch: SchedulePatch,
    ) -> Result<MutationOutcome<ScheduleRecord>, PlugSchedError> {
        let current = self.get_schedule(id).await?;
        patch.clone().apply(current).validate()?;
        let saved = self.repo.update(id, patch).await?;
        Ok(self.resync(saved).await)
    }

    /// Delete a schedule, then rebuild so its trigger is disarmed.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::NotFound`] for an unknown id, or a storage
    /// error propagated from the store.
    #[tracing::instrument(skip(self))]
    pub async fn delete_schedule(
        &self,
        id: ScheduleId,
    ) -> Result<MutationOutcome<()>, PlugSchedError> {
        self.repo.delete(id).await?;
        Ok(self.resync(()).await)
    }

    /// Force a full resync.
    ///
    /// # Errors
    ///
    /// Returns the engine's rebuild error.
    pub async fn rebuild(&self) -> Result<RebuildReport, PlugSchedError> {
        self.engine.rebuild().await
    }

    async fn resync<T>(&self, saved: T) -> MutationOutcome<T> {
        let rebuild = match self.engine.rebuild().await {
            Ok(report) => RebuildOutcome::Applied(report),
            Err(err) => {
                tracing::warn!(error = %err, "schedule saved but rebuild failed");
                RebuildOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };
        MutationOutcome { saved, rebuild }
    }
}
