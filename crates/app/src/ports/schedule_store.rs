//! Schedule store port — persistence for schedules and registered devices.

use std::future::Future;

use plugsched_domain::device::Device;
use plugsched_domain::error::PlugSchedError;
use plugsched_domain::id::ScheduleId;
use plugsched_domain::schedule::{SchedulePatch, ScheduleRecord, StoredSchedule};

/// Repository for [`ScheduleRecord`]s and the [`Device`]s they point at.
pub trait ScheduleStore: Send + Sync {
    /// All active schedules, each joined with its registered device (if any).
    ///
    /// A row that cannot be decoded comes back as its own `Err` entry; the
    /// outer error is reserved for the listing itself failing.
    fn list_active(
        &self,
    ) -> impl Future<Output = Result<Vec<StoredSchedule>, PlugSchedError>> + Send;

    /// All schedules, active or not.
    fn list_all(&self) -> impl Future<Output = Result<Vec<ScheduleRecord>, PlugSchedError>> + Send;

    fn get_by_id(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<ScheduleRecord>, PlugSchedError>> + Send;

    fn create(
        &self,
        record: ScheduleRecord,
    ) -> impl Future<Output = Result<ScheduleRecord, PlugSchedError>> + Send;

    /// Apply `patch` to the stored schedule and return the updated record.
    ///
    /// Fails with [`PlugSchedError::NotFound`] when `id` does not exist.
    fn update(
        &self,
        id: ScheduleId,
        patch: SchedulePatch,
    ) -> impl Future<Output = Result<ScheduleRecord, PlugSchedError>> + Send;

    /// Fails with [`PlugSchedError::NotFound`] when `id` does not exist.
    fn delete(&self, id: ScheduleId) -> impl Future<Output = Result<(), PlugSchedError>> + Send;

    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, PlugSchedError>> + Send;

    /// Create or replace the device registered under `device.device_ref`.
    fn upsert_device(
        &self,
        device: Device,
    ) -> impl Future<Output = Result<Device, PlugSchedError>> + Send;
}
