//! Device service — use-cases for discovering, registering and switching plugs.

use std::sync::Arc;

use plugsched_domain::device::{Device, DeviceDescriptor, DeviceRef};
use plugsched_domain::error::PlugSchedError;

use crate::actuator::DeviceActuator;
use crate::ports::{DevicePort, ScheduleStore};

/// Application service for plug management.
pub struct DeviceService<D, R> {
    actuator: Arc<DeviceActuator<D>>,
    repo: R,
}

impl<D, R> DeviceService<D, R>
where
    D: DevicePort,
    R: ScheduleStore,
{
    /// Create a new service sharing the engine's actuator.
    pub fn new(actuator: Arc<DeviceActuator<D>>, repo: R) -> Self {
        Self { actuator, repo }
    }

    /// Run one bounded discovery.
    ///
    /// # Errors
    ///
    /// Returns a device error when discovery fails or overruns its window.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self) -> Result<Vec<DeviceDescriptor>, PlugSchedError> {
        let found = self.actuator.discover().await?;
        tracing::info!(count = found.len(), "discovery finished");
        Ok(found)
    }

    /// List registered devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_devices(&self) -> Result<Vec<Device>, PlugSchedError> {
        self.repo.list_devices().await
    }

    /// Register a device or replace the one with the same reference.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::Validation`] if invariants fail, or a
    /// storage error propagated from the store.
    #[tracing::instrument(skip(self, device), fields(device = %device.device_ref))]
    pub async fn upsert_device(&self, device: Device) -> Result<Device, PlugSchedError> {
        device.validate()?;
        self.repo.upsert_device(device).await
    }

    /// Switch a plug right now, with a single attempt.
    ///
    /// A registered device's fallback address is honoured.
    ///
    /// # Errors
    ///
    /// Returns a device error when the plug cannot be resolved or refuses
    /// the command, or a storage error from the device lookup.
    #[tracing::instrument(skip(self, device_ref), fields(device = %device_ref))]
    pub async fn set_power(&self, device_ref: &DeviceRef, on: bool) -> Result<(), PlugSchedError> {
        let fallback = self
            .repo
            .list_devices()
            .await?
            .into_iter()
            .find(|d| &d.device_ref == device_ref)
            .and_then(|d| d.fallback_address);
        self.actuator
            .apply_once(device_ref, fallback.as_deref(), on)
            .await
    }
}
