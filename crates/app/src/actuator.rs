//! Device actuation — resolving a plug and switching it with bounded retry.

use std::time::Duration;

use plugsched_domain::device::{DeviceDescriptor, DeviceRef};
use plugsched_domain::error::{DeviceError, PlugSchedError};
use plugsched_domain::trigger::ResolvedTrigger;

use crate::ports::DevicePort;

/// Slack granted to a device port on top of the discovery window before the
/// discovery is abandoned.
const DISCOVERY_GRACE: Duration = Duration::from_secs(2);

/// How often and how patiently a power command is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retry.
    #[must_use]
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

/// Turns "switch this plug" into commands on a [`DevicePort`].
pub struct DeviceActuator<D> {
    port: D,
    retry: RetryPolicy,
    discovery_window: Duration,
}

impl<D: DevicePort> DeviceActuator<D> {
    pub fn new(port: D, retry: RetryPolicy, discovery_window: Duration) -> Self {
        Self {
            port,
            retry,
            discovery_window,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Discover plugs, giving up shortly after the discovery window.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Discovery`] when the port fails or overruns
    /// its window.
    pub async fn discover(&self) -> Result<Vec<DeviceDescriptor>, PlugSchedError> {
        let deadline = self.discovery_window + DISCOVERY_GRACE;
        match tokio::time::timeout(deadline, self.port.discover(self.discovery_window)).await {
            Ok(found) => found,
            Err(elapsed) => Err(DeviceError::Discovery(Box::new(elapsed)).into()),
        }
    }

    /// Network address to command for `device_ref`.
    ///
    /// Addresses are used as-is. Ids are looked up through discovery; when
    /// that fails or finds nothing, `fallback` is used.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unresolved`] when an id cannot be found and no
    /// fallback is configured.
    pub async fn resolve_address(
        &self,
        device_ref: &DeviceRef,
        fallback: Option<&str>,
    ) -> Result<String, PlugSchedError> {
        let id = match device_ref {
            DeviceRef::Address(address) => return Ok(address.clone()),
            DeviceRef::Id(id) => id,
        };
        match self.discover().await {
            Ok(found) => {
                if let Some(descriptor) = found.into_iter().find(|d| &d.device_id == id) {
                    return Ok(descriptor.address);
                }
                tracing::debug!(device = %device_ref, "device not seen during discovery");
            }
            Err(err) => {
                tracing::warn!(device = %device_ref, error = %err, "discovery failed");
            }
        }
        match fallback {
            Some(address) => {
                tracing::info!(device = %device_ref, address, "using fallback address");
                Ok(address.to_string())
            }
            None => Err(DeviceError::Unresolved(device_ref.to_string()).into()),
        }
    }

    /// Switch a plug, retrying per the configured [`RetryPolicy`].
    ///
    /// Retries sleep on the tokio timer, so only the calling task waits.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once every attempt has failed.
    #[tracing::instrument(skip(self, device_ref, fallback), fields(device = %device_ref))]
    pub async fn apply(
        &self,
        device_ref: &DeviceRef,
        fallback: Option<&str>,
        on: bool,
    ) -> Result<(), PlugSchedError> {
        self.apply_with(device_ref, fallback, on, self.retry).await
    }

    /// Switch a plug with a single attempt.
    ///
    /// # Errors
    ///
    /// Returns the resolution or command error.
    pub async fn apply_once(
        &self,
        device_ref: &DeviceRef,
        fallback: Option<&str>,
        on: bool,
    ) -> Result<(), PlugSchedError> {
        self.apply_with(device_ref, fallback, on, RetryPolicy::once())
            .await
    }

    async fn apply_with(
        &self,
        device_ref: &DeviceRef,
        fallback: Option<&str>,
        on: bool,
        retry: RetryPolicy,
    ) -> Result<(), PlugSchedError> {
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.attempt(device_ref, fallback, on).await {
                Ok(()) => {
                    tracing::info!(power = on, attempt, "power command applied");
                    return Ok(());
                }
                Err(err) if attempt < max_attempts => {
                    tracing::warn!(
                        power = on,
                        attempt,
                        max_attempts,
                        retry_in_secs = retry.delay.as_secs(),
                        error = %err,
                        "power command failed, retrying"
                    );
                    tokio::time::sleep(retry.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(power = on, attempts = attempt, error = %err, "giving up on power command");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(
        &self,
        device_ref: &DeviceRef,
        fallback: Option<&str>,
        on: bool,
    ) -> Result<(), PlugSchedError> {
        let address = self.resolve_address(device_ref, fallback).await?;
        self.port.set_power(&address, on).await
    }

    /// Carry out a fired trigger. A terminal failure is logged and dropped so
    /// it only affects this one firing.
    pub async fn fire(&self, trigger: &ResolvedTrigger) {
        let result = self
            .apply(
                &trigger.device_ref,
                trigger.fallback_address.as_deref(),
                trigger.desired_power,
            )
            .await;
        if let Err(err) = result {
            tracing::error!(
                schedule_id = %trigger.schedule_id,
                schedule = %trigger.schedule_name,
                error = %err,
                "scheduled power change failed"
            );
        }
    }
}
