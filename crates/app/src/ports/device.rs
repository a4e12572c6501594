//! Device port — discovery and power control of smart plugs.

use std::future::Future;
use std::time::Duration;

use plugsched_domain::device::DeviceDescriptor;
use plugsched_domain::error::PlugSchedError;

/// Transport to the plugs on the local network.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`). Address
/// resolution, retries and discovery deadlines are handled by
/// [`DeviceActuator`](crate::actuator::DeviceActuator); a port only has to
/// perform single operations.
pub trait DevicePort: Send + Sync {
    /// Listen for plugs for `window` and return everything that answered.
    fn discover(
        &self,
        window: Duration,
    ) -> impl Future<Output = Result<Vec<DeviceDescriptor>, PlugSchedError>> + Send;

    /// Switch the plug at `address` on or off.
    fn set_power(
        &self,
        address: &str,
        on: bool,
    ) -> impl Future<Output = Result<(), PlugSchedError>> + Send;
}
