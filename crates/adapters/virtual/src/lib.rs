//! # plugsched-adapter-virtual
//!
//! Virtual/demo device adapter that simulates smart plugs on the local
//! network, for testing and demonstration purposes.
//!
//! Plugs answer discovery after a configurable simulated latency; a plug whose
//! latency exceeds the discovery window is not reported, exactly like a slow
//! plug on a real network.
//!
//! ## Dependency rule
//!
//! Depends on `plugsched-app` (port traits) and `plugsched-domain` only.

mod plug;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use plugsched_app::ports::DevicePort;
use plugsched_domain::device::DeviceDescriptor;
use plugsched_domain::error::{DeviceError, PlugSchedError};
use tokio::sync::RwLock;

pub use plug::{PlugError, VirtualPlug};

/// A simulated network of smart plugs, keyed by address.
///
/// Cheap to clone; clones share the same plugs.
#[derive(Clone, Default)]
pub struct VirtualPlugs {
    plugs: Arc<RwLock<BTreeMap<String, VirtualPlug>>>,
    latency: Duration,
}

impl VirtualPlugs {
    #[must_use]
    pub fn new(plugs: impl IntoIterator<Item = VirtualPlug>) -> Self {
        let plugs = plugs
            .into_iter()
            .map(|plug| (plug.address.clone(), plug))
            .collect();
        Self {
            plugs: Arc::new(RwLock::new(plugs)),
            latency: Duration::ZERO,
        }
    }

    /// Delay before plugs answer a discovery.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Current power state of the plug at `address`.
    pub async fn power(&self, address: &str) -> Option<bool> {
        self.plugs.read().await.get(address).map(|plug| plug.power)
    }

    /// Take a plug off (or back onto) the network.
    pub async fn set_reachable(&self, address: &str, reachable: bool) {
        if let Some(plug) = self.plugs.write().await.get_mut(address) {
            plug.reachable = reachable;
        }
    }
}

impl DevicePort for VirtualPlugs {
    async fn discover(&self, window: Duration) -> Result<Vec<DeviceDescriptor>, PlugSchedError> {
        tokio::time::sleep(self.latency.min(window)).await;
        if self.latency > window {
            return Ok(Vec::new());
        }
        let found: Vec<_> = self
            .plugs
            .read()
            .await
            .values()
            .filter(|plug| plug.reachable)
            .map(VirtualPlug::describe)
            .collect();
        tracing::debug!(count = found.len(), "virtual discovery");
        Ok(found)
    }

    async fn set_power(&self, address: &str, on: bool) -> Result<(), PlugSchedError> {
        let mut plugs = self.plugs.write().await;
        let refuse = |source: PlugError| DeviceError::Command {
            address: address.to_string(),
            source: Box::new(source),
        };
        let plug = plugs
            .get_mut(address)
            .ok_or_else(|| refuse(PlugError::NoSuchPlug(address.to_string())))?;
        if !plug.reachable {
            return Err(refuse(PlugError::Unreachable(address.to_string())).into());
        }
        plug.power = on;
        tracing::info!(address, power = on, alias = %plug.alias, "virtual plug switched");
        Ok(())
    }
}
