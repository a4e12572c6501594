//! Virtual plug — a simulated smart plug holding an on/off state.

use plugsched_domain::device::DeviceDescriptor;
use serde::Deserialize;

/// Inventory entry describing one simulated plug.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VirtualPlug {
    /// Stable identifier reported during discovery.
    pub device_id: String,
    /// Address the plug answers on.
    pub address: String,
    /// Human label reported during discovery.
    pub alias: String,
    /// Initial power state.
    #[serde(default)]
    pub power: bool,
    /// An unreachable plug neither answers discovery nor accepts commands.
    #[serde(default = "reachable_by_default")]
    pub reachable: bool,
}

fn reachable_by_default() -> bool {
    true
}

impl VirtualPlug {
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        address: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            address: address.into(),
            alias: alias.into(),
            power: false,
            reachable: true,
        }
    }

    pub(crate) fn describe(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            device_id: self.device_id.clone(),
            address: self.address.clone(),
            alias: self.alias.clone(),
            power: Some(self.power),
        }
    }
}

/// Why a simulated plug refused a command.
#[derive(Debug, thiserror::Error)]
pub enum PlugError {
    #[error("no plug answers at {0}")]
    NoSuchPlug(String),

    #[error("plug at {0} is unreachable")]
    Unreachable(String),
}
