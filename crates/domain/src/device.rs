//! Device — a networked smart plug a schedule switches on or off.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlugSchedError, ValidationError};

/// How a schedule points at its plug.
///
/// The textual form (`address:<host>` / `id:<device id>`) is what storage and
/// the JSON API carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceRef {
    /// A network address that can be commanded directly.
    Address(String),
    /// A stable device identifier that must be resolved through discovery.
    Id(String),
}

impl DeviceRef {
    /// The raw value without its kind prefix.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Address(v) | Self::Id(v) => v,
        }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(host) => write!(f, "address:{host}"),
            Self::Id(id) => write!(f, "id:{id}"),
        }
    }
}

impl FromStr for DeviceRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedDeviceRef(s.to_string());
        let (kind, value) = s.split_once(':').ok_or_else(malformed)?;
        if value.is_empty() {
            return Err(malformed());
        }
        match kind {
            "address" => Ok(Self::Address(value.to_string())),
            "id" => Ok(Self::Id(value.to_string())),
            _ => Err(malformed()),
        }
    }
}

impl TryFrom<String> for DeviceRef {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceRef> for String {
    fn from(value: DeviceRef) -> Self {
        value.to_string()
    }
}

/// A registered plug, joined onto schedules at rebuild time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_ref: DeviceRef,
    pub name: String,
    /// Room or group the plug belongs to; drives occupancy gating.
    pub room: Option<String>,
    /// Static address used when resolving `device_ref` fails.
    pub fallback_address: Option<String>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), PlugSchedError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    device_ref: Option<DeviceRef>,
    name: Option<String>,
    room: Option<String>,
    fallback_address: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn device_ref(mut self, device_ref: DeviceRef) -> Self {
        self.device_ref = Some(device_ref);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn fallback_address(mut self, address: impl Into<String>) -> Self {
        self.fallback_address = Some(address.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::Validation`] if the name is empty or the
    /// reference is missing.
    pub fn build(self) -> Result<Device, PlugSchedError> {
        let device_ref = self
            .device_ref
            .ok_or_else(|| ValidationError::MalformedDeviceRef(String::new()))?;
        let device = Device {
            device_ref,
            name: self.name.unwrap_or_default(),
            room: self.room,
            fallback_address: self.fallback_address,
        };
        device.validate()?;
        Ok(device)
    }
}

/// A plug found on the network during a bounded discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable identifier reported by the plug.
    pub device_id: String,
    /// Address the plug answered from.
    pub address: String,
    /// Human label reported by the plug.
    pub alias: String,
    /// Power state at discovery time, when reported.
    pub power: Option<bool>,
}
