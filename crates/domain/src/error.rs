//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`PlugSchedError`] via `#[from]` at the port boundaries.

/// Top-level error shared by every port and use-case.
#[derive(Debug, thiserror::Error)]
pub enum PlugSchedError {
    /// A record or request broke a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The backing store failed (unreachable, corrupt row, …).
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A device could not be resolved or rejected a command.
    #[error("device error")]
    Device(#[from] DeviceError),

    /// An external oracle (solar times, occupancy) could not be consulted.
    #[error("oracle error")]
    Oracle(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The schedule engine has been shut down and refuses new work.
    #[error("schedule engine stopped")]
    EngineStopped,
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("schedule has no {0} configured")]
    MissingTime(TimeField),

    #[error("hour {0} is outside 0..=23")]
    HourOutOfRange(u32),

    #[error("minute {0} is outside 0..=59")]
    MinuteOutOfRange(u32),

    #[error("invalid time of day {0:?}, expected HH:MM")]
    MalformedTime(String),

    #[error("invalid device reference {0:?}, expected `address:<host>` or `id:<device id>`")]
    MalformedDeviceRef(String),

    #[error("invalid identifier {0:?}")]
    MalformedId(String),

    #[error("clamp window floor {floor} is after ceiling {ceiling}")]
    InvertedWindow { floor: String, ceiling: String },
}

/// Which half of a base time is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Hour,
    Minute,
}

impl std::fmt::Display for TimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hour => f.write_str("hour"),
            Self::Minute => f.write_str("minute"),
        }
    }
}

/// Lookup of a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Discovery finished without finding the device and no fallback address is configured.
    #[error("device {0} could not be resolved to an address")]
    Unresolved(String),

    /// The device was reached but the power command failed.
    #[error("device at {address} rejected the power command")]
    Command {
        address: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Discovery itself failed.
    #[error("device discovery failed")]
    Discovery(#[source] Box<dyn std::error::Error + Send + Sync>),
}
