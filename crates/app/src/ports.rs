//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod device;
pub mod oracle;
pub mod schedule_control;
pub mod schedule_store;

pub use clock::{Clock, SystemClock};
pub use device::DevicePort;
pub use oracle::{OccupancyOracle, SolarTimeOracle};
pub use schedule_control::ScheduleControl;
pub use schedule_store::ScheduleStore;
