//! Oracle ports — read-only environmental facts the engine consults.
//!
//! Oracle failures are always recoverable: the resolver decides how to fail
//! safe, so implementations should simply report the error.

use std::future::Future;

use plugsched_domain::error::PlugSchedError;
use plugsched_domain::time::TimeOfDay;

/// Today's sunrise and sunset, in local time.
pub trait SolarTimeOracle: Send + Sync {
    fn sunrise(&self) -> impl Future<Output = Result<TimeOfDay, PlugSchedError>> + Send;

    fn sunset(&self) -> impl Future<Output = Result<TimeOfDay, PlugSchedError>> + Send;
}

/// Whether a household member is expected home today.
pub trait OccupancyOracle: Send + Sync {
    /// `Ok(None)` means the oracle answered but does not know.
    fn expected_home_today(
        &self,
    ) -> impl Future<Output = Result<Option<bool>, PlugSchedError>> + Send;
}
