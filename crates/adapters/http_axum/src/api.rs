//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;
pub mod triggers;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post, put};

use plugsched_app::ports::{DevicePort, ScheduleControl, ScheduleStore};
use plugsched_domain::error::ValidationError;
use plugsched_domain::id::ScheduleId;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, D, E>() -> Router<AppState<R, D, E>>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    Router::new()
        // Schedules
        .route(
            "/schedules",
            get(schedules::list::<R, D, E>).post(schedules::create::<R, D, E>),
        )
        .route("/schedules/rebuild", post(schedules::rebuild::<R, D, E>))
        .route(
            "/schedules/{id}",
            get(schedules::get::<R, D, E>)
                .put(schedules::update::<R, D, E>)
                .delete(schedules::delete::<R, D, E>),
        )
        // Devices
        .route(
            "/devices",
            get(devices::list::<R, D, E>).post(devices::upsert::<R, D, E>),
        )
        .route("/devices/discover", get(devices::discover::<R, D, E>))
        .route("/devices/power", put(devices::set_power::<R, D, E>))
        // Engine
        .route("/triggers", get(triggers::list::<R, D, E>))
}

pub(crate) fn parse_schedule_id(raw: &str) -> Result<ScheduleId, ApiError> {
    ScheduleId::from_str(raw).map_err(|_| ValidationError::MalformedId(raw.to_string()).into())
}
