//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use plugsched_app::ports::{DevicePort, ScheduleControl, ScheduleStore};
use plugsched_domain::device::{Device, DeviceDescriptor, DeviceRef};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for switching a plug by hand.
#[derive(Deserialize)]
pub struct SetPowerRequest {
    pub device: DeviceRef,
    pub power: bool,
}

/// `GET /api/devices` — list registered devices.
pub async fn list<R, D, E>(
    State(state): State<AppState<R, D, E>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(Json(devices))
}

/// `POST /api/devices` — register or replace a device.
pub async fn upsert<R, D, E>(
    State(state): State<AppState<R, D, E>>,
    Json(device): Json<Device>,
) -> Result<Json<Device>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let device = state.device_service.upsert_device(device).await?;
    Ok(Json(device))
}

/// `GET /api/devices/discover` — run one bounded discovery.
pub async fn discover<R, D, E>(
    State(state): State<AppState<R, D, E>>,
) -> Result<Json<Vec<DeviceDescriptor>>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let found = state.device_service.discover().await?;
    Ok(Json(found))
}

/// `PUT /api/devices/power` — switch a plug right now.
pub async fn set_power<R, D, E>(
    State(state): State<AppState<R, D, E>>,
    Json(req): Json<SetPowerRequest>,
) -> Result<StatusCode, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    state
        .device_service
        .set_power(&req.device, req.power)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
