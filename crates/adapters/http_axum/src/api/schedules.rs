//! JSON REST handlers for schedules.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use plugsched_app::ports::{DevicePort, ScheduleControl, ScheduleStore};
use plugsched_app::schedule_engine::RebuildReport;
use plugsched_app::services::schedule_service::MutationOutcome;
use plugsched_domain::device::DeviceRef;
use plugsched_domain::id::ScheduleId;
use plugsched_domain::schedule::{OverridePolicy, SchedulePatch, ScheduleRecord};

use super::parse_schedule_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a schedule.
#[derive(Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub device_ref: DeviceRef,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub desired_power: Option<bool>,
    pub active: Option<bool>,
    #[serde(default)]
    pub override_policy: OverridePolicy,
}

impl From<CreateScheduleRequest> for ScheduleRecord {
    fn from(req: CreateScheduleRequest) -> Self {
        Self {
            id: ScheduleId::new(),
            name: req.name,
            device_ref: req.device_ref,
            hour: req.hour,
            minute: req.minute,
            desired_power: req.desired_power.unwrap_or(true),
            active: req.active.unwrap_or(true),
            override_policy: req.override_policy,
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<MutationOutcome<ScheduleRecord>>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// `GET /api/schedules` — list every schedule.
pub async fn list<R, D, E>(
    State(state): State<AppState<R, D, E>>,
) -> Result<Json<Vec<ScheduleRecord>>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let schedules = state.schedule_service.list_schedules().await?;
    Ok(Json(schedules))
}

/// `GET /api/schedules/{id}` — get one schedule.
pub async fn get<R, D, E>(
    State(state): State<AppState<R, D, E>>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleRecord>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let id = parse_schedule_id(&id)?;
    let schedule = state.schedule_service.get_schedule(id).await?;
    Ok(Json(schedule))
}

/// `POST /api/schedules` — create a schedule and resync the engine.
pub async fn create<R, D, E>(
    State(state): State<AppState<R, D, E>>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<CreateResponse, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let outcome = state.schedule_service.create_schedule(req.into()).await?;
    Ok(CreateResponse::Created(Json(outcome)))
}

/// `PUT /api/schedules/{id}` — partially update a schedule and resync.
pub async fn update<R, D, E>(
    State(state): State<AppState<R, D, E>>,
    Path(id): Path<String>,
    Json(patch): Json<SchedulePatch>,
) -> Result<Json<MutationOutcome<ScheduleRecord>>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let id = parse_schedule_id(&id)?;
    let outcome = state.schedule_service.update_schedule(id, patch).await?;
    Ok(Json(outcome))
}

/// `DELETE /api/schedules/{id}` — delete a schedule and resync.
pub async fn delete<R, D, E>(
    State(state): State<AppState<R, D, E>>,
    Path(id): Path<String>,
) -> Result<Json<MutationOutcome<()>>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let id = parse_schedule_id(&id)?;
    let outcome = state.schedule_service.delete_schedule(id).await?;
    Ok(Json(outcome))
}

/// `POST /api/schedules/rebuild` — force a full resync.
pub async fn rebuild<R, D, E>(
    State(state): State<AppState<R, D, E>>,
) -> Result<Json<RebuildReport>, ApiError>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    let report = state.schedule_service.rebuild().await?;
    Ok(Json(report))
}
