//! Engine introspection.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use plugsched_app::ports::{DevicePort, ScheduleControl, ScheduleStore};
use plugsched_app::schedule_engine::EngineStatus;
use plugsched_domain::trigger::ArmedTrigger;

use crate::state::AppState;

#[derive(Serialize)]
pub struct TriggersView {
    pub status: EngineStatus,
    pub triggers: Vec<ArmedTrigger>,
}

/// `GET /api/triggers` — armed triggers and engine status.
pub async fn list<R, D, E>(State(state): State<AppState<R, D, E>>) -> Json<TriggersView>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    Json(TriggersView {
        status: state.engine.status(),
        triggers: state.engine.snapshot(),
    })
}
