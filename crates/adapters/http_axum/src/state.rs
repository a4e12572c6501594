//! Shared application state for axum handlers.

use std::sync::Arc;

use plugsched_app::ports::{DevicePort, ScheduleControl, ScheduleStore};
use plugsched_app::services::device_service::DeviceService;
use plugsched_app::services::schedule_service::ScheduleService;

/// Application state shared across all axum handlers.
///
/// Generic over the store, the device port and the engine handle to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<R, D, E> {
    pub schedule_service: Arc<ScheduleService<R, E>>,
    pub device_service: Arc<DeviceService<D, R>>,
    /// Read side of the engine, for trigger introspection.
    pub engine: Arc<E>,
}

impl<R, D, E> Clone for AppState<R, D, E> {
    fn clone(&self) -> Self {
        Self {
            schedule_service: Arc::clone(&self.schedule_service),
            device_service: Arc::clone(&self.device_service),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R, D, E> AppState<R, D, E>
where
    R: ScheduleStore + 'static,
    D: DevicePort + 'static,
    E: ScheduleControl + 'static,
{
    pub fn new(
        schedule_service: ScheduleService<R, E>,
        device_service: DeviceService<D, R>,
        engine: E,
    ) -> Self {
        Self {
            schedule_service: Arc::new(schedule_service),
            device_service: Arc::new(device_service),
            engine: Arc::new(engine),
        }
    }
}
