//! Schedule engine — keeps the trigger registry in sync with the store.
//!
//! A rebuild loads every active schedule, resolves its effective fire time,
//! and swaps the whole armed set in one go. Rebuilds are serialised; a daily
//! self-rebuild keeps solar-derived times current without restarts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::NaiveDateTime;
use plugsched_domain::error::PlugSchedError;
use plugsched_domain::time::{TimeOfDay, Timestamp};
use plugsched_domain::trigger::{ArmedTrigger, FireAt, ResolvedTrigger};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::actuator::DeviceActuator;
use crate::ports::{Clock, DevicePort, OccupancyOracle, ScheduleControl, ScheduleStore, SolarTimeOracle};
use crate::registry::TriggerRegistry;
use crate::resolver::TimeOverrideResolver;

/// Where the engine currently is in a rebuild cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    Loading,
    Resolving,
    Arming,
    Stopped,
}

/// Counters of a completed rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub armed: usize,
    /// Schedules an override policy suppressed for this cycle.
    pub suppressed: usize,
    /// Misconfigured schedules left out of this cycle.
    pub skipped: usize,
}

/// Introspection view of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub phase: EnginePhase,
    pub last_rebuild_at: Option<Timestamp>,
    pub last_report: Option<RebuildReport>,
    /// Error of the most recent rebuild, cleared by the next successful one.
    pub last_error: Option<String>,
    /// Local time of the next daily self-rebuild.
    pub next_rebuild_at: Option<NaiveDateTime>,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            phase: EnginePhase::Idle,
            last_rebuild_at: None,
            last_report: None,
            last_error: None,
            next_rebuild_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Local time of the daily self-rebuild.
    pub rebuild_at: TimeOfDay,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rebuild_at: TimeOfDay::new(3, 5).unwrap_or_default(),
        }
    }
}

/// The daily rebuild wakes this long after `rebuild_at`, so a trigger due at
/// that exact minute has already fired.
const DAILY_REBUILD_SETTLE: Duration = Duration::from_secs(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<S, D, SO, OO, C> {
    store: S,
    resolver: TimeOverrideResolver<SO, OO>,
    actuator: Arc<DeviceActuator<D>>,
    clock: C,
    config: EngineConfig,
    registry: Arc<TriggerRegistry>,
    rebuild_lock: tokio::sync::Mutex<()>,
    status: Mutex<EngineStatus>,
    daily: Mutex<Option<JoinHandle<()>>>,
}

/// Owns the trigger registry and every rebuild of it.
///
/// Cheap to clone; all clones drive the same registry.
pub struct ScheduleEngine<S, D, SO, OO, C> {
    inner: Arc<Inner<S, D, SO, OO, C>>,
}

impl<S, D, SO, OO, C> Clone for ScheduleEngine<S, D, SO, OO, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, D, SO, OO, C> ScheduleEngine<S, D, SO, OO, C>
where
    S: ScheduleStore + 'static,
    D: DevicePort + 'static,
    SO: SolarTimeOracle + 'static,
    OO: OccupancyOracle + 'static,
    C: Clock + 'static,
{
    pub fn new(
        store: S,
        resolver: TimeOverrideResolver<SO, OO>,
        actuator: Arc<DeviceActuator<D>>,
        clock: C,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                resolver,
                actuator,
                clock,
                config,
                registry: Arc::new(TriggerRegistry::new()),
                rebuild_lock: tokio::sync::Mutex::new(()),
                status: Mutex::new(EngineStatus::default()),
                daily: Mutex::new(None),
            }),
        }
    }

    /// Reload every active schedule and atomically re-arm the registry.
    ///
    /// Concurrent calls queue behind each other. Misconfigured or unreadable
    /// schedules are skipped and suppressed ones left unarmed; neither fails
    /// the batch. Also makes sure the daily self-rebuild is armed, even when
    /// this rebuild fails.
    ///
    /// # Errors
    ///
    /// Returns the store error when schedules cannot be loaded, in which case
    /// the previously armed triggers stay untouched, or
    /// [`PlugSchedError::EngineStopped`] after [`shutdown`](Self::shutdown).
    pub async fn rebuild(&self) -> Result<RebuildReport, PlugSchedError> {
        let inner = &self.inner;
        let _serialised = inner.rebuild_lock.lock().await;
        if inner.registry.is_closed() {
            return Err(PlugSchedError::EngineStopped);
        }
        self.ensure_daily_rebuild();

        self.set_phase(EnginePhase::Loading);
        let schedules = match inner.store.list_active().await {
            Ok(schedules) => schedules,
            Err(err) => {
                tracing::error!(error = %err, "failed to load schedules, keeping armed triggers");
                self.finish(Err(&err));
                return Err(err);
            }
        };

        self.set_phase(EnginePhase::Resolving);
        let mut report = RebuildReport::default();
        let mut triggers = Vec::with_capacity(schedules.len());
        for stored in &schedules {
            let schedule = match stored {
                Ok(schedule) => schedule,
                Err(malformed) => {
                    tracing::warn!(
                        schedule_id = %malformed.id,
                        error = %malformed.reason,
                        "skipping malformed schedule"
                    );
                    report.skipped += 1;
                    continue;
                }
            };
            let record = &schedule.record;
            let base = match record.base_time() {
                Ok(base) => base,
                Err(err) => {
                    tracing::warn!(
                        schedule_id = %record.id,
                        schedule = %record.name,
                        error = %err,
                        "skipping misconfigured schedule"
                    );
                    report.skipped += 1;
                    continue;
                }
            };
            let fire_at = inner
                .resolver
                .resolve(
                    base,
                    record.override_policy,
                    record.desired_power,
                    schedule.room(),
                )
                .await;
            match fire_at {
                FireAt::At(time) => triggers.push(ResolvedTrigger::snapshot(schedule, time)),
                FireAt::Suppressed => {
                    tracing::info!(schedule_id = %record.id, schedule = %record.name, "schedule suppressed today");
                    report.suppressed += 1;
                }
            }
        }

        self.set_phase(EnginePhase::Arming);
        let actuator = Arc::clone(&inner.actuator);
        let armed = inner
            .registry
            .replace_all(triggers, inner.clock.now(), move |trigger| {
                let actuator = Arc::clone(&actuator);
                async move { actuator.fire(&trigger).await }
            });
        report.armed = match armed {
            Ok(armed) => armed,
            Err(err) => {
                self.finish(Err(&err));
                return Err(err);
            }
        };

        self.finish(Ok(report));
        tracing::info!(
            armed = report.armed,
            suppressed = report.suppressed,
            skipped = report.skipped,
            "schedules rebuilt"
        );
        Ok(report)
    }

    /// Cancel every armed trigger and the daily rebuild, and refuse further
    /// rebuilds. Actions already dispatched run to completion.
    pub fn shutdown(&self) {
        self.inner.registry.close();
        if let Some(daily) = lock(&self.inner.daily).take() {
            daily.abort();
        }
        lock(&self.inner.status).phase = EnginePhase::Stopped;
        tracing::info!("schedule engine stopped");
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ArmedTrigger> {
        self.inner.registry.snapshot()
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let mut status = lock(&self.inner.status).clone();
        if self.daily_running() && status.phase != EnginePhase::Stopped {
            status.next_rebuild_at = Some(
                self.inner
                    .config
                    .rebuild_at
                    .next_occurrence(self.inner.clock.now()),
            );
        }
        status
    }

    fn set_phase(&self, phase: EnginePhase) {
        let mut status = lock(&self.inner.status);
        if status.phase != EnginePhase::Stopped {
            status.phase = phase;
        }
    }

    fn finish(&self, outcome: Result<RebuildReport, &PlugSchedError>) {
        let mut status = lock(&self.inner.status);
        if status.phase != EnginePhase::Stopped {
            status.phase = EnginePhase::Idle;
        }
        match outcome {
            Ok(report) => {
                status.last_rebuild_at = Some(plugsched_domain::time::now());
                status.last_report = Some(report);
                status.last_error = None;
            }
            Err(err) => status.last_error = Some(err.to_string()),
        }
    }

    fn daily_running(&self) -> bool {
        lock(&self.inner.daily)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the daily self-rebuild unless it is already running or the
    /// engine is stopped.
    fn ensure_daily_rebuild(&self) {
        let mut daily = lock(&self.inner.daily);
        if daily.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        // `shutdown` closes the registry before taking this lock.
        if self.inner.registry.is_closed() {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        *daily = Some(tokio::spawn(daily_rebuild(weak)));
        tracing::debug!(at = %self.inner.config.rebuild_at, "daily rebuild armed");
    }
}

async fn daily_rebuild<S, D, SO, OO, C>(inner: Weak<Inner<S, D, SO, OO, C>>)
where
    S: ScheduleStore + 'static,
    D: DevicePort + 'static,
    SO: SolarTimeOracle + 'static,
    OO: OccupancyOracle + 'static,
    C: Clock + 'static,
{
    loop {
        let delay = {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let now = inner.clock.now();
            let due = inner.config.rebuild_at.next_occurrence(now);
            (due - now).to_std().unwrap_or(Duration::ZERO) + DAILY_REBUILD_SETTLE
        };
        tokio::time::sleep(delay).await;

        let Some(inner) = inner.upgrade() else {
            return;
        };
        tracing::info!("daily schedule rebuild");
        let engine = ScheduleEngine { inner };
        if let Err(err) = engine.rebuild().await {
            tracing::warn!(error = %err, "daily schedule rebuild failed");
        }
    }
}

impl<S, D, SO, OO, C> ScheduleControl for ScheduleEngine<S, D, SO, OO, C>
where
    S: ScheduleStore + 'static,
    D: DevicePort + 'static,
    SO: SolarTimeOracle + 'static,
    OO: OccupancyOracle + 'static,
    C: Clock + 'static,
{
    async fn rebuild(&self) -> Result<RebuildReport, PlugSchedError> {
        ScheduleEngine::rebuild(self).await
    }

    fn snapshot(&self) -> Vec<ArmedTrigger> {
        ScheduleEngine::snapshot(self)
    }

    fn status(&self) -> EngineStatus {
        ScheduleEngine::status(self)
    }
}
