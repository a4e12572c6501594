//! Trigger registry — the in-memory set of armed, one-shot timers.
//!
//! Every entry owns exactly one tokio timer task and carries a unique arming
//! number. A timer that wakes up after its entry was replaced or cancelled
//! finds a different number (or none) and does nothing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use plugsched_domain::error::PlugSchedError;
use plugsched_domain::id::ScheduleId;
use plugsched_domain::trigger::{ArmedTrigger, ResolvedTrigger};
use tokio::task::AbortHandle;

struct Entry {
    arm: u64,
    armed: ArmedTrigger,
    timer: AbortHandle,
}

#[derive(Default)]
struct RegistryState {
    next_arm: u64,
    closed: bool,
    entries: HashMap<ScheduleId, Entry>,
}

impl RegistryState {
    fn abort_all(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.timer.abort();
        }
    }
}

/// Set of armed triggers, at most one per schedule.
#[derive(Default)]
pub struct TriggerRegistry {
    state: Mutex<RegistryState>,
}

impl TriggerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically swap the armed set for `triggers`, computing due times
    /// relative to `now`.
    ///
    /// Every previous timer is cancelled. An action already dispatched by an
    /// old timer keeps running; no replaced entry fires after this returns.
    /// When `triggers` holds two entries for the same schedule the later one
    /// wins. `on_fire` runs in its own task, off the timer.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::EngineStopped`] after [`close`](Self::close).
    pub fn replace_all<F, Fut>(
        self: &Arc<Self>,
        triggers: Vec<ResolvedTrigger>,
        now: NaiveDateTime,
        on_fire: F,
    ) -> Result<usize, PlugSchedError>
    where
        F: Fn(ResolvedTrigger) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let on_fire = Arc::new(on_fire);
        let mut state = self.lock();
        if state.closed {
            return Err(PlugSchedError::EngineStopped);
        }
        state.abort_all();

        for trigger in triggers {
            state.next_arm += 1;
            let arm = state.next_arm;
            let due_at = trigger.fire_at.next_occurrence(now);
            let delay = (due_at - now).to_std().unwrap_or_default();
            let schedule_id = trigger.schedule_id;
            let armed = ArmedTrigger {
                trigger: trigger.clone(),
                due_at,
            };

            let registry = Arc::clone(self);
            let on_fire = Arc::clone(&on_fire);
            let timer = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if registry.take(schedule_id, arm) {
                    tracing::info!(
                        %schedule_id,
                        schedule = %trigger.schedule_name,
                        device = %trigger.device_ref,
                        power = trigger.desired_power,
                        "trigger fired"
                    );
                    tokio::spawn(on_fire(trigger));
                }
            });

            if let Some(previous) = state.entries.insert(
                schedule_id,
                Entry {
                    arm,
                    armed,
                    timer: timer.abort_handle(),
                },
            ) {
                previous.timer.abort();
            }
        }

        let armed = state.entries.len();
        tracing::debug!(armed, "trigger registry replaced");
        Ok(armed)
    }

    /// Claim the entry for a firing timer. Fails when the entry was replaced.
    fn take(&self, schedule_id: ScheduleId, arm: u64) -> bool {
        let mut state = self.lock();
        let current = state
            .entries
            .get(&schedule_id)
            .is_some_and(|entry| entry.arm == arm);
        if current {
            state.entries.remove(&schedule_id);
        }
        current
    }

    /// Cancel every armed timer. Cancelling an already fired or already
    /// cancelled timer is a no-op.
    pub fn cancel_all(&self) {
        self.lock().abort_all();
    }

    /// Cancel everything and refuse any further arming.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.abort_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Consistent copy of the armed set, ordered by due time.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ArmedTrigger> {
        let mut armed: Vec<ArmedTrigger> = self
            .lock()
            .entries
            .values()
            .map(|entry| entry.armed.clone())
            .collect();
        armed.sort_by(|a, b| {
            a.due_at
                .cmp(&b.due_at)
                .then_with(|| a.trigger.schedule_id.cmp(&b.trigger.schedule_id))
        });
        armed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
