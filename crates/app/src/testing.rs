//! In-memory fakes of every port, shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use plugsched_domain::device::{Device, DeviceDescriptor, DeviceRef};
use plugsched_domain::error::{DeviceError, NotFoundError, PlugSchedError};
use plugsched_domain::id::ScheduleId;
use plugsched_domain::schedule::{
    ActiveSchedule, MalformedSchedule, SchedulePatch, ScheduleRecord, StoredSchedule,
};
use plugsched_domain::time::TimeOfDay;

use crate::ports::{Clock, DevicePort, OccupancyOracle, ScheduleStore, SolarTimeOracle};

pub fn tod(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

pub fn local(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 20)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn address(host: &str) -> DeviceRef {
    DeviceRef::Address(host.to_string())
}

pub fn schedule(name: &str, device_ref: DeviceRef, hour: u32, minute: u32) -> ScheduleRecord {
    ScheduleRecord::builder()
        .name(name)
        .device_ref(device_ref)
        .at(hour, minute)
        .build()
        .unwrap()
}

// ── Store ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeStore {
    schedules: Arc<Mutex<HashMap<ScheduleId, ScheduleRecord>>>,
    devices: Arc<Mutex<Vec<Device>>>,
    malformed: Arc<Mutex<Vec<MalformedSchedule>>>,
    failing: Arc<AtomicBool>,
    loads: Arc<AtomicUsize>,
}

impl FakeStore {
    pub fn with(records: Vec<ScheduleRecord>) -> Self {
        let store = Self::default();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: ScheduleRecord) {
        self.schedules.lock().unwrap().insert(record.id, record);
    }

    pub fn insert_malformed(&self, id: &str, reason: &str) {
        self.malformed.lock().unwrap().push(MalformedSchedule {
            id: id.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn add_device(&self, device: Device) {
        self.devices.lock().unwrap().push(device);
    }

    pub fn set_active(&self, id: ScheduleId, active: bool) {
        if let Some(record) = self.schedules.lock().unwrap().get_mut(&id) {
            record.active = active;
        }
    }

    pub fn remove(&self, id: ScheduleId) {
        self.schedules.lock().unwrap().remove(&id);
    }

    pub fn fail_loads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), PlugSchedError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlugSchedError::Storage("store unreachable".into()));
        }
        Ok(())
    }

    fn not_found(id: ScheduleId) -> PlugSchedError {
        NotFoundError {
            entity: "Schedule",
            id: id.to_string(),
        }
        .into()
    }
}

impl ScheduleStore for FakeStore {
    async fn list_active(&self) -> Result<Vec<StoredSchedule>, PlugSchedError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let devices = self.devices.lock().unwrap().clone();
        let mut active: Vec<ActiveSchedule> = self
            .schedules
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.active)
            .map(|record| ActiveSchedule {
                device: devices
                    .iter()
                    .find(|d| d.device_ref == record.device_ref)
                    .cloned(),
                record: record.clone(),
            })
            .collect();
        active.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        let malformed = self.malformed.lock().unwrap().clone();
        Ok(active
            .into_iter()
            .map(Ok)
            .chain(malformed.into_iter().map(Err))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ScheduleRecord>, PlugSchedError> {
        self.check()?;
        let mut all: Vec<_> = self.schedules.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn get_by_id(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>, PlugSchedError> {
        self.check()?;
        Ok(self.schedules.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, record: ScheduleRecord) -> Result<ScheduleRecord, PlugSchedError> {
        self.check()?;
        self.insert(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: ScheduleId,
        patch: SchedulePatch,
    ) -> Result<ScheduleRecord, PlugSchedError> {
        self.check()?;
        let mut schedules = self.schedules.lock().unwrap();
        let current = schedules.get(&id).cloned().ok_or_else(|| Self::not_found(id))?;
        let updated = patch.apply(current);
        schedules.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: ScheduleId) -> Result<(), PlugSchedError> {
        self.check()?;
        self.schedules
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn list_devices(&self) -> Result<Vec<Device>, PlugSchedError> {
        self.check()?;
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn upsert_device(&self, device: Device) -> Result<Device, PlugSchedError> {
        self.check()?;
        let mut devices = self.devices.lock().unwrap();
        devices.retain(|d| d.device_ref != device.device_ref);
        devices.push(device.clone());
        Ok(device)
    }
}

// ── Devices ────────────────────────────────────────────────────────

#[derive(Default)]
struct PlugState {
    descriptors: Vec<DeviceDescriptor>,
    failures_left: u32,
    always_failing: Vec<String>,
    commands: Vec<(String, bool)>,
    attempts: usize,
    discoveries: usize,
    slow_discovery: bool,
}

#[derive(Clone, Default)]
pub struct FakePlugs {
    state: Arc<Mutex<PlugState>>,
}

impl FakePlugs {
    pub fn with_descriptor(self, device_id: &str, address: &str) -> Self {
        self.state.lock().unwrap().descriptors.push(DeviceDescriptor {
            device_id: device_id.to_string(),
            address: address.to_string(),
            alias: device_id.to_string(),
            power: Some(false),
        });
        self
    }

    pub fn fail_next(&self, attempts: u32) {
        self.state.lock().unwrap().failures_left = attempts;
    }

    pub fn always_fail(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .always_failing
            .push(address.to_string());
    }

    pub fn hang_discovery(&self) {
        self.state.lock().unwrap().slow_discovery = true;
    }

    pub fn commands(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub fn discoveries(&self) -> usize {
        self.state.lock().unwrap().discoveries
    }
}

impl DevicePort for FakePlugs {
    async fn discover(&self, window: Duration) -> Result<Vec<DeviceDescriptor>, PlugSchedError> {
        let slow = {
            let mut state = self.state.lock().unwrap();
            state.discoveries += 1;
            state.slow_discovery
        };
        if slow {
            tokio::time::sleep(window * 10).await;
        }
        Ok(self.state.lock().unwrap().descriptors.clone())
    }

    async fn set_power(&self, address: &str, on: bool) -> Result<(), PlugSchedError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;
        if state.always_failing.iter().any(|a| a == address) || state.failures_left > 0 {
            state.failures_left = state.failures_left.saturating_sub(1);
            return Err(DeviceError::Command {
                address: address.to_string(),
                source: "connection refused".into(),
            }
            .into());
        }
        state.commands.push((address.to_string(), on));
        Ok(())
    }
}

// ── Oracles ────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeSolar {
    sunrise: Option<TimeOfDay>,
    sunset: Option<TimeOfDay>,
}

impl FakeSolar {
    pub fn new(sunrise: Option<&str>, sunset: Option<&str>) -> Self {
        Self {
            sunrise: sunrise.map(tod),
            sunset: sunset.map(tod),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }
}

impl SolarTimeOracle for FakeSolar {
    async fn sunrise(&self) -> Result<TimeOfDay, PlugSchedError> {
        self.sunrise
            .ok_or_else(|| PlugSchedError::Oracle("solar service unreachable".into()))
    }

    async fn sunset(&self) -> Result<TimeOfDay, PlugSchedError> {
        self.sunset
            .ok_or_else(|| PlugSchedError::Oracle("solar service unreachable".into()))
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Answer {
    Home,
    Away,
    Unknown,
    Unreachable,
}

#[derive(Clone)]
pub struct FakeOccupancy {
    answer: Answer,
    calls: Arc<AtomicUsize>,
}

impl FakeOccupancy {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OccupancyOracle for FakeOccupancy {
    async fn expected_home_today(&self) -> Result<Option<bool>, PlugSchedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answer {
            Answer::Home => Ok(Some(true)),
            Answer::Away => Ok(Some(false)),
            Answer::Unknown => Ok(None),
            Answer::Unreachable => Err(PlugSchedError::Oracle("calendar unreachable".into())),
        }
    }
}

// ── Clock ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
