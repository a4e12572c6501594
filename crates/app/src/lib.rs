//! # plugsched-app
//!
//! Application layer — the schedule engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ScheduleStore` — schedules and registered devices
//!   - `DevicePort` — plug discovery and power commands
//!   - `SolarTimeOracle` / `OccupancyOracle` — environmental facts
//!   - `Clock` — local wall-clock time
//! - Provide the core:
//!   - `TimeOverrideResolver` — base time + override policy → effective fire time
//!   - `TriggerRegistry` — armed one-shot timers, replaced atomically
//!   - `DeviceActuator` — plug resolution and bounded retry
//!   - `ScheduleEngine` — rebuilds, daily self-rebuild, shutdown
//! - Define **driving/inbound ports** as use-case structs/traits:
//!   - `ScheduleControl` — what the outside world may ask of the engine
//!   - `ScheduleService`, `DeviceService` — API-facing use-cases
//!
//! ## Dependency rule
//! Depends on `plugsched-domain` only (plus `tokio` for timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod actuator;
pub mod ports;
pub mod registry;
pub mod resolver;
pub mod schedule_engine;
pub mod services;

#[cfg(test)]
mod testing;
