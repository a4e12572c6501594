//! # plugsched-domain
//!
//! Pure domain model for the plugsched smart-plug scheduler.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, times of day
//! - Define **Schedules** (persisted "switch this plug at HH:MM" rules with an override policy)
//! - Define **Devices** (smart plugs, addressed directly or by a discoverable id)
//! - Define **Triggers** (resolved, immutable firings derived from schedules)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod schedule;
pub mod trigger;
