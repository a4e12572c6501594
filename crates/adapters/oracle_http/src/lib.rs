//! # plugsched-adapter-oracle-http
//!
//! Oracle adapters backed by small JSON web services, using
//! [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement `SolarTimeOracle` over `GET {base}/sunrise` and
//!   `GET {base}/sunset`, each answering `{"time": "HH:MM:SS"}`
//! - Implement `OccupancyOracle` over `GET {url}`, answering
//!   `{"expected_home": true | false | null}`
//! - Bound every request with a timeout and report failures as
//!   recoverable oracle errors
//!
//! ## Dependency rule
//! Depends on `plugsched-app` (for port traits) and `plugsched-domain` (for domain types).

mod client;
pub mod error;
pub mod occupancy;
pub mod solar;

pub use error::OracleError;
pub use occupancy::HttpOccupancyOracle;
pub use solar::HttpSolarOracle;
