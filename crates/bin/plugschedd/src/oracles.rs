//! Oracle selection — HTTP-backed when configured, otherwise always failing.
//!
//! A missing oracle behaves like an unreachable one, so the resolver's
//! fail-safe rules apply unchanged.

use plugsched_adapter_oracle_http::{HttpOccupancyOracle, HttpSolarOracle, OracleError};
use plugsched_app::ports::{OccupancyOracle, SolarTimeOracle};
use plugsched_domain::error::PlugSchedError;
use plugsched_domain::time::TimeOfDay;

use crate::config::OraclesConfig;

#[derive(Debug, thiserror::Error)]
#[error("{0} oracle is not configured")]
struct NotConfigured(&'static str);

fn not_configured(which: &'static str) -> PlugSchedError {
    PlugSchedError::Oracle(Box::new(NotConfigured(which)))
}

pub enum Solar {
    Http(HttpSolarOracle),
    Disabled,
}

impl Solar {
    pub fn from_config(config: &OraclesConfig) -> Result<Self, OracleError> {
        match &config.solar_url {
            Some(url) => Ok(Self::Http(HttpSolarOracle::new(url.as_str(), config.timeout())?)),
            None => {
                tracing::warn!("no solar oracle configured, solar overrides use literal times");
                Ok(Self::Disabled)
            }
        }
    }
}

impl SolarTimeOracle for Solar {
    async fn sunrise(&self) -> Result<TimeOfDay, PlugSchedError> {
        match self {
            Self::Http(oracle) => oracle.sunrise().await,
            Self::Disabled => Err(not_configured("solar")),
        }
    }

    async fn sunset(&self) -> Result<TimeOfDay, PlugSchedError> {
        match self {
            Self::Http(oracle) => oracle.sunset().await,
            Self::Disabled => Err(not_configured("solar")),
        }
    }
}

pub enum Occupancy {
    Http(HttpOccupancyOracle),
    Disabled,
}

impl Occupancy {
    pub fn from_config(config: &OraclesConfig) -> Result<Self, OracleError> {
        match &config.occupancy_url {
            Some(url) => Ok(Self::Http(HttpOccupancyOracle::new(
                url.as_str(),
                config.timeout(),
            )?)),
            None => {
                tracing::warn!("no occupancy oracle configured, gated schedules stay suppressed");
                Ok(Self::Disabled)
            }
        }
    }
}

impl OccupancyOracle for Occupancy {
    async fn expected_home_today(&self) -> Result<Option<bool>, PlugSchedError> {
        match self {
            Self::Http(oracle) => oracle.expected_home_today().await,
            Self::Disabled => Err(not_configured("occupancy")),
        }
    }
}
