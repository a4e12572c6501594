//! Solar oracle — today's sunrise and sunset from a weather service.

use std::time::Duration;

use plugsched_app::ports::SolarTimeOracle;
use plugsched_domain::error::PlugSchedError;
use plugsched_domain::time::TimeOfDay;
use serde::Deserialize;

use crate::client::JsonClient;
use crate::error::OracleError;

#[derive(Deserialize)]
struct SolarAnswer {
    time: TimeOfDay,
}

/// [`SolarTimeOracle`] backed by a service exposing `/sunrise` and `/sunset`.
#[derive(Clone)]
pub struct HttpSolarOracle {
    client: JsonClient,
    base_url: String,
}

impl HttpSolarOracle {
    /// # Errors
    ///
    /// Returns [`OracleError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: JsonClient::new(timeout)?,
            base_url,
        })
    }

    async fn fetch(&self, event: &str) -> Result<TimeOfDay, PlugSchedError> {
        let url = format!("{}/{event}", self.base_url);
        let answer: SolarAnswer = self.client.get(&url).await?;
        tracing::debug!(event, time = %answer.time, "solar oracle answered");
        Ok(answer.time)
    }
}

impl SolarTimeOracle for HttpSolarOracle {
    async fn sunrise(&self) -> Result<TimeOfDay, PlugSchedError> {
        self.fetch("sunrise").await
    }

    async fn sunset(&self) -> Result<TimeOfDay, PlugSchedError> {
        self.fetch("sunset").await
    }
}
