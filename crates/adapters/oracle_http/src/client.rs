use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::OracleError;

/// Shared JSON-over-HTTP plumbing for the oracles.
#[derive(Clone)]
pub(crate) struct JsonClient {
    http: reqwest::Client,
}

impl JsonClient {
    pub(crate) fn new(timeout: Duration) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OracleError::Client)?;
        Ok(Self { http })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, OracleError> {
        let request_failed = |source| OracleError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.http.get(url).send().await.map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.json().await.map_err(request_failed)
    }
}
