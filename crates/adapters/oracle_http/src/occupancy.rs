//! Occupancy oracle — whether someone is expected home today.

use std::time::Duration;

use plugsched_app::ports::OccupancyOracle;
use plugsched_domain::error::PlugSchedError;
use serde::Deserialize;

use crate::client::JsonClient;
use crate::error::OracleError;

#[derive(Deserialize)]
struct OccupancyAnswer {
    #[serde(default)]
    expected_home: Option<bool>,
}

/// [`OccupancyOracle`] backed by a single JSON endpoint.
#[derive(Clone)]
pub struct HttpOccupancyOracle {
    client: JsonClient,
    url: String,
}

impl HttpOccupancyOracle {
    /// # Errors
    ///
    /// Returns [`OracleError::Client`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        Ok(Self {
            client: JsonClient::new(timeout)?,
            url: url.into(),
        })
    }
}

impl OccupancyOracle for HttpOccupancyOracle {
    async fn expected_home_today(&self) -> Result<Option<bool>, PlugSchedError> {
        let answer: OccupancyAnswer = self.client.get(&self.url).await?;
        tracing::debug!(expected_home = ?answer.expected_home, "occupancy oracle answered");
        Ok(answer.expected_home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::get;

    use crate::stub::serve;

    async fn oracle(body: &'static str) -> HttpOccupancyOracle {
        let base = serve(Router::new().route("/home", get(move || async move { body }))).await;
        HttpOccupancyOracle::new(format!("{base}/home"), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn should_report_expected_home() {
        let oracle = oracle(r#"{"expected_home":true}"#).await;
        assert_eq!(oracle.expected_home_today().await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn should_report_unknown_when_answer_is_null() {
        let oracle = oracle(r#"{"expected_home":null}"#).await;
        assert_eq!(oracle.expected_home_today().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_report_unknown_when_field_is_missing() {
        let oracle = oracle("{}").await;
        assert_eq!(oracle.expected_home_today().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_fail_when_body_is_not_json() {
        let oracle = oracle("maybe").await;
        assert!(matches!(
            oracle.expected_home_today().await,
            Err(PlugSchedError::Oracle(_))
        ));
    }
}
