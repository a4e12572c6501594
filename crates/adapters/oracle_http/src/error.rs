//! Oracle-specific error type wrapping reqwest errors.

use plugsched_domain::error::PlugSchedError;

/// Errors originating from an HTTP oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The HTTP client could not be built.
    #[error("could not build http client")]
    Client(#[source] reqwest::Error),

    /// The request failed, timed out, or its body could not be decoded.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

impl From<OracleError> for PlugSchedError {
    fn from(err: OracleError) -> Self {
        Self::Oracle(Box::new(err))
    }
}
