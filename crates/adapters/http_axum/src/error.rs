//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use plugsched_domain::error::{PlugSchedError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`PlugSchedError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(PlugSchedError);

impl From<PlugSchedError> for ApiError {
    fn from(err: PlugSchedError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

/// The message of `err` followed by each of its sources.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PlugSchedError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            PlugSchedError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            PlugSchedError::Device(_) | PlugSchedError::Oracle(_) => {
                (StatusCode::BAD_GATEWAY, describe(&self.0))
            }
            PlugSchedError::EngineStopped => {
                (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string())
            }
            PlugSchedError::Storage(_) => {
                tracing::error!(error = %describe(&self.0), "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
