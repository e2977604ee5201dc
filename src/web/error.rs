//! Error-to-status mapping for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::core::error::SubmitError;

/// Error body returned by the HTTP surface.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A request failure mapped onto its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        let status = match err {
            SubmitError::Auth(_) => StatusCode::UNAUTHORIZED,
            SubmitError::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
