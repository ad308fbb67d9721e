pub mod alerts;
pub mod app;
pub mod fetch;
pub mod state;

use axum::{http::StatusCode, Json};
use log::error;
use serde::Serialize;

use crate::error::HazardPulseError;

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Logs the underlying error and hides its details from the client
pub(crate) fn internal_error(context: &str, err: HazardPulseError) -> ApiError {
    error!("{}: {}", context, err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, context)
}
