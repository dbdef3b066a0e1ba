//! Application error types and Axum response conversion.

use alarmlog_monitor::FailureDescriptor;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// The notifier run failed; the descriptor is returned as the body.
    RunFailed(FailureDescriptor),
}

impl From<FailureDescriptor> for AppError {
    fn from(failure: FailureDescriptor) -> Self {
        AppError::RunFailed(failure)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::RunFailed(failure) = self;
        (StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response()
    }
}
