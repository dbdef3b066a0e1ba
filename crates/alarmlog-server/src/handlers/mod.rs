//! HTTP route handlers for the notifier server.

pub mod alarm;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
