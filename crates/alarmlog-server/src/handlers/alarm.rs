//! Alarm trigger intake.

use std::sync::Arc;

use alarmlog_monitor::ExecutionTrace;
use axum::{extract::State, Json};
use serde_json::Value;
use tracing::{error, info};

use crate::error::AppError;
use crate::ServerState;

/// Runs one notifier invocation for the posted trigger payload.
pub async fn receive(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<Value>,
) -> Result<Json<ExecutionTrace>, AppError> {
    let trace = state.notifier.run(payload).await.map_err(|failure| {
        error!(
            invocation_id = %failure.invocation_id,
            stage = %failure.stage,
            kind = %failure.kind,
            "Alarm run failed"
        );
        failure
    })?;

    info!(invocation_id = %trace.invocation_id, level = %trace.level, "Alarm run finished");
    Ok(Json(trace))
}
