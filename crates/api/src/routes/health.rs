//! Liveness check

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::context::AppState;

/// `GET /api/health`
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db = Arc::clone(&state.db);
    let result = tokio::task::spawn_blocking(move || db.health_check()).await;

    match result {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Ok(Err(err)) => {
            warn!(error = %err, "Database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
        Err(err) => {
            warn!(error = %err, "Health check task failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
    }
}
