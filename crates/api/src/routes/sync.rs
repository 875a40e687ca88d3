//! Sync control

use auspex_domain::SyncStatusRow;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::context::AppState;
use crate::error::ApiError;

/// `POST /api/sync`
pub async fn force(State(state): State<AppState>) -> StatusCode {
    state.refresh.trigger();
    StatusCode::ACCEPTED
}

/// `GET /api/sync/status`
pub async fn status(State(state): State<AppState>) -> Result<Json<Vec<SyncStatusRow>>, ApiError> {
    Ok(Json(state.subjects.sync_status().await?))
}
