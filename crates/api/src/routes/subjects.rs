//! Handlers for `/characters` and `/corporations`

use auspex_domain::{Character, Corporation, Owner};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::context::AppState;
use crate::error::ApiError;

/// `GET /api/characters`
pub async fn list_characters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Character>>, ApiError> {
    Ok(Json(state.subjects.list_characters().await?))
}

/// `DELETE /api/characters/{id}`
pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.subjects.remove(Owner::Character(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/corporations`
pub async fn list_corporations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Corporation>>, ApiError> {
    Ok(Json(state.subjects.list_corporations().await?))
}

/// Body of `POST /api/corporations`
#[derive(Debug, Deserialize)]
pub struct AddCorporationBody {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub delegate_id: i64,
}

/// `POST /api/corporations`
pub async fn add_corporation(
    State(state): State<AppState>,
    Json(body): Json<AddCorporationBody>,
) -> Result<StatusCode, ApiError> {
    state.subjects.add_corporation(body.id, &body.name, body.delegate_id).await?;
    state.refresh.trigger();
    Ok(StatusCode::CREATED)
}

/// `DELETE /api/corporations/{id}`
pub async fn delete_corporation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.subjects.remove(Owner::Corporation(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
