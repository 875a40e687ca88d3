//! EVE SSO login and callback

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::context::AppState;
use crate::error::ApiError;

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `GET /auth/eve/login`
pub async fn login(State(state): State<AppState>) -> Result<Response, ApiError> {
    let url = state.oauth.authorization_url()?;
    Ok(found(&url))
}

/// Query string of the SSO redirect
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// `GET /auth/eve/callback?code=...&state=...`
///
/// Stores the character and forces a sync so its data shows up without
/// waiting for the next tick.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    let (Some(code), Some(auth_state)) = (params.code, params.state) else {
        return Err(ApiError::BadRequest("code and state are required".into()));
    };

    let character_id = state.oauth.handle_callback(&code, &auth_state).await?;
    state.refresh.trigger();
    info!(character_id, "Character authorized");

    Ok(found("/"))
}
