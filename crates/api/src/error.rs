//! API error type and [`axum::response::IntoResponse`] implementation.

use auspex_domain::AuspexError;
use auspex_infra::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::utils::logging::error_label;

/// Error returned by a route handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Logged in full; the client only sees a generic message
    #[error("internal error: {0}")]
    Internal(AuspexError),
}

impl From<AuspexError> for ApiError {
    fn from(err: AuspexError) -> Self {
        match err {
            AuspexError::NotFound(message) => Self::NotFound(message),
            AuspexError::InvalidInput(message) => Self::BadRequest(message),
            other => Self::Internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidState => Self::BadRequest(AuthError::InvalidState.to_string()),
            other => Self::Internal(AuspexError::from(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(err) => {
                error!(error = %err, kind = error_label(&err), "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let not_found = ApiError::from(AuspexError::NotFound("character 1".into()));
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(AuspexError::InvalidInput("name required".into()));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let db = ApiError::from(AuspexError::Database("disk full".into()));
        assert_eq!(db.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_state_is_a_bad_request_and_other_auth_failures_are_internal() {
        let state = ApiError::from(AuthError::InvalidState);
        assert!(matches!(state, ApiError::BadRequest(_)));

        let rejected =
            ApiError::from(AuthError::TokenRejected { status: 400, body: "invalid_grant".into() });
        assert!(matches!(rejected, ApiError::Internal(AuspexError::Auth(_))));
    }
}
