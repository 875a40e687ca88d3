//! HTTP routes
//!
//! | Method   | Path                      | Notes |
//! |----------|---------------------------|-------|
//! | `GET`    | `/auth/eve/login`         | 302 to EVE SSO |
//! | `GET`    | `/auth/eve/callback`      | 302 to `/`; 400 on a bad state |
//! | `GET`    | `/api/characters`         | |
//! | `DELETE` | `/api/characters/{id}`    | 204, 404 if unknown |
//! | `GET`    | `/api/corporations`       | |
//! | `POST`   | `/api/corporations`       | Body: `{"id","name","delegate_id"}` |
//! | `DELETE` | `/api/corporations/{id}`  | 204, 404 if unknown |
//! | `POST`   | `/api/sync`               | 202, forces a cycle |
//! | `GET`    | `/api/sync/status`        | |
//! | `GET`    | `/api/health`             | 503 when the database is unusable |

pub mod auth;
pub mod health;
pub mod subjects;
pub mod sync;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::context::AppState;

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/characters", get(subjects::list_characters))
        .route("/characters/{id}", delete(subjects::delete_character))
        .route("/corporations", get(subjects::list_corporations).post(subjects::add_corporation))
        .route("/corporations/{id}", delete(subjects::delete_corporation))
        .route("/sync", post(sync::force))
        .route("/sync/status", get(sync::status))
        .route("/health", get(health::check));

    Router::new()
        .route("/auth/eve/login", get(auth::login))
        .route("/auth/eve/callback", get(auth::callback))
        .nest("/api", api)
        .with_state(state)
}
