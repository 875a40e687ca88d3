//! # Auspex API
//!
//! HTTP application layer - routes, wiring and the main entry point.
//!
//! This crate contains:
//! - axum routes for authorization, subjects and sync control
//! - Application context (dependency injection and lifecycle)
//! - Logging setup for the binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Handlers read from the store and never call ESI directly

pub mod context;
pub mod error;
pub mod routes;
pub mod utils;

// Re-export for convenience
pub use context::{AppContext, AppState};
pub use error::ApiError;
pub use routes::router;
