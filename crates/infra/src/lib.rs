//! # Auspex Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence (`r2d2` pool, schema, repositories)
//! - The resilient ESI HTTP client
//! - EVE SSO authorization and the token-injecting client
//! - The background sync scheduler
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `auspex-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod esi;
pub mod scheduling;

// Re-export commonly used items
pub use auth::{AuthError, AuthSettings, EsiOAuthProvider, SsoClient, TokenInjectingClient};
pub use database::{DbManager, SqliteStore};
pub use errors::InfraError;
pub use esi::{EsiClientConfig, EsiError, EsiHttpClient};
pub use scheduling::{RefreshHandle, SchedulerError, SyncScheduler, SyncSchedulerConfig};
