//! HTTP client for the EVE ESI API
//!
//! Makes requests, returns typed records and reports the cache expiry ESI
//! announces in its `Expires` header. Transient failures (429, 5xx, network)
//! are retried; nothing here knows about the database or OAuth.

pub mod blueprints;
pub mod client;
pub mod errors;
pub mod jobs;
pub mod universe;

pub use client::{EsiClientConfig, EsiHttpClient, Sleeper, TokioSleeper};
pub use errors::{EsiError, EsiResult};
