//! Sync cycle logic: freshness checks, per-subject sync and reference
//! resolution.

pub mod service;

pub use service::{CycleReport, SyncService};
