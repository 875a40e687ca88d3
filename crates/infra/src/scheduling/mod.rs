//! Scheduling infrastructure for background sync
//!
//! Schedulers follow the workspace runtime rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout on join

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{RefreshHandle, SyncScheduler, SyncSchedulerConfig};
