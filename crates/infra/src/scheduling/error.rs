//! Scheduler error types

use auspex_domain::AuspexError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let auspex_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                AuspexError::InvalidInput(err.to_string())
            }
            _ => AuspexError::Internal(err.to_string()),
        };
        InfraError(auspex_err)
    }
}

impl From<SchedulerError> for AuspexError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
