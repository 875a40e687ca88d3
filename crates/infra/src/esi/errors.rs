//! ESI client error types

use auspex_domain::AuspexError;
use thiserror::Error;

use crate::errors::InfraError;

/// ESI request errors
#[derive(Debug, Error)]
pub enum EsiError {
    /// Non-retryable HTTP status (4xx other than 429)
    #[error("ESI returned HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// Retry budget spent on 429/5xx/network failures
    #[error("ESI request to {url} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { url: String, attempts: u32, last_error: String },

    #[error("ESI request to {url} could not be sent: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode ESI response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failure at one step of the type → group → category chain
    #[error("Universe lookup failed fetching {step} {id}: {source}")]
    Universe {
        step: &'static str,
        id: i64,
        #[source]
        source: Box<EsiError>,
    },

    #[error("ESI request cancelled")]
    Cancelled,

    #[error("ESI client configuration error: {0}")]
    Config(String),
}

impl EsiError {
    /// HTTP status of a permanent failure, looking through universe context
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Universe { source, .. } => source.status(),
            _ => None,
        }
    }

    fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Universe { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl From<EsiError> for AuspexError {
    fn from(err: EsiError) -> Self {
        if err.is_cancelled() {
            return Self::Cancelled(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Remote { status, message: err.to_string() };
        }

        match err {
            EsiError::Request { source, .. } => InfraError::from(source).into(),
            EsiError::Decode { .. } => Self::InvalidInput(err.to_string()),
            EsiError::Config(msg) => Self::Config(msg),
            _ => Self::Network(err.to_string()),
        }
    }
}

/// Convenience type alias for ESI operations
pub type EsiResult<T> = Result<T, EsiError>;
