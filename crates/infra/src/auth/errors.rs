//! Authorization error types

use auspex_domain::AuspexError;
use thiserror::Error;

use crate::errors::InfraError;

/// EVE SSO failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown, expired or already-used state parameter
    #[error("invalid or expired authorization state")]
    InvalidState,

    /// Token endpoint rejected the grant
    #[error("token endpoint returned HTTP {status}: {body}")]
    TokenRejected { status: u16, body: String },

    /// Verify endpoint rejected the access token
    #[error("verify endpoint returned HTTP {status}")]
    VerifyRejected { status: u16 },

    #[error("SSO request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed SSO response: {0}")]
    Decode(String),

    #[error("SSO configuration error: {0}")]
    Config(String),

    /// Persisting the character or credential failed
    #[error(transparent)]
    Store(AuspexError),
}

impl From<AuthError> for AuspexError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(inner) => inner,
            AuthError::Request(source) => InfraError::from(source).into(),
            AuthError::Config(msg) => Self::Config(msg),
            AuthError::Decode(_) => Self::InvalidInput(err.to_string()),
            AuthError::InvalidState
            | AuthError::TokenRejected { .. }
            | AuthError::VerifyRejected { .. } => Self::Auth(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_pass_through() {
        let err = AuthError::Store(AuspexError::Database("locked".into()));
        assert_eq!(AuspexError::from(err), AuspexError::Database("locked".into()));
    }

    #[test]
    fn rejected_grant_is_an_auth_error() {
        let err = AuthError::TokenRejected { status: 400, body: "invalid_grant".into() };
        assert!(matches!(AuspexError::from(err), AuspexError::Auth(msg) if msg.contains("400")));
    }
}
