//! Tracing setup and log helpers

use auspex_domain::AuspexError;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,auspex=debug";

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON lines; anything else is plain text.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }

    /// Read `AUSPEX_LOG_FORMAT`
    pub fn from_env() -> Self {
        Self::parse(std::env::var("AUSPEX_LOG_FORMAT").ok().as_deref())
    }
}

/// Install the global tracing subscriber.
///
/// Returns an error when a subscriber has already been installed.
pub fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Json => builder.json().try_init()?,
        LogFormat::Text => builder.try_init()?,
    }
    Ok(())
}

/// Convert an `AuspexError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &AuspexError) -> &'static str {
    match error {
        AuspexError::Database(_) => "database",
        AuspexError::Config(_) => "config",
        AuspexError::Network(_) => "network",
        AuspexError::Remote { .. } => "remote",
        AuspexError::Auth(_) => "auth",
        AuspexError::NotFound(_) => "not_found",
        AuspexError::InvalidInput(_) => "invalid_input",
        AuspexError::Cancelled(_) => "cancelled",
        AuspexError::Internal(_) => "internal",
    }
}
