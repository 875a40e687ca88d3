//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AuspexError, Result};

/// Default ESI base URL (all endpoint paths are appended to this)
pub const DEFAULT_ESI_BASE_URL: &str = "https://esi.evetech.net/latest";

/// Default `User-Agent` sent with every ESI request
pub const DEFAULT_USER_AGENT: &str = concat!("auspex/", env!("CARGO_PKG_VERSION"));

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub esi: EsiConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub refresh_interval_minutes: u64,
}

/// ESI application credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EsiConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub callback_url: String,
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "auspex.db".to_string(), pool_size: 4 }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { refresh_interval_minutes: 10 }
    }
}

impl Default for EsiConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: String::new(),
            base_url: DEFAULT_ESI_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SyncConfig {
    /// Interval between scheduled sync cycles
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.saturating_mul(60))
    }
}

impl Config {
    /// Check that the configuration can drive a running instance.
    ///
    /// # Errors
    /// Returns `AuspexError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AuspexError::Config("server.port must be between 1 and 65535".into()));
        }
        if self.database.path.trim().is_empty() {
            return Err(AuspexError::Config("database.path is required".into()));
        }
        if self.sync.refresh_interval_minutes == 0 {
            return Err(AuspexError::Config(
                "sync.refresh_interval_minutes must be greater than zero".into(),
            ));
        }

        for (field, value) in [
            ("esi.client_id", &self.esi.client_id),
            ("esi.client_secret", &self.esi.client_secret),
            ("esi.callback_url", &self.esi.callback_url),
        ] {
            if value.trim().is_empty() {
                return Err(AuspexError::Config(format!("{field} is required")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Config {
        let mut config = Config::default();
        config.esi.client_id = "id".into();
        config.esi.client_secret = "secret".into();
        config.esi.callback_url = "http://localhost:8080/auth/eve/callback".into();
        config
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "auspex.db");
        assert_eq!(config.sync.refresh_interval(), Duration::from_secs(600));
        assert_eq!(config.esi.base_url, DEFAULT_ESI_BASE_URL);
    }

    #[test]
    fn missing_esi_credentials_fail_validation() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("esi.client_id"));

        let mut config = complete();
        config.esi.callback_url = " ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("esi.callback_url"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = complete();
        config.sync.refresh_interval_minutes = 0;
        assert!(matches!(config.validate(), Err(AuspexError::Config(_))));
    }

    #[test]
    fn partial_toml_uses_defaults_for_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [esi]
            client_id = "abc"
            client_secret = "shh"
            callback_url = "http://localhost/cb"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.esi.client_id, "abc");
        assert_eq!(config.esi.user_agent, DEFAULT_USER_AGENT);
        config.validate().unwrap();
    }

    #[test]
    fn client_secret_is_not_serialized() {
        let json = serde_json::to_string(&complete()).unwrap();
        assert!(!json.contains("client_secret"));
    }
}
