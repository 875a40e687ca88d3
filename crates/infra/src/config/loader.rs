//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Read the given file, or the first file found by [`probe_config_paths`]
//! 2. With no file at all, start from defaults
//! 3. Apply environment overrides
//! 4. Validate
//!
//! JSON and TOML are supported, detected by file extension.
//!
//! ## Environment Variables
//! - `AUSPEX_PORT`: HTTP listen port
//! - `AUSPEX_DB_PATH`: Database file path
//! - `AUSPEX_DB_POOL_SIZE`: Connection pool size
//! - `AUSPEX_REFRESH_INTERVAL`: Minutes between sync cycles
//! - `AUSPEX_ESI_CLIENT_ID`, `AUSPEX_ESI_CLIENT_SECRET`,
//!   `AUSPEX_ESI_CALLBACK_URL`: EVE SSO application registration
//! - `AUSPEX_ESI_BASE_URL`: ESI base URL override
//!
//! ## File Locations
//! Probed in order, in the current working directory and then next to the
//! executable: `auspex.toml`, `auspex.json`, `config.toml`, `config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use auspex_domain::{AuspexError, Config, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["auspex.toml", "auspex.json", "config.toml", "config.json"];

/// Load, override and validate configuration
///
/// # Errors
/// Returns `AuspexError::Config` if an explicit `path` does not exist, a file
/// cannot be parsed, an override is malformed, or validation fails.
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(Some(path))?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(Some(found))?,
            None => {
                tracing::info!("No config file found; starting from defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `AuspexError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AuspexError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AuspexError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AuspexError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Apply `AUSPEX_*` environment variables on top of `config`
///
/// # Errors
/// Returns `AuspexError::Config` if a numeric variable does not parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(port) = parsed(&lookup, "AUSPEX_PORT")? {
        config.server.port = port;
    }
    if let Some(path) = lookup("AUSPEX_DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = parsed(&lookup, "AUSPEX_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(minutes) = parsed(&lookup, "AUSPEX_REFRESH_INTERVAL")? {
        config.sync.refresh_interval_minutes = minutes;
    }
    if let Some(id) = lookup("AUSPEX_ESI_CLIENT_ID") {
        config.esi.client_id = id;
    }
    if let Some(secret) = lookup("AUSPEX_ESI_CLIENT_SECRET") {
        config.esi.client_secret = secret;
    }
    if let Some(url) = lookup("AUSPEX_ESI_CALLBACK_URL") {
        config.esi.callback_url = url;
    }
    if let Some(url) = lookup("AUSPEX_ESI_BASE_URL") {
        config.esi.base_url = url;
    }
    Ok(())
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AuspexError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse configuration from string content
///
/// # Errors
/// Returns `AuspexError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AuspexError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AuspexError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AuspexError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}
