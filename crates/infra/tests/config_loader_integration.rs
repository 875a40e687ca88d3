//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::path::PathBuf;

use auspex_domain::AuspexError;
use auspex_infra::config;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("config file written");
    path
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "auspex.toml",
        r#"
[server]
port = 8181

[database]
path = "/tmp/integration.db"

[sync]
refresh_interval_minutes = 5

[esi]
client_id = "id"
client_secret = "secret"
callback_url = "http://localhost:8181/auth/eve/callback"
"#,
    );

    let config = config::load_from_file(Some(path)).expect("config loaded");

    assert_eq!(config.server.port, 8181);
    assert_eq!(config.database.path, "/tmp/integration.db");
    assert_eq!(config.database.pool_size, 4);
    assert_eq!(config.sync.refresh_interval_minutes, 5);
    assert_eq!(config.esi.client_id, "id");
    config.validate().expect("complete config validates");
}

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "auspex.json",
        r#"{
            "server": { "port": 8282 },
            "esi": {
                "client_id": "id",
                "client_secret": "secret",
                "callback_url": "http://localhost:8282/auth/eve/callback"
            }
        }"#,
    );

    let config = config::load_from_file(Some(path)).expect("config loaded");
    assert_eq!(config.server.port, 8282);
    assert_eq!(config.esi.base_url, "https://esi.evetech.net/latest");
}

#[test]
fn test_load_validates_result() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "auspex.toml", "[server]\nport = 8080\n");

    // esi credentials missing (and not provided through the environment)
    if std::env::var_os("AUSPEX_ESI_CLIENT_ID").is_none() {
        let err = config::load(Some(path)).unwrap_err();
        assert!(matches!(err, AuspexError::Config(ref m) if m.contains("esi.client_id")));
    }
}

#[test]
fn test_load_from_file_not_found() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/auspex.toml")));
    assert!(matches!(result, Err(AuspexError::Config(_))), "Should be a Config error");
}

#[test]
fn test_load_from_file_invalid_toml() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "auspex.toml", "[server\nport = ");

    assert!(config::load_from_file(Some(path)).is_err(), "Should fail with invalid TOML");
}
