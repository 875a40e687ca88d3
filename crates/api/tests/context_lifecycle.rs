//! Integration tests for AppContext lifecycle
//!
//! Tests verify that AppContext can be created, serve requests, and shut down
//! gracefully against a temporary database.

use std::time::Duration;

use auspex_api::AppContext;
use auspex_domain::{AuspexError, Config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = temp_dir.path().join("auspex.db").to_string_lossy().to_string();
    config.database.pool_size = 2;
    config.esi.client_id = "client-id".into();
    config.esi.client_secret = "client-secret".into();
    config.esi.callback_url = "http://localhost:8080/auth/eve/callback".into();
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn context_starts_scheduler_and_shuts_down() {
    let temp_dir = TempDir::new().unwrap();

    let ctx = AppContext::new(test_config(&temp_dir)).await.unwrap();
    assert!(ctx.is_scheduler_running());
    assert!(temp_dir.path().join("auspex.db").exists());

    tokio::time::timeout(Duration::from_secs(10), ctx.shutdown())
        .await
        .expect("shutdown should not hang")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn context_router_serves_health() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(test_config(&temp_dir)).await.unwrap();

    let response = ctx
        .router()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn cancelled_root_token_still_allows_clean_shutdown() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(test_config(&temp_dir)).await.unwrap();

    ctx.shutdown_token().cancel();

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_rejected_before_opening_the_database() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir);
    config.esi.client_secret.clear();

    let result = AppContext::new(config).await;

    assert!(matches!(result, Err(AuspexError::Config(_))));
    assert!(!temp_dir.path().join("auspex.db").exists());
}

#[tokio::test]
async fn relative_callback_url_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir);
    config.esi.callback_url = "/auth/eve/callback".into();

    let result = AppContext::new(config).await;

    assert!(matches!(result, Err(AuspexError::Config(_))));
}
