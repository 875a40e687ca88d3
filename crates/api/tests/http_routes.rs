//! Route tests against a real SQLite store and a mocked EVE SSO.
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`;
//! the sync scheduler runs over a scripted ESI client.

use std::sync::Arc;
use std::time::Duration;

use auspex_api::{router, AppState};
use auspex_core::testing::MockEsiClient;
use auspex_core::{
    SubjectRepository, SubjectService, SyncRepositories, SyncService, SyncStateRepository,
};
use auspex_domain::{Credential, Endpoint, Fetched, Owner, SyncState};
use auspex_infra::{
    AuthSettings, DbManager, EsiOAuthProvider, SqliteStore, SsoClient, SyncScheduler,
    SyncSchedulerConfig,
};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_string_contains, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    _temp_dir: TempDir,
    sso: MockServer,
    store: Arc<SqliteStore>,
    esi: Arc<MockEsiClient>,
    scheduler: SyncScheduler,
    state: AppState,
}

impl Harness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let db = Arc::new(DbManager::new(temp_dir.path().join("auspex.db"), 2).expect("db"));
        db.run_migrations().expect("migrations");
        let store = Arc::new(SqliteStore::new(Arc::clone(&db)));

        let sso_server = MockServer::start().await;
        let settings = AuthSettings {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            callback_url: "http://localhost:8080/auth/eve/callback".into(),
            authorize_url: format!("{}/v2/oauth/authorize", sso_server.uri()),
            token_url: format!("{}/v2/oauth/token", sso_server.uri()),
            verify_url: format!("{}/oauth/verify", sso_server.uri()),
            user_agent: "auspex-test".into(),
        };
        let sso = Arc::new(SsoClient::new(settings).expect("sso client"));

        let esi = Arc::new(MockEsiClient::new());
        let service =
            Arc::new(SyncService::new(esi.clone(), SyncRepositories::from_store(store.clone())));
        let scheduler = SyncScheduler::new(
            service,
            SyncSchedulerConfig {
                interval: Duration::from_secs(3600),
                join_timeout: Duration::from_secs(5),
            },
            CancellationToken::new(),
        );

        let state = AppState {
            subjects: Arc::new(SubjectService::new(store.clone(), store.clone())),
            oauth: Arc::new(EsiOAuthProvider::new(sso, store.clone())),
            refresh: scheduler.refresh_handle(),
            db,
        };

        Self { _temp_dir: temp_dir, sso: sso_server, store, esi, scheduler, state }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        router(self.state.clone()).oneshot(request).await.expect("router response")
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str) -> Response {
        self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, body: &Value) -> Response {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn seed_character(&self, id: i64, name: &str) {
        let credential = Credential {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: Utc::now() + ChronoDuration::minutes(20),
        };
        self.store.upsert_character(id, name, &credential).await.unwrap();
    }

    /// Issue a login and return the state embedded in the redirect
    async fn login_state(&self) -> String {
        let response = self.get("/auth/eve/login").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let url = Url::parse(location(&response)).unwrap();
        url.query_pairs().find(|(k, _)| k == "state").map(|(_, v)| v.into_owned()).unwrap()
    }

    async fn mount_sso_success(&self) {
        Mock::given(method("POST"))
            .and(path("/v2/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "expires_in": 1199,
                "token_type": "Bearer",
                "refresh_token": "refresh-1"
            })))
            .expect(1)
            .mount(&self.sso)
            .await;

        Mock::given(method("GET"))
            .and(path("/oauth/verify"))
            .and(header_matcher("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "CharacterID": 90_000_001,
                "CharacterName": "Pilot"
            })))
            .mount(&self.sso)
            .await;
    }
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).expect("location header").to_str().unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Authorization ───────────────────────────────────────────────────────────

#[tokio::test]
async fn login_redirects_to_sso_with_fresh_state() {
    let harness = Harness::new().await;

    let response = harness.get("/auth/eve/login").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let url = Url::parse(location(&response)).unwrap();
    assert_eq!(url.path(), "/v2/oauth/authorize");
    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(params.contains(&("client_id".into(), "client-id".into())));
    assert!(params.contains(&("response_type".into(), "code".into())));
    assert!(params.iter().any(|(k, v)| k == "state" && !v.is_empty()));
}

#[tokio::test]
async fn callback_stores_character_and_rejects_replayed_state() {
    let harness = Harness::new().await;
    harness.mount_sso_success().await;
    let state = harness.login_state().await;

    let uri = format!("/auth/eve/callback?code=auth-code&state={state}");
    let response = harness.get(&uri).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let characters = json_body(harness.get("/api/characters").await).await;
    assert_eq!(characters[0]["id"], 90_000_001);
    assert_eq!(characters[0]["name"], "Pilot");

    let replay = harness.get(&uri).await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_with_unknown_state_never_reaches_sso() {
    let harness = Harness::new().await;

    let response = harness.get("/auth/eve/callback?code=auth-code&state=forged").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.sso.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn callback_without_code_is_bad_request() {
    let harness = Harness::new().await;

    let response = harness.get("/auth/eve/callback?state=abc").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_code_exchange_returns_generic_error() {
    let harness = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/v2/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant client-secret"))
        .mount(&harness.sso)
        .await;
    let state = harness.login_state().await;

    let response = harness.get(&format!("/auth/eve/callback?code=bad&state={state}")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "internal server error");
    assert!(harness.store.list_characters().await.unwrap().is_empty());
}

// ── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn corporation_lifecycle() {
    let harness = Harness::new().await;
    harness.seed_character(7, "Director").await;

    let corp = json!({"id": 98, "name": "Corp", "delegate_id": 7});

    let unknown_delegate = json!({"id": 98, "name": "Corp", "delegate_id": 8});
    let response = harness.post_json("/api/corporations", &unknown_delegate).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing_name = json!({"id": 98, "delegate_id": 7});
    let response = harness.post_json("/api/corporations", &missing_name).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness.post_json("/api/corporations", &corp).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let duplicate = harness.post_json("/api/corporations", &corp).await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let corporations = json_body(harness.get("/api/corporations").await).await;
    assert_eq!(corporations[0]["id"], 98);
    assert_eq!(corporations[0]["delegate_name"], "Director");

    let delegate_delete = harness.delete("/api/characters/7").await;
    assert_eq!(delegate_delete.status(), StatusCode::BAD_REQUEST);

    assert_eq!(harness.delete("/api/corporations/98").await.status(), StatusCode::NO_CONTENT);
    assert_eq!(harness.delete("/api/corporations/98").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(harness.delete("/api/characters/7").await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_unknown_character_is_not_found() {
    let harness = Harness::new().await;

    assert_eq!(harness.delete("/api/characters/404").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(harness.delete("/api/characters/abc").await.status(), StatusCode::BAD_REQUEST);
}

// ── Sync ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_status_lists_owner_names() {
    let harness = Harness::new().await;
    harness.seed_character(42, "Pilot").await;
    let now = Utc::now();
    harness
        .store
        .upsert_sync_state(&SyncState {
            owner: Owner::Character(42),
            endpoint: Endpoint::Blueprints,
            last_sync: now,
            cache_until: now + ChronoDuration::minutes(5),
        })
        .await
        .unwrap();

    let rows = json_body(harness.get("/api/sync/status").await).await;

    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["owner_type"], "character");
    assert_eq!(rows[0]["owner_id"], 42);
    assert_eq!(rows[0]["owner_name"], "Pilot");
    assert_eq!(rows[0]["endpoint"], "blueprints");
}

#[tokio::test(flavor = "multi_thread")]
async fn post_sync_forces_a_cycle() {
    let mut harness = Harness::new().await;
    harness.seed_character(42, "Pilot").await;
    let owner = Owner::Character(42);
    let cache_until = Utc::now() + ChronoDuration::hours(1);
    harness.esi.set_blueprints(owner, Ok(Fetched { data: Vec::new(), cache_until }));
    harness.esi.set_jobs(owner, Ok(Fetched { data: Vec::new(), cache_until }));

    harness.scheduler.start().await.unwrap();
    wait_for_calls(&harness.esi, 2).await;

    let response = harness.send(Request::post("/api/sync").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Fresh cache would skip both pairs; only a forced cycle calls again
    wait_for_calls(&harness.esi, 4).await;
    harness.scheduler.stop().await.unwrap();
}

async fn wait_for_calls(esi: &MockEsiClient, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while esi.subject_calls().len() < expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("expected ESI calls were not made");
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = Harness::new().await;

    let response = harness.get("/api/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
