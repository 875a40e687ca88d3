//! EVE SSO login flow

use std::fmt;
use std::sync::Arc;

use auspex_core::SubjectRepository;
use auspex_domain::EsiConfig;
use chrono::Utc;
use tracing::{info, instrument, warn};
use url::Url;

use super::errors::AuthError;
use super::state::AuthStateStore;
use super::token::SsoClient;

/// EVE SSO authorization endpoint
pub const AUTHORIZE_URL: &str = "https://login.eveonline.com/v2/oauth/authorize";
/// EVE SSO token endpoint
pub const TOKEN_URL: &str = "https://login.eveonline.com/v2/oauth/token";
/// Resolves an access token to its character
pub const VERIFY_URL: &str = "https://login.eveonline.com/oauth/verify";

/// Scopes requested for every login
pub const ESI_SCOPES: [&str; 4] = [
    "esi-characters.read_blueprints.v1",
    "esi-corporations.read_blueprints.v1",
    "esi-industry.read_character_jobs.v1",
    "esi-industry.read_corporation_jobs.v1",
];

/// Application registration and SSO endpoints
#[derive(Clone)]
pub struct AuthSettings {
    /// Application client id
    pub client_id: String,
    /// Application secret, sent as HTTP basic auth on token grants
    pub client_secret: String,
    /// Absolute redirect URI registered with the application
    pub callback_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub verify_url: String,
    /// `User-Agent` for SSO requests
    pub user_agent: String,
}

impl AuthSettings {
    /// Settings for the public EVE SSO endpoints.
    ///
    /// # Errors
    /// `AuthError::Config` if the callback URL is not an absolute URL.
    pub fn from_config(config: &EsiConfig) -> Result<Self, AuthError> {
        Url::parse(&config.callback_url).map_err(|e| {
            AuthError::Config(format!("invalid callback_url '{}': {e}", config.callback_url))
        })?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            verify_url: VERIFY_URL.to_string(),
            user_agent: config.user_agent.clone(),
        })
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("verify_url", &self.verify_url)
            .finish_non_exhaustive()
    }
}

/// Issues login URLs and completes the authorization-code callback.
///
/// Each provider owns its state set; states from another instance are never
/// accepted.
pub struct EsiOAuthProvider {
    sso: Arc<SsoClient>,
    states: AuthStateStore,
    subjects: Arc<dyn SubjectRepository>,
}

impl EsiOAuthProvider {
    /// Provider with a default state store
    pub fn new(sso: Arc<SsoClient>, subjects: Arc<dyn SubjectRepository>) -> Self {
        Self::with_state_store(sso, subjects, AuthStateStore::new())
    }

    pub fn with_state_store(
        sso: Arc<SsoClient>,
        subjects: Arc<dyn SubjectRepository>,
        states: AuthStateStore,
    ) -> Self {
        Self { sso, states, subjects }
    }

    /// Build the SSO authorize URL with a freshly issued state token.
    ///
    /// # Errors
    /// `AuthError::Config` if the configured authorize URL is invalid.
    pub fn authorization_url(&self) -> Result<String, AuthError> {
        let settings = self.sso.settings();
        let base = Url::parse(&settings.authorize_url).map_err(|e| {
            AuthError::Config(format!("invalid authorize_url '{}': {e}", settings.authorize_url))
        })?;

        let state = self.states.issue();
        let scope = ESI_SCOPES.join(" ");
        let params = [
            ("response_type", "code"),
            ("redirect_uri", settings.callback_url.as_str()),
            ("client_id", settings.client_id.as_str()),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{query}", base.as_str().trim_end_matches('?')))
    }

    /// Complete a login: redeem the state, exchange the code, identify the
    /// character and store it with its credential.
    ///
    /// # Errors
    /// `AuthError::InvalidState` if `state` was not issued here, was already
    /// used or has expired; any other variant for SSO or storage failures.
    #[instrument(skip_all)]
    pub async fn handle_callback(&self, code: &str, state: &str) -> Result<i64, AuthError> {
        if !self.states.consume(state) {
            warn!("Rejected callback with unknown or expired state");
            return Err(AuthError::InvalidState);
        }

        let tokens = self.sso.exchange_code(code).await?;
        let verified = self.sso.verify(&tokens.access_token).await?;
        let credential = tokens.into_credential(Utc::now(), None)?;

        self.subjects
            .upsert_character(verified.character_id, &verified.character_name, &credential)
            .await
            .map_err(AuthError::Store)?;

        info!(
            character_id = verified.character_id,
            character_name = %verified.character_name,
            "Character authorized"
        );
        Ok(verified.character_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use auspex_core::testing::InMemoryStore;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    pub(crate) fn test_settings(server: &MockServer) -> AuthSettings {
        AuthSettings {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            callback_url: "http://localhost:8080/auth/eve/callback".into(),
            authorize_url: format!("{}/v2/oauth/authorize", server.uri()),
            token_url: format!("{}/v2/oauth/token", server.uri()),
            verify_url: format!("{}/oauth/verify", server.uri()),
            user_agent: "auspex-test".into(),
        }
    }

    pub(crate) fn basic_auth_header() -> String {
        format!("Basic {}", STANDARD.encode("client-id:client-secret"))
    }

    fn provider(server: &MockServer, store: &Arc<InMemoryStore>) -> EsiOAuthProvider {
        let sso = Arc::new(SsoClient::new(test_settings(server)).unwrap());
        EsiOAuthProvider::new(sso, store.clone())
    }

    fn state_of(url: &str) -> String {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    async fn mount_sso(server: &MockServer, character_id: i64, name: &str) {
        Mock::given(method("POST"))
            .and(path("/v2/oauth/token"))
            .and(header("Authorization", basic_auth_header().as_str()))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"access-1","expires_in":1199,"refresh_token":"refresh-1"}"#,
            ))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oauth/verify"))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"CharacterID":{character_id},"CharacterName":"{name}"}}"#
            )))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authorization_url_carries_required_parameters() {
        let server = MockServer::start().await;
        let store = Arc::new(InMemoryStore::new());
        let provider = provider(&server, &store);

        let url = Url::parse(&provider.authorization_url().unwrap()).unwrap();
        let pairs: std::collections::HashMap<String, String> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

        assert_eq!(url.path(), "/v2/oauth/authorize");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8080/auth/eve/callback");
        assert_eq!(pairs["scope"], ESI_SCOPES.join(" "));
        assert!(pairs["state"].len() >= 22);
    }

    #[tokio::test]
    async fn callback_stores_character_and_credential() {
        let server = MockServer::start().await;
        mount_sso(&server, 42, "Tester").await;
        let store = Arc::new(InMemoryStore::new());
        let provider = provider(&server, &store);

        let state = state_of(&provider.authorization_url().unwrap());
        let before = Utc::now();
        let id = provider.handle_callback("the-code", &state).await.unwrap();

        assert_eq!(id, 42);
        let credential = store.credential(42).unwrap();
        assert_eq!(credential.access_token, "access-1");
        assert_eq!(credential.refresh_token, "refresh-1");
        assert!(credential.expires_at >= before + chrono::Duration::seconds(1199));
    }

    #[tokio::test]
    async fn unknown_state_is_rejected_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        let store = Arc::new(InMemoryStore::new());
        let provider = provider(&server, &store);

        let err = provider.handle_callback("the-code", "forged").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidState));
    }

    #[tokio::test]
    async fn state_cannot_be_replayed() {
        let server = MockServer::start().await;
        mount_sso(&server, 42, "Tester").await;
        let store = Arc::new(InMemoryStore::new());
        let provider = provider(&server, &store);

        let state = state_of(&provider.authorization_url().unwrap());
        provider.handle_callback("the-code", &state).await.unwrap();

        let err = provider.handle_callback("the-code", &state).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidState));
    }

    #[tokio::test]
    async fn states_are_not_shared_between_providers() {
        let server = MockServer::start().await;
        let store = Arc::new(InMemoryStore::new());
        let first = provider(&server, &store);
        let second = provider(&server, &store);

        let state = state_of(&first.authorization_url().unwrap());
        assert!(matches!(
            second.handle_callback("the-code", &state).await,
            Err(AuthError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn failed_verify_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"access-1","expires_in":1199,"refresh_token":"refresh-1"}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oauth/verify"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let store = Arc::new(InMemoryStore::new());
        let provider = provider(&server, &store);

        let state = state_of(&provider.authorization_url().unwrap());
        let err = provider.handle_callback("the-code", &state).await.unwrap_err();

        assert!(matches!(err, AuthError::VerifyRejected { status: 401 }));
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn reauthorizing_replaces_credential() {
        let server = MockServer::start().await;
        mount_sso(&server, 42, "Tester").await;
        let store = Arc::new(InMemoryStore::new());
        store.seed_character(
            42,
            "Tester",
            auspex_domain::Credential {
                access_token: "stale".into(),
                refresh_token: "stale-refresh".into(),
                expires_at: Utc::now(),
            },
        );
        let provider = provider(&server, &store);

        let state = state_of(&provider.authorization_url().unwrap());
        provider.handle_callback("the-code", &state).await.unwrap();

        assert_eq!(store.credential(42).unwrap().refresh_token, "refresh-1");
    }

    #[test]
    fn settings_debug_redacts_secret() {
        let mut config = EsiConfig::default();
        config.client_id = "id".into();
        config.client_secret = "very-secret".into();
        config.callback_url = "http://localhost/cb".into();

        let rendered = format!("{:?}", AuthSettings::from_config(&config).unwrap());
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn relative_callback_url_is_rejected() {
        let mut config = EsiConfig::default();
        config.callback_url = "/auth/eve/callback".into();
        assert!(matches!(AuthSettings::from_config(&config), Err(AuthError::Config(_))));
    }
}
