//! EVE SSO token and verify endpoints

use std::time::Duration;

use auspex_domain::Credential;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::errors::AuthError;
use super::provider::AuthSettings;

const SSO_TIMEOUT: Duration = Duration::from_secs(30);

/// Token endpoint response for both grant types
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Build a credential, keeping `previous_refresh` when the response
    /// carries no refresh token of its own.
    ///
    /// # Errors
    /// `AuthError::Decode` if neither a new nor a previous refresh token is
    /// available, or if `expires_in` overflows the credential's expiry.
    pub fn into_credential(
        self,
        now: DateTime<Utc>,
        previous_refresh: Option<&str>,
    ) -> Result<Credential, AuthError> {
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| AuthError::Decode("token response has no refresh_token".into()))?;

        let expires_at = TimeDelta::try_seconds(self.expires_in.max(0))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::Decode(format!("expires_in out of range: {}", self.expires_in))
            })?;

        Ok(Credential { access_token: self.access_token, refresh_token, expires_at })
    }
}

/// Identity returned by the verify endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedCharacter {
    #[serde(rename = "CharacterID")]
    pub character_id: i64,
    #[serde(rename = "CharacterName")]
    pub character_name: String,
}

/// HTTP client for the SSO endpoints, authenticating with the application's
/// client credentials.
pub struct SsoClient {
    http: Client,
    settings: AuthSettings,
}

impl SsoClient {
    /// # Errors
    /// `AuthError::Config` if the HTTP client cannot be built.
    pub fn new(settings: AuthSettings) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(SSO_TIMEOUT)
            .user_agent(settings.user_agent.clone())
            .no_proxy()
            .build()
            .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Redeem an authorization code.
    ///
    /// # Errors
    /// `TokenRejected` on a non-2xx answer, `Decode` on a malformed body.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        debug!("Exchanging authorization code");
        self.token_grant(&[("grant_type", "authorization_code"), ("code", code)]).await
    }

    /// Obtain a new access token with a refresh token.
    ///
    /// # Errors
    /// `TokenRejected` on a non-2xx answer, `Decode` on a malformed body.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        debug!("Refreshing access token");
        self.token_grant(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await
    }

    /// Resolve the character an access token belongs to.
    ///
    /// # Errors
    /// `VerifyRejected` on a non-2xx answer, `Decode` on a malformed body.
    pub async fn verify(&self, access_token: &str) -> Result<VerifiedCharacter, AuthError> {
        let response =
            self.http.get(&self.settings.verify_url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::VerifyRejected { status: status.as_u16() });
        }
        decode(&response.text().await?)
    }

    async fn token_grant(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.settings.token_url)
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::TokenRejected { status: status.as_u16(), body });
        }
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, AuthError> {
    serde_json::from_str(body).map_err(|e| AuthError::Decode(e.to_string()))
}
