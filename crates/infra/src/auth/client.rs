//! ESI client decorator supplying per-owner access tokens

use std::sync::Arc;

use async_trait::async_trait;
use auspex_core::{CredentialRepository, EsiClient, SubjectRepository};
use auspex_domain::{AuspexError, Blueprint, Fetched, Job, Owner, Result, UniverseType};
use chrono::Utc;
use tracing::{debug, info};

use super::token::SsoClient;

/// Tokens expiring within this window are refreshed before use
const REFRESH_SKEW: chrono::Duration = chrono::Duration::seconds(10);

/// Wraps an [`EsiClient`], replacing the caller's token with the stored
/// credential of the owner (or its delegate), refreshed when expired.
pub struct TokenInjectingClient {
    inner: Arc<dyn EsiClient>,
    sso: Arc<SsoClient>,
    subjects: Arc<dyn SubjectRepository>,
    credentials: Arc<dyn CredentialRepository>,
}

impl TokenInjectingClient {
    /// Decorate `inner` with credential lookup and refresh
    pub fn new(
        inner: Arc<dyn EsiClient>,
        sso: Arc<SsoClient>,
        subjects: Arc<dyn SubjectRepository>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self { inner, sso, subjects, credentials }
    }

    async fn credential_holder(&self, owner: Owner) -> Result<i64> {
        match owner {
            Owner::Character(id) => Ok(id),
            Owner::Corporation(id) => self
                .subjects
                .get_corporation(id)
                .await?
                .map(|corp| corp.delegate_id)
                .ok_or_else(|| AuspexError::NotFound(format!("corporation {id} is not tracked"))),
        }
    }

    /// Current access token for `owner`, refreshing and persisting it if it
    /// is about to expire.
    async fn access_token(&self, owner: Owner) -> Result<String> {
        let character_id = self.credential_holder(owner).await?;
        let stored = self.credentials.get_credential(character_id).await?.ok_or_else(|| {
            AuspexError::NotFound(format!("no credential stored for character {character_id}"))
        })?;

        let now = Utc::now();
        if !stored.is_expired(now, REFRESH_SKEW) {
            return Ok(stored.access_token);
        }

        debug!(character_id, "Access token expired, refreshing");
        let refreshed = self
            .sso
            .refresh(&stored.refresh_token)
            .await?
            .into_credential(now, Some(&stored.refresh_token))?;

        if refreshed.access_token != stored.access_token {
            self.credentials.save_credential(character_id, &refreshed).await?;
            info!(character_id, "Stored refreshed credential");
        }
        Ok(refreshed.access_token)
    }
}

#[async_trait]
impl EsiClient for TokenInjectingClient {
    async fn blueprints(&self, owner: Owner, _access_token: &str) -> Result<Fetched<Vec<Blueprint>>> {
        let token = self.access_token(owner).await?;
        self.inner.blueprints(owner, &token).await
    }

    async fn jobs(&self, owner: Owner, _access_token: &str) -> Result<Fetched<Vec<Job>>> {
        let token = self.access_token(owner).await?;
        self.inner.jobs(owner, &token).await
    }

    async fn universe_type(&self, type_id: i64) -> Result<UniverseType> {
        self.inner.universe_type(type_id).await
    }
}
