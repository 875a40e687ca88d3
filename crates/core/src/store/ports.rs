//! Port interfaces for the local store
//!
//! These traits define the boundaries between core business logic
//! and the persistence layer.

use std::sync::Arc;

use async_trait::async_trait;
use auspex_domain::{
    Blueprint, Character, Corporation, Credential, Endpoint, EveCategory, EveGroup, EveType, Job,
    Owner, Result, SyncState, SyncStatusRow,
};

/// Characters and corporations tracked by Auspex
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn list_characters(&self) -> Result<Vec<Character>>;

    async fn list_corporations(&self) -> Result<Vec<Corporation>>;

    async fn get_character(&self, id: i64) -> Result<Option<Character>>;

    async fn get_corporation(&self, id: i64) -> Result<Option<Corporation>>;

    /// Insert or update a character together with its credential
    async fn upsert_character(&self, id: i64, name: &str, credential: &Credential)
        -> Result<()>;

    async fn insert_corporation(&self, id: i64, name: &str, delegate_id: i64) -> Result<()>;

    /// Remove a subject and everything stored for it in one transaction:
    /// blueprints, jobs, sync state, then the subject row.
    ///
    /// Returns `false` when no such subject existed.
    async fn delete_subject(&self, owner: Owner) -> Result<bool>;
}

/// OAuth credentials, keyed by character id
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get_credential(&self, character_id: i64) -> Result<Option<Credential>>;

    async fn save_credential(&self, character_id: i64, credential: &Credential) -> Result<()>;
}

/// Per (owner, endpoint) cache bookkeeping
#[async_trait]
pub trait SyncStateRepository: Send + Sync {
    async fn get_sync_state(&self, owner: Owner, endpoint: Endpoint)
        -> Result<Option<SyncState>>;

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<()>;

    /// All sync states joined with owner names
    async fn list_sync_status(&self) -> Result<Vec<SyncStatusRow>>;
}

/// Blueprint originals per owner
#[async_trait]
pub trait BlueprintRepository: Send + Sync {
    /// Insert or update by item id
    async fn upsert_blueprints(&self, owner: Owner, blueprints: &[Blueprint]) -> Result<()>;

    /// Distinct type ids of every blueprint stored for `owner`
    async fn list_blueprint_type_ids(&self, owner: Owner) -> Result<Vec<i64>>;
}

/// Industry jobs per owner
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn upsert_jobs(&self, owner: Owner, jobs: &[Job]) -> Result<()>;

    /// Ids of every job stored for `owner`
    async fn list_job_ids(&self, owner: Owner) -> Result<Vec<i64>>;

    async fn delete_job(&self, job_id: i64) -> Result<()>;
}

/// Universe reference data; inserts are idempotent
#[async_trait]
pub trait UniverseRepository: Send + Sync {
    async fn get_type(&self, type_id: i64) -> Result<Option<EveType>>;

    async fn insert_category(&self, category: &EveCategory) -> Result<()>;

    async fn insert_group(&self, group: &EveGroup) -> Result<()>;

    async fn insert_type(&self, eve_type: &EveType) -> Result<()>;
}

/// Repository handles needed by the sync and subject services
#[derive(Clone)]
pub struct SyncRepositories {
    pub subjects: Arc<dyn SubjectRepository>,
    pub sync_state: Arc<dyn SyncStateRepository>,
    pub blueprints: Arc<dyn BlueprintRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub universe: Arc<dyn UniverseRepository>,
}

impl SyncRepositories {
    /// Use a single store implementing every repository
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: SubjectRepository
            + SyncStateRepository
            + BlueprintRepository
            + JobRepository
            + UniverseRepository
            + 'static,
    {
        Self {
            subjects: store.clone(),
            sync_state: store.clone(),
            blueprints: store.clone(),
            jobs: store.clone(),
            universe: store,
        }
    }
}
