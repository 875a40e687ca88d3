//! Port interface for the remote ESI API
//!
//! Implemented both by the plain HTTP client and by the decorator that
//! injects OAuth credentials, so callers never know which one they hold.

use async_trait::async_trait;
use auspex_domain::{Blueprint, Fetched, Job, Owner, Result, UniverseType};

/// Read-only access to the ESI endpoints Auspex mirrors
#[async_trait]
pub trait EsiClient: Send + Sync {
    /// Blueprint originals owned by `owner` (copies are filtered out)
    async fn blueprints(&self, owner: Owner, access_token: &str) -> Result<Fetched<Vec<Blueprint>>>;

    /// Research and copy jobs of `owner` that are active or ready
    async fn jobs(&self, owner: Owner, access_token: &str) -> Result<Fetched<Vec<Job>>>;

    /// Resolve a type with its group and category (public endpoints)
    async fn universe_type(&self, type_id: i64) -> Result<UniverseType>;
}
