//! Subject service - adding, listing and removing tracked subjects

use std::sync::Arc;

use auspex_domain::{AuspexError, Character, Corporation, Owner, Result, SyncStatusRow};
use tracing::info;

use crate::store::ports::{SubjectRepository, SyncStateRepository};

/// Subject service
pub struct SubjectService {
    subjects: Arc<dyn SubjectRepository>,
    sync_state: Arc<dyn SyncStateRepository>,
}

impl SubjectService {
    pub fn new(
        subjects: Arc<dyn SubjectRepository>,
        sync_state: Arc<dyn SyncStateRepository>,
    ) -> Self {
        Self { subjects, sync_state }
    }

    pub async fn list_characters(&self) -> Result<Vec<Character>> {
        self.subjects.list_characters().await
    }

    pub async fn list_corporations(&self) -> Result<Vec<Corporation>> {
        self.subjects.list_corporations().await
    }

    /// Sync state rows joined with owner names
    pub async fn sync_status(&self) -> Result<Vec<SyncStatusRow>> {
        self.sync_state.list_sync_status().await
    }

    /// Start tracking a corporation on behalf of an existing character.
    ///
    /// # Errors
    /// `InvalidInput` when a field is missing, the delegate is unknown, or
    /// the corporation is already tracked.
    pub async fn add_corporation(&self, id: i64, name: &str, delegate_id: i64) -> Result<()> {
        if id <= 0 || name.trim().is_empty() || delegate_id <= 0 {
            return Err(AuspexError::InvalidInput(
                "id, name, and delegate_id are required".into(),
            ));
        }

        if self.subjects.get_character(delegate_id).await?.is_none() {
            return Err(AuspexError::InvalidInput(
                "delegate_id does not refer to a known character".into(),
            ));
        }

        if self.subjects.get_corporation(id).await?.is_some() {
            return Err(AuspexError::InvalidInput(format!("corporation {id} is already tracked")));
        }

        self.subjects.insert_corporation(id, name.trim(), delegate_id).await?;
        info!(corporation_id = id, delegate_id, "Corporation added");
        Ok(())
    }

    /// Stop tracking a subject and delete everything stored for it.
    ///
    /// # Errors
    /// `NotFound` when no such subject exists.
    pub async fn remove(&self, owner: Owner) -> Result<()> {
        if !self.subjects.delete_subject(owner).await? {
            return Err(AuspexError::NotFound(format!("{owner} is not tracked")));
        }
        info!(%owner, "Subject removed");
        Ok(())
    }
}
