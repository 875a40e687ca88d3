//! Sync service - decides what to refresh and reconciles ESI data with the
//! local store

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use auspex_domain::{AuspexError, Endpoint, Owner, Result, Subject, SyncState};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::esi::ports::EsiClient;
use crate::store::ports::SyncRepositories;

/// Outcome of one sync cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// (subject, endpoint) pairs fetched and persisted
    pub synced: usize,
    /// Pairs whose cache had not expired
    pub skipped: usize,
    /// Pairs abandoned after an error
    pub failed: usize,
    /// Cycle stopped early because of cancellation
    pub cancelled: bool,
}

/// Sync service
///
/// The ESI client handed to the service is expected to supply credentials
/// itself; the service always passes an empty access token.
pub struct SyncService {
    esi: Arc<dyn EsiClient>,
    repos: SyncRepositories,
}

impl SyncService {
    /// Build a service over an authorized ESI client
    pub fn new(esi: Arc<dyn EsiClient>, repos: SyncRepositories) -> Self {
        Self { esi, repos }
    }

    /// Run one cycle over every character, then every corporation.
    ///
    /// Unless `force` is set, pairs whose `cache_until` lies in the future are
    /// skipped. Failures are logged and isolated to their pair; a failure to
    /// list subjects ends the cycle.
    #[instrument(skip(self, cancel))]
    pub async fn run_cycle(&self, force: bool, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();

        let subjects = match self.list_subjects().await {
            Ok(subjects) => subjects,
            Err(err) => {
                error!(error = %err, "Failed to list subjects; ending sync cycle");
                return report;
            }
        };

        'subjects: for subject in &subjects {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let owner = subject.owner();

            for endpoint in Endpoint::ALL {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'subjects;
                }

                if !force && self.is_fresh(owner, endpoint, Utc::now()).await {
                    debug!(%owner, %endpoint, "Cache still fresh; skipping");
                    report.skipped += 1;
                    continue;
                }

                match self.sync_subject(owner, endpoint).await {
                    Ok(()) => report.synced += 1,
                    Err(err) if err.is_cancelled() => {
                        report.cancelled = true;
                        break 'subjects;
                    }
                    Err(err) => {
                        warn!(%owner, %endpoint, error = %err, "Sync failed; leaving state untouched");
                        report.failed += 1;
                    }
                }
            }
        }

        if report.cancelled {
            debug!("Sync cycle cancelled");
        }
        info!(
            subjects = subjects.len(),
            synced = report.synced,
            skipped = report.skipped,
            failed = report.failed,
            "Sync cycle finished"
        );
        report
    }

    /// Fetch and persist one endpoint of one subject.
    ///
    /// Sync state is written only after the data has been stored; any error
    /// leaves it untouched so the pair is retried next cycle.
    #[instrument(skip(self))]
    pub async fn sync_subject(&self, owner: Owner, endpoint: Endpoint) -> Result<()> {
        match endpoint {
            Endpoint::Blueprints => self.sync_blueprints(owner).await,
            Endpoint::Jobs => self.sync_jobs(owner).await,
        }
    }

    /// Resolve and store any type ids not yet known locally.
    ///
    /// Failures are logged per id and do not stop the batch. Returns the
    /// number of types inserted.
    pub async fn resolve_type_ids(&self, type_ids: &[i64]) -> usize {
        let mut resolved = 0;

        for &type_id in type_ids {
            match self.repos.universe.get_type(type_id).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(err) => {
                    warn!(type_id, error = %err, "Failed to look up type; skipping");
                    continue;
                }
            }

            match self.resolve_type(type_id).await {
                Ok(()) => resolved += 1,
                Err(err) if err.is_cancelled() => break,
                Err(err) => warn!(type_id, error = %err, "Failed to resolve type; skipping"),
            }
        }

        resolved
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let characters = self.repos.subjects.list_characters().await?;
        let corporations = self.repos.subjects.list_corporations().await?;

        Ok(characters
            .into_iter()
            .map(Subject::Character)
            .chain(corporations.into_iter().map(Subject::Corporation))
            .collect())
    }

    async fn is_fresh(&self, owner: Owner, endpoint: Endpoint, now: DateTime<Utc>) -> bool {
        match self.repos.sync_state.get_sync_state(owner, endpoint).await {
            Ok(Some(state)) => state.is_fresh(now),
            Ok(None) => false,
            Err(err) => {
                warn!(%owner, %endpoint, error = %err, "Failed to read sync state; treating as stale");
                false
            }
        }
    }

    async fn sync_blueprints(&self, owner: Owner) -> Result<()> {
        let fetched = self.esi.blueprints(owner, "").await?;

        let fetched_types: BTreeSet<i64> = fetched.data.iter().map(|b| b.type_id).collect();
        let type_ids: Vec<i64> = fetched_types.iter().copied().collect();
        self.resolve_type_ids(&type_ids).await;

        self.repos.blueprints.upsert_blueprints(owner, &fetched.data).await?;
        self.write_state(owner, Endpoint::Blueprints, fetched.cache_until).await?;
        info!(%owner, count = fetched.data.len(), "Blueprints synced");

        // Older rows may still reference types an earlier resolution missed.
        match self.repos.blueprints.list_blueprint_type_ids(owner).await {
            Ok(stored) => {
                let backfill: Vec<i64> =
                    stored.into_iter().filter(|id| !fetched_types.contains(id)).collect();
                if !backfill.is_empty() {
                    self.resolve_type_ids(&backfill).await;
                }
            }
            Err(err) => warn!(%owner, error = %err, "Failed to list stored blueprint types"),
        }

        Ok(())
    }

    async fn sync_jobs(&self, owner: Owner) -> Result<()> {
        let fetched = self.esi.jobs(owner, "").await?;
        self.repos.jobs.upsert_jobs(owner, &fetched.data).await?;

        let current: HashSet<i64> = fetched.data.iter().map(|j| j.job_id).collect();
        let stored = self.repos.jobs.list_job_ids(owner).await?;
        let mut pruned = 0;
        for job_id in stored.into_iter().filter(|id| !current.contains(id)) {
            self.repos.jobs.delete_job(job_id).await?;
            pruned += 1;
        }

        self.write_state(owner, Endpoint::Jobs, fetched.cache_until).await?;
        info!(%owner, count = fetched.data.len(), pruned, "Jobs synced");
        Ok(())
    }

    async fn resolve_type(&self, type_id: i64) -> Result<()> {
        let universe_type = self.esi.universe_type(type_id).await?;
        if universe_type.type_id != type_id {
            return Err(AuspexError::InvalidInput(format!(
                "ESI returned type {} for requested type {type_id}",
                universe_type.type_id
            )));
        }

        let (category, group, eve_type) = universe_type.into_rows();
        self.repos.universe.insert_category(&category).await?;
        self.repos.universe.insert_group(&group).await?;
        self.repos.universe.insert_type(&eve_type).await?;
        debug!(type_id, name = %eve_type.name, "Type resolved");
        Ok(())
    }

    async fn write_state(
        &self,
        owner: Owner,
        endpoint: Endpoint,
        cache_until: DateTime<Utc>,
    ) -> Result<()> {
        let state = SyncState { owner, endpoint, last_sync: Utc::now(), cache_until };
        self.repos.sync_state.upsert_sync_state(&state).await
    }
}
