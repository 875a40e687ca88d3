//! In-memory store implementing every repository port

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use auspex_domain::{
    AuspexError, Blueprint, Character, Corporation, Credential, Endpoint, EveCategory, EveGroup,
    EveType, Job, Owner, Result, SyncState, SyncStatusRow,
};
use chrono::Utc;

use crate::store::ports::{
    BlueprintRepository, CredentialRepository, JobRepository, SubjectRepository,
    SyncStateRepository, UniverseRepository,
};

/// Mutating operation recorded by [`InMemoryStore`], in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    UpsertCharacter(i64),
    SaveCredential(i64),
    InsertCorporation(i64),
    DeleteSubject(Owner),
    UpsertBlueprints(Owner, usize),
    UpsertJobs(Owner, usize),
    DeleteJob(i64),
    UpsertSyncState(Owner, Endpoint),
    InsertCategory(i64),
    InsertGroup(i64),
    InsertType(i64),
}

/// Operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ListCharacters,
    GetSyncState,
    UpsertBlueprints,
    UpsertJobs,
    UpsertSyncState,
    InsertType,
}

#[derive(Default)]
struct Inner {
    characters: BTreeMap<i64, Character>,
    credentials: HashMap<i64, Credential>,
    corporations: BTreeMap<i64, Corporation>,
    sync_states: HashMap<(Owner, Endpoint), SyncState>,
    blueprints: BTreeMap<i64, (Owner, Blueprint)>,
    jobs: BTreeMap<i64, (Owner, Job)>,
    categories: BTreeMap<i64, EveCategory>,
    groups: BTreeMap<i64, EveGroup>,
    types: BTreeMap<i64, EveType>,
    ops: Vec<StoreOp>,
    failures: HashSet<FailPoint>,
}

impl Inner {
    fn check(&self, point: FailPoint) -> Result<()> {
        if self.failures.contains(&point) {
            return Err(AuspexError::Database(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

/// Store that keeps everything in memory and enforces the same referential
/// rules as the SQLite schema.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a character and its credential without recording an operation
    pub fn seed_character(&self, id: i64, name: &str, credential: Credential) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .characters
            .insert(id, Character { id, name: name.to_string(), created_at: Utc::now() });
        inner.credentials.insert(id, credential);
    }

    pub fn seed_corporation(&self, id: i64, name: &str, delegate_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        let delegate_name =
            inner.characters.get(&delegate_id).map(|c| c.name.clone()).unwrap_or_default();
        inner.corporations.insert(
            id,
            Corporation {
                id,
                name: name.to_string(),
                delegate_id,
                delegate_name,
                created_at: Utc::now(),
            },
        );
    }

    pub fn seed_sync_state(&self, state: SyncState) {
        let mut inner = self.inner.lock().unwrap();
        inner.sync_states.insert((state.owner, state.endpoint), state);
    }

    pub fn seed_blueprint(&self, owner: Owner, blueprint: Blueprint) {
        let mut inner = self.inner.lock().unwrap();
        inner.blueprints.insert(blueprint.item_id, (owner, blueprint));
    }

    pub fn seed_job(&self, owner: Owner, job: Job) {
        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(job.job_id, (owner, job));
    }

    pub fn seed_type(&self, eve_type: EveType) {
        let mut inner = self.inner.lock().unwrap();
        inner.types.insert(eve_type.id, eve_type);
    }

    /// Make every later call at `point` return an error
    pub fn fail(&self, point: FailPoint) {
        self.inner.lock().unwrap().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.inner.lock().unwrap().failures.clear();
    }

    /// Mutating calls, in order
    pub fn ops(&self) -> Vec<StoreOp> {
        self.inner.lock().unwrap().ops.clone()
    }

    pub fn credential(&self, character_id: i64) -> Option<Credential> {
        self.inner.lock().unwrap().credentials.get(&character_id).cloned()
    }

    pub fn sync_state(&self, owner: Owner, endpoint: Endpoint) -> Option<SyncState> {
        self.inner.lock().unwrap().sync_states.get(&(owner, endpoint)).cloned()
    }

    pub fn blueprints(&self, owner: Owner) -> Vec<Blueprint> {
        let inner = self.inner.lock().unwrap();
        inner.blueprints.values().filter(|(o, _)| *o == owner).map(|(_, b)| b.clone()).collect()
    }

    pub fn jobs(&self, owner: Owner) -> Vec<Job> {
        let inner = self.inner.lock().unwrap();
        inner.jobs.values().filter(|(o, _)| *o == owner).map(|(_, j)| j.clone()).collect()
    }

    pub fn stored_type_ids(&self) -> Vec<i64> {
        self.inner.lock().unwrap().types.keys().copied().collect()
    }

    pub fn group(&self, id: i64) -> Option<EveGroup> {
        self.inner.lock().unwrap().groups.get(&id).cloned()
    }

    pub fn category(&self, id: i64) -> Option<EveCategory> {
        self.inner.lock().unwrap().categories.get(&id).cloned()
    }
}

#[async_trait]
impl SubjectRepository for InMemoryStore {
    async fn list_characters(&self) -> Result<Vec<Character>> {
        let inner = self.inner.lock().unwrap();
        inner.check(FailPoint::ListCharacters)?;
        Ok(inner.characters.values().cloned().collect())
    }

    async fn list_corporations(&self) -> Result<Vec<Corporation>> {
        Ok(self.inner.lock().unwrap().corporations.values().cloned().collect())
    }

    async fn get_character(&self, id: i64) -> Result<Option<Character>> {
        Ok(self.inner.lock().unwrap().characters.get(&id).cloned())
    }

    async fn get_corporation(&self, id: i64) -> Result<Option<Corporation>> {
        Ok(self.inner.lock().unwrap().corporations.get(&id).cloned())
    }

    async fn upsert_character(
        &self,
        id: i64,
        name: &str,
        credential: &Credential,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner.characters.get(&id).map_or_else(Utc::now, |c| c.created_at);
        inner.characters.insert(id, Character { id, name: name.to_string(), created_at });
        inner.credentials.insert(id, credential.clone());
        inner.ops.push(StoreOp::UpsertCharacter(id));
        Ok(())
    }

    async fn insert_corporation(&self, id: i64, name: &str, delegate_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let delegate_name = inner
            .characters
            .get(&delegate_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| AuspexError::Database("foreign key constraint violation".into()))?;
        if inner.corporations.contains_key(&id) {
            return Err(AuspexError::Database("unique constraint violation".into()));
        }
        inner.corporations.insert(
            id,
            Corporation {
                id,
                name: name.to_string(),
                delegate_id,
                delegate_name,
                created_at: Utc::now(),
            },
        );
        inner.ops.push(StoreOp::InsertCorporation(id));
        Ok(())
    }

    async fn delete_subject(&self, owner: Owner) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if let Owner::Character(id) = owner {
            if let Some(corp) = inner.corporations.values().find(|c| c.delegate_id == id) {
                return Err(AuspexError::InvalidInput(format!(
                    "character {id} is the delegate of corporation {}",
                    corp.id
                )));
            }
        }
        inner.blueprints.retain(|_, (o, _)| *o != owner);
        inner.jobs.retain(|_, (o, _)| *o != owner);
        inner.sync_states.retain(|(o, _), _| *o != owner);
        let existed = match owner {
            Owner::Character(id) => {
                inner.credentials.remove(&id);
                inner.characters.remove(&id).is_some()
            }
            Owner::Corporation(id) => inner.corporations.remove(&id).is_some(),
        };
        inner.ops.push(StoreOp::DeleteSubject(owner));
        Ok(existed)
    }
}

#[async_trait]
impl CredentialRepository for InMemoryStore {
    async fn get_credential(&self, character_id: i64) -> Result<Option<Credential>> {
        Ok(self.credential(character_id))
    }

    async fn save_credential(&self, character_id: i64, credential: &Credential) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.characters.contains_key(&character_id) {
            return Err(AuspexError::NotFound(format!("character {character_id}")));
        }
        inner.credentials.insert(character_id, credential.clone());
        inner.ops.push(StoreOp::SaveCredential(character_id));
        Ok(())
    }
}

#[async_trait]
impl SyncStateRepository for InMemoryStore {
    async fn get_sync_state(
        &self,
        owner: Owner,
        endpoint: Endpoint,
    ) -> Result<Option<SyncState>> {
        let inner = self.inner.lock().unwrap();
        inner.check(FailPoint::GetSyncState)?;
        Ok(inner.sync_states.get(&(owner, endpoint)).cloned())
    }

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.check(FailPoint::UpsertSyncState)?;
        inner.sync_states.insert((state.owner, state.endpoint), state.clone());
        inner.ops.push(StoreOp::UpsertSyncState(state.owner, state.endpoint));
        Ok(())
    }

    async fn list_sync_status(&self) -> Result<Vec<SyncStatusRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<SyncStatusRow> = inner
            .sync_states
            .values()
            .map(|state| {
                let owner_name = match state.owner {
                    Owner::Character(id) => inner.characters.get(&id).map(|c| c.name.clone()),
                    Owner::Corporation(id) => inner.corporations.get(&id).map(|c| c.name.clone()),
                };
                SyncStatusRow {
                    owner_type: state.owner.kind(),
                    owner_id: state.owner.id(),
                    owner_name: owner_name.unwrap_or_default(),
                    endpoint: state.endpoint,
                    last_sync: state.last_sync,
                    cache_until: state.cache_until,
                }
            })
            .collect();
        rows.sort_by_key(|row| (row.owner_type.as_str(), row.owner_id, row.endpoint.as_str()));
        Ok(rows)
    }
}

#[async_trait]
impl BlueprintRepository for InMemoryStore {
    async fn upsert_blueprints(&self, owner: Owner, blueprints: &[Blueprint]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.check(FailPoint::UpsertBlueprints)?;
        for blueprint in blueprints {
            inner.blueprints.insert(blueprint.item_id, (owner, blueprint.clone()));
        }
        inner.ops.push(StoreOp::UpsertBlueprints(owner, blueprints.len()));
        Ok(())
    }

    async fn list_blueprint_type_ids(&self, owner: Owner) -> Result<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        let ids: BTreeSet<i64> = inner
            .blueprints
            .values()
            .filter(|(o, _)| *o == owner)
            .map(|(_, b)| b.type_id)
            .collect();
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn upsert_jobs(&self, owner: Owner, jobs: &[Job]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.check(FailPoint::UpsertJobs)?;
        for job in jobs {
            inner.jobs.insert(job.job_id, (owner, job.clone()));
        }
        inner.ops.push(StoreOp::UpsertJobs(owner, jobs.len()));
        Ok(())
    }

    async fn list_job_ids(&self, owner: Owner) -> Result<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.iter().filter(|(_, (o, _))| *o == owner).map(|(id, _)| *id).collect())
    }

    async fn delete_job(&self, job_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.jobs.remove(&job_id);
        inner.ops.push(StoreOp::DeleteJob(job_id));
        Ok(())
    }
}

#[async_trait]
impl UniverseRepository for InMemoryStore {
    async fn get_type(&self, type_id: i64) -> Result<Option<EveType>> {
        Ok(self.inner.lock().unwrap().types.get(&type_id).cloned())
    }

    async fn insert_category(&self, category: &EveCategory) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.categories.entry(category.id).or_insert_with(|| category.clone());
        inner.ops.push(StoreOp::InsertCategory(category.id));
        Ok(())
    }

    async fn insert_group(&self, group: &EveGroup) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.categories.contains_key(&group.category_id) {
            return Err(AuspexError::Database("foreign key constraint violation".into()));
        }
        inner.groups.entry(group.id).or_insert_with(|| group.clone());
        inner.ops.push(StoreOp::InsertGroup(group.id));
        Ok(())
    }

    async fn insert_type(&self, eve_type: &EveType) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.check(FailPoint::InsertType)?;
        if !inner.groups.contains_key(&eve_type.group_id) {
            return Err(AuspexError::Database("foreign key constraint violation".into()));
        }
        inner.types.entry(eve_type.id).or_insert_with(|| eve_type.clone());
        inner.ops.push(StoreOp::InsertType(eve_type.id));
        Ok(())
    }
}
