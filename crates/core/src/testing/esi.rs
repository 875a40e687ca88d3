//! Scripted ESI client

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use auspex_domain::{AuspexError, Blueprint, Fetched, Job, Owner, Result, UniverseType};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::esi::ports::EsiClient;

/// Call received by [`MockEsiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EsiCall {
    Blueprints { owner: Owner, access_token: String },
    Jobs { owner: Owner, access_token: String },
    UniverseType(i64),
}

#[derive(Default)]
struct Script {
    blueprints: HashMap<Owner, Result<Fetched<Vec<Blueprint>>>>,
    jobs: HashMap<Owner, Result<Fetched<Vec<Job>>>>,
    types: HashMap<i64, Result<UniverseType>>,
    calls: Vec<EsiCall>,
    cancel_after: Option<(usize, CancellationToken)>,
}

/// ESI client returning programmed responses and recording every call.
///
/// Unscripted requests fail with `AuspexError::NotFound`.
#[derive(Default)]
pub struct MockEsiClient {
    script: Mutex<Script>,
}

impl MockEsiClient {
    /// Client with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blueprints(
        self,
        owner: Owner,
        blueprints: Vec<Blueprint>,
        cache_until: DateTime<Utc>,
    ) -> Self {
        self.set_blueprints(owner, Ok(Fetched { data: blueprints, cache_until }));
        self
    }

    pub fn with_jobs(self, owner: Owner, jobs: Vec<Job>, cache_until: DateTime<Utc>) -> Self {
        self.set_jobs(owner, Ok(Fetched { data: jobs, cache_until }));
        self
    }

    pub fn with_universe_type(self, universe_type: UniverseType) -> Self {
        self.set_universe_type(universe_type.type_id, Ok(universe_type));
        self
    }

    /// Replace the blueprint response for `owner`
    pub fn set_blueprints(&self, owner: Owner, response: Result<Fetched<Vec<Blueprint>>>) {
        self.script.lock().unwrap().blueprints.insert(owner, response);
    }

    pub fn set_jobs(&self, owner: Owner, response: Result<Fetched<Vec<Job>>>) {
        self.script.lock().unwrap().jobs.insert(owner, response);
    }

    pub fn set_universe_type(&self, type_id: i64, response: Result<UniverseType>) {
        self.script.lock().unwrap().types.insert(type_id, response);
    }

    /// Cancel `token` once `calls` requests have been served
    pub fn cancel_after(&self, calls: usize, token: CancellationToken) {
        self.script.lock().unwrap().cancel_after = Some((calls, token));
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<EsiCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Calls other than universe lookups
    pub fn subject_calls(&self) -> Vec<EsiCall> {
        self.calls().into_iter().filter(|c| !matches!(c, EsiCall::UniverseType(_))).collect()
    }

    /// Type ids requested through `universe_type`
    pub fn universe_calls(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EsiCall::UniverseType(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(script: &mut Script, call: EsiCall) {
        script.calls.push(call);
        if let Some((after, token)) = &script.cancel_after {
            if script.calls.len() >= *after {
                token.cancel();
            }
        }
    }
}

fn unscripted(what: String) -> AuspexError {
    AuspexError::NotFound(format!("no scripted response for {what}"))
}

#[async_trait]
impl EsiClient for MockEsiClient {
    async fn blueprints(&self, owner: Owner, access_token: &str) -> Result<Fetched<Vec<Blueprint>>> {
        let mut script = self.script.lock().unwrap();
        Self::record(
            &mut script,
            EsiCall::Blueprints { owner, access_token: access_token.to_string() },
        );
        script
            .blueprints
            .get(&owner)
            .cloned()
            .unwrap_or_else(|| Err(unscripted(format!("blueprints of {owner}"))))
    }

    async fn jobs(&self, owner: Owner, access_token: &str) -> Result<Fetched<Vec<Job>>> {
        let mut script = self.script.lock().unwrap();
        Self::record(&mut script, EsiCall::Jobs { owner, access_token: access_token.to_string() });
        script
            .jobs
            .get(&owner)
            .cloned()
            .unwrap_or_else(|| Err(unscripted(format!("jobs of {owner}"))))
    }

    async fn universe_type(&self, type_id: i64) -> Result<UniverseType> {
        let mut script = self.script.lock().unwrap();
        Self::record(&mut script, EsiCall::UniverseType(type_id));
        script
            .types
            .get(&type_id)
            .cloned()
            .unwrap_or_else(|| Err(unscripted(format!("type {type_id}"))))
    }
}
