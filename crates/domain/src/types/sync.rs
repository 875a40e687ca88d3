//! Sync bookkeeping types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::subject::{Owner, OwnerKind};

/// Per-subject ESI endpoint tracked in `sync_state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Blueprints,
    Jobs,
}

impl Endpoint {
    /// Every endpoint, in the order a cycle visits them
    pub const ALL: [Self; 2] = [Self::Blueprints, Self::Jobs];

    /// Name stored in `sync_state.endpoint`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blueprints => "blueprints",
            Self::Jobs => "jobs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blueprints" => Some(Self::Blueprints),
            "jobs" => Some(Self::Jobs),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last successful sync of one (owner, endpoint) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub owner: Owner,
    pub endpoint: Endpoint,
    pub last_sync: DateTime<Utc>,
    /// ESI cache expiry; the pair is fresh until this instant
    pub cache_until: DateTime<Utc>,
}

impl SyncState {
    /// True while the cached ESI response has not expired
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.cache_until > now
    }
}

/// Sync state joined with the owner's display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusRow {
    pub owner_type: OwnerKind,
    pub owner_id: i64,
    pub owner_name: String,
    pub endpoint: Endpoint,
    pub last_sync: DateTime<Utc>,
    pub cache_until: DateTime<Utc>,
}

/// Decoded ESI payload together with its cache expiry
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub cache_until: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn freshness_is_strictly_before_cache_until() {
        let now = Utc::now();
        let state = SyncState {
            owner: Owner::Character(1),
            endpoint: Endpoint::Jobs,
            last_sync: now,
            cache_until: now,
        };
        assert!(!state.is_fresh(now));
        assert!(state.is_fresh(now - Duration::seconds(1)));
    }

    #[test]
    fn endpoints_are_visited_blueprints_first() {
        assert_eq!(Endpoint::ALL, [Endpoint::Blueprints, Endpoint::Jobs]);
        assert_eq!(Endpoint::parse("jobs"), Some(Endpoint::Jobs));
    }
}
