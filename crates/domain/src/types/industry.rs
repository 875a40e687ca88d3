//! Industry records mirrored from ESI

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blueprint original owned by a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// ESI item id, unique across the universe
    pub item_id: i64,
    pub type_id: i64,
    pub location_id: i64,
    pub me_level: i64,
    pub te_level: i64,
}

/// Research and copy activities tracked by Auspex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobActivity {
    MeResearch,
    TeResearch,
    Copying,
}

impl JobActivity {
    /// Map an ESI `activity_id`; manufacturing, invention and the rest are
    /// not tracked.
    pub const fn from_activity_id(id: i64) -> Option<Self> {
        match id {
            3 => Some(Self::TeResearch),
            4 => Some(Self::MeResearch),
            5 => Some(Self::Copying),
            _ => None,
        }
    }

    /// Name stored in `jobs.activity`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MeResearch => "me_research",
            Self::TeResearch => "te_research",
            Self::Copying => "copying",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "me_research" => Some(Self::MeResearch),
            "te_research" => Some(Self::TeResearch),
            "copying" => Some(Self::Copying),
            _ => None,
        }
    }
}

impl fmt::Display for JobActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job states kept locally; delivered, cancelled and paused jobs are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Ready,
}

impl JobStatus {
    /// Inverse of [`JobStatus::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Industry job running against a blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: i64,
    pub blueprint_id: i64,
    pub installer_id: i64,
    pub activity: JobActivity,
    pub status: JobStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}
