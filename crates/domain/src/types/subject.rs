//! Subjects: the characters and corporations whose data is mirrored

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AuspexError;

/// Owner kind as stored in `owner_type` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Character,
    Corporation,
}

impl OwnerKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Corporation => "corporation",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = AuspexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(Self::Character),
            "corporation" => Ok(Self::Corporation),
            other => Err(AuspexError::InvalidInput(format!("unknown owner type: {other}"))),
        }
    }
}

/// Identity of a subject: (owner kind, owner id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "owner_type", content = "owner_id", rename_all = "snake_case")]
pub enum Owner {
    Character(i64),
    Corporation(i64),
}

impl Owner {
    pub const fn new(kind: OwnerKind, id: i64) -> Self {
        match kind {
            OwnerKind::Character => Self::Character(id),
            OwnerKind::Corporation => Self::Corporation(id),
        }
    }

    pub const fn kind(self) -> OwnerKind {
        match self {
            Self::Character(_) => OwnerKind::Character,
            Self::Corporation(_) => OwnerKind::Corporation,
        }
    }

    /// Character or corporation id
    pub const fn id(self) -> i64 {
        match self {
            Self::Character(id) | Self::Corporation(id) => id,
        }
    }
}

/// Renders as `character:42` / `corporation:7`
impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A character registered through the SSO flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A corporation synced on behalf of one of its member characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corporation {
    pub id: i64,
    pub name: String,
    /// Character whose credential is used for corporation endpoints
    pub delegate_id: i64,
    pub delegate_name: String,
    pub created_at: DateTime<Utc>,
}

/// A tracked subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Character(Character),
    Corporation(Corporation),
}

impl Subject {
    /// Owner key used for sync bookkeeping
    pub const fn owner(&self) -> Owner {
        match self {
            Self::Character(c) => Owner::Character(c.id),
            Self::Corporation(c) => Owner::Corporation(c.id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Character(c) => &c.name,
            Self::Corporation(c) => &c.name,
        }
    }

    /// Character whose credential authorizes requests for this subject
    pub const fn credential_holder(&self) -> i64 {
        match self {
            Self::Character(c) => c.id,
            Self::Corporation(c) => c.delegate_id,
        }
    }
}
