//! Domain types and models

pub mod credential;
pub mod industry;
pub mod subject;
pub mod sync;
pub mod universe;

pub use credential::Credential;
pub use industry::{Blueprint, Job, JobActivity, JobStatus};
pub use subject::{Character, Corporation, Owner, OwnerKind, Subject};
pub use sync::{Endpoint, Fetched, SyncState, SyncStatusRow};
pub use universe::{EveCategory, EveGroup, EveType, UniverseType};
