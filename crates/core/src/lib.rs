//! # Auspex Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the ESI client and the local store
//! - The sync service that decides what to refresh and reconciles results
//! - Subject management rules (adding and removing characters/corporations)
//!
//! ## Architecture Principles
//! - Only depends on `auspex-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod esi;
pub mod store;
pub mod subjects;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use esi::ports::EsiClient;
pub use store::ports::{
    BlueprintRepository, CredentialRepository, JobRepository, SubjectRepository,
    SyncRepositories, SyncStateRepository, UniverseRepository,
};
pub use subjects::SubjectService;
pub use sync::{CycleReport, SyncService};
