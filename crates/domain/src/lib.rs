//! # Auspex Domain
//!
//! Domain types shared by every Auspex crate.
//!
//! This crate contains:
//! - Subjects, credentials and the records mirrored from ESI
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Auspex crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
