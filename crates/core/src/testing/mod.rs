//! Test doubles for the core ports
//!
//! Available to this crate's tests and, through the `test-utils` feature, to
//! downstream crates.

// Test doubles keep error handling simple; a poisoned lock fails the test.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod esi;
pub mod store;

pub use esi::{EsiCall, MockEsiClient};
pub use store::{FailPoint, InMemoryStore, StoreOp};
