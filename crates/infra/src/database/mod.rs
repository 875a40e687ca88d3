//! SQLite persistence

mod industry_repository;
pub mod manager;
pub mod store;
mod subject_repository;
mod sync_state_repository;
mod universe_repository;

pub use manager::{DbManager, SqliteConnection};
pub use store::SqliteStore;
