//! SQLite-backed implementation of every store port

use std::sync::Arc;

use auspex_domain::{AuspexError, Owner, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use tokio::task;

use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

/// One store shared by all repository ports; each call runs on the blocking
/// pool with its own pooled connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<DbManager>,
}

impl SqliteStore {
    /// Wrap an open, migrated database
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<DbManager> {
        &self.db
    }

    pub(crate) async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> std::result::Result<T, InfraError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<T> {
            let mut conn = db.get_connection()?;
            op(&mut conn).map_err(AuspexError::from)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_join_error(err: task::JoinError) -> AuspexError {
    if err.is_cancelled() {
        AuspexError::Internal("database task cancelled".into())
    } else {
        AuspexError::Internal(format!("Task join error: {err}"))
    }
}

pub(crate) fn owner_params(owner: Owner) -> (&'static str, i64) {
    (owner.kind().as_str(), owner.id())
}

pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {secs} out of range").into(),
        )
    })
}

pub(crate) fn text_column<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unrecognised value '{raw}'").into(),
        )
    })
}
