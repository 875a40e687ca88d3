//! Per-owner, per-endpoint sync bookkeeping

use std::str::FromStr;

use async_trait::async_trait;
use auspex_core::SyncStateRepository;
use auspex_domain::{Endpoint, Owner, OwnerKind, Result, SyncState, SyncStatusRow};
use rusqlite::{params, OptionalExtension};

use super::store::{owner_params, text_column, time_column, SqliteStore};

#[async_trait]
impl SyncStateRepository for SqliteStore {
    async fn get_sync_state(&self, owner: Owner, endpoint: Endpoint) -> Result<Option<SyncState>> {
        self.run(move |conn| {
            let (owner_type, owner_id) = owner_params(owner);
            Ok(conn
                .query_row(
                    "SELECT last_sync, cache_until FROM sync_state
                     WHERE owner_type = ?1 AND owner_id = ?2 AND endpoint = ?3",
                    params![owner_type, owner_id, endpoint.as_str()],
                    |row| {
                        Ok(SyncState {
                            owner,
                            endpoint,
                            last_sync: time_column(row, 0)?,
                            cache_until: time_column(row, 1)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<()> {
        let state = state.clone();
        self.run(move |conn| {
            let (owner_type, owner_id) = owner_params(state.owner);
            conn.execute(
                "INSERT INTO sync_state (owner_type, owner_id, endpoint, last_sync, cache_until)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(owner_type, owner_id, endpoint) DO UPDATE SET
                     last_sync = excluded.last_sync,
                     cache_until = excluded.cache_until",
                params![
                    owner_type,
                    owner_id,
                    state.endpoint.as_str(),
                    state.last_sync.timestamp(),
                    state.cache_until.timestamp()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_sync_status(&self) -> Result<Vec<SyncStatusRow>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.owner_type, s.owner_id, COALESCE(ch.name, co.name, ''), s.endpoint,
                        s.last_sync, s.cache_until
                 FROM sync_state s
                 LEFT JOIN characters ch ON s.owner_type = 'character' AND ch.id = s.owner_id
                 LEFT JOIN corporations co ON s.owner_type = 'corporation' AND co.id = s.owner_id
                 ORDER BY s.owner_type, s.owner_id, s.endpoint",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SyncStatusRow {
                        owner_type: text_column(row, 0, |s| OwnerKind::from_str(s).ok())?,
                        owner_id: row.get(1)?,
                        owner_name: row.get(2)?,
                        endpoint: text_column(row, 3, Endpoint::parse)?,
                        last_sync: time_column(row, 4)?,
                        cache_until: time_column(row, 5)?,
                    })
                })?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
        .await
    }
}
