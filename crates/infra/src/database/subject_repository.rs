//! Characters, corporations and credentials

use async_trait::async_trait;
use auspex_core::{CredentialRepository, SubjectRepository};
use auspex_domain::{AuspexError, Character, Corporation, Credential, Owner, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::store::{owner_params, time_column, SqliteStore};
use crate::errors::InfraError;

const CORPORATION_SELECT: &str = "SELECT co.id, co.name, co.delegate_id, ch.name, co.created_at
     FROM corporations co JOIN characters ch ON ch.id = co.delegate_id";

fn map_character_row(row: &Row<'_>) -> rusqlite::Result<Character> {
    Ok(Character { id: row.get(0)?, name: row.get(1)?, created_at: time_column(row, 2)? })
}

fn map_corporation_row(row: &Row<'_>) -> rusqlite::Result<Corporation> {
    Ok(Corporation {
        id: row.get(0)?,
        name: row.get(1)?,
        delegate_id: row.get(2)?,
        delegate_name: row.get(3)?,
        created_at: time_column(row, 4)?,
    })
}

#[async_trait]
impl SubjectRepository for SqliteStore {
    async fn list_characters(&self) -> Result<Vec<Character>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, created_at FROM characters ORDER BY id")?;
            let rows = stmt.query_map([], map_character_row)?.collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
        .await
    }

    async fn list_corporations(&self) -> Result<Vec<Corporation>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!("{CORPORATION_SELECT} ORDER BY co.id"))?;
            let rows = stmt.query_map([], map_corporation_row)?.collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
        .await
    }

    async fn get_character(&self, id: i64) -> Result<Option<Character>> {
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, created_at FROM characters WHERE id = ?1",
                    params![id],
                    map_character_row,
                )
                .optional()?)
        })
        .await
    }

    async fn get_corporation(&self, id: i64) -> Result<Option<Corporation>> {
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    &format!("{CORPORATION_SELECT} WHERE co.id = ?1"),
                    params![id],
                    map_corporation_row,
                )
                .optional()?)
        })
        .await
    }

    async fn upsert_character(&self, id: i64, name: &str, credential: &Credential) -> Result<()> {
        let name = name.to_string();
        let credential = credential.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO characters
                     (id, name, access_token, refresh_token, token_expiry, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     access_token = excluded.access_token,
                     refresh_token = excluded.refresh_token,
                     token_expiry = excluded.token_expiry",
                params![
                    id,
                    name,
                    credential.access_token,
                    credential.refresh_token,
                    credential.expires_at.timestamp(),
                    Utc::now().timestamp()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_corporation(&self, id: i64, name: &str, delegate_id: i64) -> Result<()> {
        let name = name.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO corporations (id, name, delegate_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, name, delegate_id, Utc::now().timestamp()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_subject(&self, owner: Owner) -> Result<bool> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let (owner_type, owner_id) = owner_params(owner);

            if let Owner::Character(id) = owner {
                let delegating: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM corporations WHERE delegate_id = ?1 LIMIT 1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(corp_id) = delegating {
                    return Err(InfraError(AuspexError::InvalidInput(format!(
                        "character {id} is the delegate of corporation {corp_id}"
                    ))));
                }
            }

            for table in ["blueprints", "jobs", "sync_state"] {
                tx.execute(
                    &format!("DELETE FROM {table} WHERE owner_type = ?1 AND owner_id = ?2"),
                    params![owner_type, owner_id],
                )?;
            }
            let subject_table = match owner {
                Owner::Character(_) => "characters",
                Owner::Corporation(_) => "corporations",
            };
            let removed =
                tx.execute(&format!("DELETE FROM {subject_table} WHERE id = ?1"), params![owner_id])?;

            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl CredentialRepository for SqliteStore {
    async fn get_credential(&self, character_id: i64) -> Result<Option<Credential>> {
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT access_token, refresh_token, token_expiry FROM characters WHERE id = ?1",
                    params![character_id],
                    |row| {
                        Ok(Credential {
                            access_token: row.get(0)?,
                            refresh_token: row.get(1)?,
                            expires_at: time_column(row, 2)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    async fn save_credential(&self, character_id: i64, credential: &Credential) -> Result<()> {
        let credential = credential.clone();
        self.run(move |conn| {
            let updated = conn.execute(
                "UPDATE characters
                 SET access_token = ?2, refresh_token = ?3, token_expiry = ?4
                 WHERE id = ?1",
                params![
                    character_id,
                    credential.access_token,
                    credential.refresh_token,
                    credential.expires_at.timestamp()
                ],
            )?;
            if updated == 0 {
                return Err(InfraError(AuspexError::NotFound(format!("character {character_id}"))));
            }
            Ok(())
        })
        .await
    }
}
