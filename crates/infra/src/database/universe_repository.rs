//! Reference data: categories, groups and types

use async_trait::async_trait;
use auspex_core::UniverseRepository;
use auspex_domain::{EveCategory, EveGroup, EveType, Result};
use rusqlite::{params, OptionalExtension};

use super::store::SqliteStore;

#[async_trait]
impl UniverseRepository for SqliteStore {
    async fn get_type(&self, type_id: i64) -> Result<Option<EveType>> {
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, group_id, name FROM eve_types WHERE id = ?1",
                    params![type_id],
                    |row| Ok(EveType { id: row.get(0)?, group_id: row.get(1)?, name: row.get(2)? }),
                )
                .optional()?)
        })
        .await
    }

    async fn insert_category(&self, category: &EveCategory) -> Result<()> {
        let category = category.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO eve_categories (id, name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                params![category.id, category.name],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_group(&self, group: &EveGroup) -> Result<()> {
        let group = group.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO eve_groups (id, category_id, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET category_id = excluded.category_id, name = excluded.name",
                params![group.id, group.category_id, group.name],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_type(&self, eve_type: &EveType) -> Result<()> {
        let eve_type = eve_type.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO eve_types (id, group_id, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET group_id = excluded.group_id, name = excluded.name",
                params![eve_type.id, eve_type.group_id, eve_type.name],
            )?;
            Ok(())
        })
        .await
    }
}
