//! Blueprints and industry jobs, keyed by owner

use async_trait::async_trait;
use auspex_core::{BlueprintRepository, JobRepository};
use auspex_domain::{Blueprint, Job, Owner, Result};
use chrono::Utc;
use rusqlite::params;

use super::store::{owner_params, SqliteStore};

#[async_trait]
impl BlueprintRepository for SqliteStore {
    async fn upsert_blueprints(&self, owner: Owner, blueprints: &[Blueprint]) -> Result<()> {
        let blueprints = blueprints.to_vec();
        self.run(move |conn| {
            let (owner_type, owner_id) = owner_params(owner);
            let now = Utc::now().timestamp();
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO blueprints
                         (item_id, owner_type, owner_id, type_id, location_id, me_level, te_level, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(item_id) DO UPDATE SET
                         owner_type = excluded.owner_type,
                         owner_id = excluded.owner_id,
                         type_id = excluded.type_id,
                         location_id = excluded.location_id,
                         me_level = excluded.me_level,
                         te_level = excluded.te_level,
                         updated_at = excluded.updated_at",
                )?;
                for bp in &blueprints {
                    stmt.execute(params![
                        bp.item_id,
                        owner_type,
                        owner_id,
                        bp.type_id,
                        bp.location_id,
                        bp.me_level,
                        bp.te_level,
                        now
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_blueprint_type_ids(&self, owner: Owner) -> Result<Vec<i64>> {
        self.run(move |conn| {
            let (owner_type, owner_id) = owner_params(owner);
            let mut stmt = conn.prepare(
                "SELECT DISTINCT type_id FROM blueprints
                 WHERE owner_type = ?1 AND owner_id = ?2 ORDER BY type_id",
            )?;
            let ids = stmt
                .query_map(params![owner_type, owner_id], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            Ok(ids)
        })
        .await
    }
}

#[async_trait]
impl JobRepository for SqliteStore {
    async fn upsert_jobs(&self, owner: Owner, jobs: &[Job]) -> Result<()> {
        let jobs = jobs.to_vec();
        self.run(move |conn| {
            let (owner_type, owner_id) = owner_params(owner);
            let now = Utc::now().timestamp();
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO jobs
                         (job_id, owner_type, owner_id, blueprint_id, installer_id, activity,
                          status, start_date, end_date, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(job_id) DO UPDATE SET
                         owner_type = excluded.owner_type,
                         owner_id = excluded.owner_id,
                         blueprint_id = excluded.blueprint_id,
                         installer_id = excluded.installer_id,
                         activity = excluded.activity,
                         status = excluded.status,
                         start_date = excluded.start_date,
                         end_date = excluded.end_date,
                         updated_at = excluded.updated_at",
                )?;
                for job in &jobs {
                    stmt.execute(params![
                        job.job_id,
                        owner_type,
                        owner_id,
                        job.blueprint_id,
                        job.installer_id,
                        job.activity.as_str(),
                        job.status.as_str(),
                        job.start_date.timestamp(),
                        job.end_date.timestamp(),
                        now
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_job_ids(&self, owner: Owner) -> Result<Vec<i64>> {
        self.run(move |conn| {
            let (owner_type, owner_id) = owner_params(owner);
            let mut stmt = conn.prepare(
                "SELECT job_id FROM jobs WHERE owner_type = ?1 AND owner_id = ?2 ORDER BY job_id",
            )?;
            let ids = stmt
                .query_map(params![owner_type, owner_id], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            Ok(ids)
        })
        .await
    }

    async fn delete_job(&self, job_id: i64) -> Result<()> {
        self.run(move |conn| {
            conn.execute("DELETE FROM jobs WHERE job_id = ?1", params![job_id])?;
            Ok(())
        })
        .await
    }
}
