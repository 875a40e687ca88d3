//! Industry job endpoints

use auspex_domain::{Fetched, Job, JobActivity, JobStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::client::EsiHttpClient;
use super::errors::EsiResult;

#[derive(Debug, Deserialize)]
struct EsiJob {
    job_id: i64,
    blueprint_id: i64,
    installer_id: i64,
    activity_id: i64,
    status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl EsiJob {
    /// Keep active/ready research and copy jobs
    fn into_tracked(self) -> Option<Job> {
        let activity = JobActivity::from_activity_id(self.activity_id)?;
        let status = JobStatus::parse(&self.status)?;
        Some(Job {
            job_id: self.job_id,
            blueprint_id: self.blueprint_id,
            installer_id: self.installer_id,
            activity,
            status,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

impl EsiHttpClient {
    /// Research and copy jobs installed by a character
    pub async fn character_jobs(
        &self,
        character_id: i64,
        access_token: &str,
    ) -> EsiResult<Fetched<Vec<Job>>> {
        let url = self.url(&format!("/characters/{character_id}/industry/jobs"));
        self.fetch_jobs(&url, access_token).await
    }

    /// Research and copy jobs of a corporation
    pub async fn corporation_jobs(
        &self,
        corporation_id: i64,
        access_token: &str,
    ) -> EsiResult<Fetched<Vec<Job>>> {
        let url = self.url(&format!("/corporations/{corporation_id}/industry/jobs"));
        self.fetch_jobs(&url, access_token).await
    }

    async fn fetch_jobs(&self, url: &str, access_token: &str) -> EsiResult<Fetched<Vec<Job>>> {
        let (raw, cache_until) = self.get_json::<Vec<EsiJob>>(url, Some(access_token)).await?;
        let data = raw.into_iter().filter_map(EsiJob::into_tracked).collect();
        Ok(Fetched { data, cache_until })
    }
}
