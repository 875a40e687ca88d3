//! Resilient ESI HTTP client
//!
//! Every request is a GET. Status handling:
//! - 2xx: body and cache expiry are returned
//! - 429: wait `Retry-After` seconds (1s when missing or invalid, at most
//!   60s) and retry
//! - 5xx and network failures: wait 1s, 2s, 4s and retry
//! - other 4xx: fail immediately
//!
//! At most [`MAX_RETRIES`] retries follow the first attempt. Waits go through
//! an injectable [`Sleeper`] and are interrupted by cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auspex_core::EsiClient;
use auspex_domain::{Blueprint, Fetched, Job, Owner, Result as DomainResult, UniverseType};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, EXPIRES, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::errors::{EsiError, EsiResult};

/// Retries allowed after the first attempt
pub const MAX_RETRIES: u32 = 3;

/// Wait before the first 5xx retry; doubled for each further retry
const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound for a server-requested `Retry-After`
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Fallback when `Retry-After` is missing, malformed or negative
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Waits between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Resolve once `duration` has elapsed
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Configuration for the ESI client
#[derive(Debug, Clone)]
pub struct EsiClientConfig {
    /// Base URL, e.g. `https://esi.evetech.net/latest`
    pub base_url: String,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for EsiClientConfig {
    fn default() -> Self {
        Self {
            base_url: auspex_domain::DEFAULT_ESI_BASE_URL.to_string(),
            user_agent: auspex_domain::DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&auspex_domain::EsiConfig> for EsiClientConfig {
    fn from(config: &auspex_domain::EsiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            ..Self::default()
        }
    }
}

/// Result of a single attempt
enum Attempt {
    Done(String, DateTime<Utc>),
    Retry { delay: Duration, reason: String },
    Fail(EsiError),
}

/// ESI client with retry, backoff and cache-header parsing
pub struct EsiHttpClient {
    http: ReqwestClient,
    base_url: String,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancellationToken,
}

impl EsiHttpClient {
    /// Create a client that sleeps on the tokio timer.
    ///
    /// # Errors
    /// Returns `EsiError::Config` if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: EsiClientConfig, cancel: CancellationToken) -> EsiResult<Self> {
        Self::with_sleeper(config, cancel, Arc::new(TokioSleeper))
    }

    /// Create a client with a custom [`Sleeper`].
    ///
    /// # Errors
    /// Returns `EsiError::Config` if the underlying HTTP client cannot be
    /// built.
    pub fn with_sleeper(
        config: EsiClientConfig,
        cancel: CancellationToken,
        sleeper: Arc<dyn Sleeper>,
    ) -> EsiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, reqwest::header::HeaderValue::from_static("application/json"));

        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .default_headers(headers)
            .no_proxy()
            .build()
            .map_err(|e| EsiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sleeper,
            cancel,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `url`, retrying transient failures, and return the body with its
    /// cache expiry.
    ///
    /// The bearer token is sent only when `access_token` is non-empty.
    ///
    /// # Errors
    /// `Status` for permanent HTTP failures, `RetriesExhausted` once the retry
    /// budget is spent, `Cancelled` if the client's token fires first.
    pub async fn fetch(
        &self,
        url: &str,
        access_token: Option<&str>,
    ) -> EsiResult<(String, DateTime<Utc>)> {
        let token = access_token.filter(|t| !t.is_empty());
        let mut retries = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(EsiError::Cancelled);
            }

            let (delay, reason) = match self.attempt(url, token, retries).await {
                Attempt::Done(body, cache_until) => return Ok((body, cache_until)),
                Attempt::Fail(err) => return Err(err),
                Attempt::Retry { delay, reason } => (delay, reason),
            };

            if retries >= MAX_RETRIES {
                return Err(EsiError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: retries + 1,
                    last_error: reason,
                });
            }
            retries += 1;

            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            warn!(url, retry = retries, delay_ms, %reason, "Retrying ESI request");
            tokio::select! {
                () = self.cancel.cancelled() => return Err(EsiError::Cancelled),
                () = self.sleeper.sleep(delay) => {}
            }
        }
    }

    /// Fetch and decode a JSON payload
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: Option<&str>,
    ) -> EsiResult<(T, DateTime<Utc>)> {
        let (body, cache_until) = self.fetch(url, access_token).await?;
        let value = serde_json::from_str(&body)
            .map_err(|source| EsiError::Decode { url: url.to_string(), source })?;
        Ok((value, cache_until))
    }

    async fn attempt(&self, url: &str, token: Option<&str>, retries: u32) -> Attempt {
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        debug!(url, attempt = retries + 1, "Sending ESI request");
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_builder() => {
                return Attempt::Fail(EsiError::Request { url: url.to_string(), source: err });
            }
            Err(err) => {
                return Attempt::Retry { delay: backoff_delay(retries), reason: err.to_string() };
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let delay = parse_retry_after(header_str(response.headers(), RETRY_AFTER));
            return Attempt::Retry { delay, reason: status.to_string() };
        }
        if status.is_server_error() {
            return Attempt::Retry { delay: backoff_delay(retries), reason: status.to_string() };
        }

        let cache_until = parse_expires(header_str(response.headers(), EXPIRES));
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return Attempt::Retry { delay: backoff_delay(retries), reason: err.to_string() };
            }
        };

        if status.is_success() {
            Attempt::Done(body, cache_until)
        } else {
            Attempt::Fail(EsiError::Status { status: status.as_u16(), url: url.to_string(), body })
        }
    }
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// 1s, 2s, 4s for the first, second and third retry
fn backoff_delay(retries_so_far: u32) -> Duration {
    BASE_BACKOFF.saturating_mul(1 << retries_so_far.min(8))
}

/// Parse an HTTP-date `Expires` header; missing or malformed means "now".
///
/// Accepts the IMF-fixdate, RFC 850 and asctime forms. The weekday name is
/// not checked against the date.
pub fn parse_expires(value: Option<&str>) -> DateTime<Utc> {
    value.and_then(parse_http_date).unwrap_or_else(Utc::now)
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let parsed = match value.split_once(',') {
        // "Sun, 22 Feb 2026 12:00:00 GMT" or "Sunday, 22-Feb-26 12:00:00 GMT"
        Some((_, rest)) => {
            let rest = rest.trim();
            NaiveDateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S GMT")
                .or_else(|_| NaiveDateTime::parse_from_str(rest, "%d-%b-%y %H:%M:%S GMT"))
                .ok()?
        }
        // "Sun Feb 22 12:00:00 2026"; single-digit days are space padded
        None => {
            let rest: Vec<&str> = value.split_whitespace().skip(1).collect();
            NaiveDateTime::parse_from_str(&rest.join(" "), "%b %d %H:%M:%S %Y").ok()?
        }
    };
    Some(parsed.and_utc())
}

/// Parse a `Retry-After` delay in seconds
pub fn parse_retry_after(value: Option<&str>) -> Duration {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(secs) if secs >= 0 => Duration::from_secs(secs.unsigned_abs()).min(MAX_RETRY_AFTER),
        _ => DEFAULT_RETRY_AFTER,
    }
}

#[async_trait]
impl EsiClient for EsiHttpClient {
    async fn blueprints(
        &self,
        owner: Owner,
        access_token: &str,
    ) -> DomainResult<Fetched<Vec<Blueprint>>> {
        let fetched = match owner {
            Owner::Character(id) => self.character_blueprints(id, access_token).await?,
            Owner::Corporation(id) => self.corporation_blueprints(id, access_token).await?,
        };
        Ok(fetched)
    }

    async fn jobs(&self, owner: Owner, access_token: &str) -> DomainResult<Fetched<Vec<Job>>> {
        let fetched = match owner {
            Owner::Character(id) => self.character_jobs(id, access_token).await?,
            Owner::Corporation(id) => self.corporation_jobs(id, access_token).await?,
        };
        Ok(fetched)
    }

    async fn universe_type(&self, type_id: i64) -> DomainResult<UniverseType> {
        Ok(self.resolve_universe_type(type_id).await?)
    }
}
