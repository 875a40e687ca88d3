//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use auspex_core::{EsiClient, SubjectService, SyncRepositories, SyncService};
use auspex_domain::{AuspexError, Config, Result};
use auspex_infra::{
    AuthSettings, DbManager, EsiClientConfig, EsiHttpClient, EsiOAuthProvider, RefreshHandle,
    SchedulerError, SqliteStore, SsoClient, SyncScheduler, SyncSchedulerConfig,
    TokenInjectingClient,
};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Handles shared by every route
#[derive(Clone)]
pub struct AppState {
    pub subjects: Arc<SubjectService>,
    pub oauth: Arc<EsiOAuthProvider>,
    pub refresh: RefreshHandle,
    pub db: Arc<DbManager>,
}

/// Application context - owns the running services
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub state: AppState,
    scheduler: SyncScheduler,
    shutdown: CancellationToken,
}

async fn start_scheduler(scheduler: &mut SyncScheduler) -> Result<()> {
    let start_timeout = Duration::from_secs(10);
    tokio::time::timeout(start_timeout, scheduler.start())
        .await
        .map_err(|_| {
            error!(timeout_secs = 10, "SyncScheduler start timed out");
            AuspexError::Internal("SyncScheduler start timed out after 10s".into())
        })?
        .map_err(|err| {
            error!(error = %err, "failed to start SyncScheduler");
            AuspexError::Internal(format!("failed to start SyncScheduler: {err}"))
        })
}

impl AppContext {
    /// Open the database, build every client and service, and start the
    /// sync scheduler.
    ///
    /// # Errors
    /// Fails when the configuration is invalid, the database cannot be opened
    /// or migrated, an HTTP client cannot be built, or the scheduler does not
    /// start.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        info!(path = %db.path().display(), "Database ready");

        let store = Arc::new(SqliteStore::new(Arc::clone(&db)));
        let shutdown = CancellationToken::new();

        let esi = EsiHttpClient::new(EsiClientConfig::from(&config.esi), shutdown.clone())?;
        let sso = Arc::new(SsoClient::new(AuthSettings::from_config(&config.esi)?)?);
        let authed: Arc<dyn EsiClient> = Arc::new(TokenInjectingClient::new(
            Arc::new(esi),
            Arc::clone(&sso),
            store.clone(),
            store.clone(),
        ));

        let service =
            Arc::new(SyncService::new(authed, SyncRepositories::from_store(Arc::clone(&store))));
        let mut scheduler = SyncScheduler::new(
            service,
            SyncSchedulerConfig::from(&config.sync),
            shutdown.clone(),
        );
        start_scheduler(&mut scheduler).await?;

        let state = AppState {
            subjects: Arc::new(SubjectService::new(store.clone(), store.clone())),
            oauth: Arc::new(EsiOAuthProvider::new(sso, store)),
            refresh: scheduler.refresh_handle(),
            db: Arc::clone(&db),
        };

        Ok(Self { config, db, state, scheduler, shutdown })
    }

    /// Router over the shared state
    pub fn router(&self) -> Router {
        crate::routes::router(self.state.clone())
    }

    /// Root token; cancelling it aborts in-flight retries and ends the
    /// scheduler loop.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Whether the sync loop task is alive
    pub fn is_scheduler_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Cancel the root token, then wait for the scheduler task to finish.
    ///
    /// # Errors
    /// Returns an error if the scheduler task does not finish in time.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down");
        self.shutdown.cancel();

        match self.scheduler.stop().await {
            Ok(()) | Err(SchedulerError::NotRunning) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
