//! Sync scheduler driving periodic and on-demand ESI refresh cycles.
//!
//! One background task owns every cycle. It runs a cycle as soon as it
//! starts, then on each interval tick, and a forced cycle whenever a
//! [`RefreshHandle`] is triggered. Triggers coalesce: at most one forced
//! cycle is ever pending.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use auspex_core::SyncService;
//! use auspex_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(service: Arc<SyncService>) -> Result<(), Box<dyn std::error::Error>> {
//! let root = CancellationToken::new();
//! let mut scheduler = SyncScheduler::new(service, SyncSchedulerConfig::default(), root.clone());
//!
//! scheduler.start().await?;
//! scheduler.refresh_handle().trigger();
//! // ... application runs ...
//! root.cancel();
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use auspex_core::{CycleReport, SyncService};
use auspex_domain::SyncConfig;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Time between scheduled cycles
    pub interval: Duration,
    /// How long `stop` waits for the running cycle to wind down
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(600), join_timeout: Duration::from_secs(5) }
    }
}

impl From<&SyncConfig> for SyncSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self { interval: config.refresh_interval(), ..Self::default() }
    }
}

/// Cloneable, non-blocking trigger for a forced cycle
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    notify: Arc<Notify>,
}

impl RefreshHandle {
    /// Request a forced cycle. Repeated triggers before the loop picks the
    /// request up collapse into one.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }
}

/// Periodic sync scheduler
pub struct SyncScheduler {
    service: Arc<SyncService>,
    config: SyncSchedulerConfig,
    parent: CancellationToken,
    cancellation: CancellationToken,
    force: Arc<Notify>,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    /// `parent` cancels the loop from outside (e.g. on shutdown); `stop`
    /// only cancels this scheduler's own child token.
    pub fn new(
        service: Arc<SyncService>,
        config: SyncSchedulerConfig,
        parent: CancellationToken,
    ) -> Self {
        let cancellation = parent.child_token();
        Self {
            service,
            config,
            parent,
            cancellation,
            force: Arc::new(Notify::new()),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Cloneable handle for requesting an early cycle
    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle { notify: Arc::clone(&self.force) }
    }

    /// Shorthand for `refresh_handle().trigger()`
    pub fn force_refresh(&self) {
        self.force.notify_one();
    }

    /// Start the scheduler
    ///
    /// Spawns the background loop, which runs its first cycle immediately.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting sync scheduler");

        // Fresh child token so the scheduler can be restarted after stop
        self.cancellation = self.parent.child_token();

        let service = Arc::clone(&self.service);
        let force = Arc::clone(&self.force);
        let interval = self.config.interval;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::sync_loop(service, force, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler was never started (or already stopped), or
    /// if the task does not finish within the join timeout.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.lock().await.take() else {
            return Err(SchedulerError::NotRunning);
        };

        info!("Stopping sync scheduler");
        self.cancellation.cancel();

        let join_timeout = self.config.join_timeout;
        tokio::time::timeout(join_timeout, handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
            .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle that
    /// hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn sync_loop(
        service: Arc<SyncService>,
        force: Arc<Notify>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        log_report(false, service.run_cycle(false, &cancel).await);

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Sync loop cancelled");
                    break;
                }
                () = force.notified() => {
                    log_report(true, service.run_cycle(true, &cancel).await);
                }
                _ = ticker.tick() => {
                    log_report(false, service.run_cycle(false, &cancel).await);
                }
            }
        }
    }
}

fn log_report(forced: bool, report: CycleReport) {
    if report.failed > 0 {
        warn!(
            forced,
            synced = report.synced,
            skipped = report.skipped,
            failed = report.failed,
            "Sync cycle finished with failures"
        );
    } else {
        info!(
            forced,
            synced = report.synced,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Sync cycle finished"
        );
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
