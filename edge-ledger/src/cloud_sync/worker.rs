//! SyncWorker: background trigger for the sync pass
//!
//! The Sync Engine never schedules or retries; this worker does:
//! - on a fixed interval, sync when there are pending records and the
//!   remote store answers a ping
//! - on demand (via [`SyncTrigger`]), sync unconditionally
//! - retry a failed pass with exponential backoff

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::engine::{SyncEngine, SyncReport};
use crate::session::Session;
use crate::utils::{AppError, AppResult};

/// Max attempts per pass
const MAX_RETRIES: u32 = 3;
/// Initial retry delay
const INITIAL_RETRY_DELAY_SECS: u64 = 5;
/// Backoff ceiling
const MAX_RETRY_DELAY_SECS: u64 = 60;

/// Handle to request an immediate sync
#[derive(Clone, Default)]
pub struct SyncTrigger(Arc<Notify>);

impl SyncTrigger {
    pub fn sync_now(&self) {
        self.0.notify_one();
    }
}

pub struct SyncWorker {
    engine: SyncEngine,
    session: Session,
    interval: Duration,
    retry_delay: Duration,
    trigger: SyncTrigger,
    shutdown: CancellationToken,
}

impl SyncWorker {
    pub fn new(
        engine: SyncEngine,
        session: Session,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            session,
            interval,
            retry_delay: Duration::from_secs(INITIAL_RETRY_DELAY_SECS),
            trigger: SyncTrigger::default(),
            shutdown,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn trigger(&self) -> SyncTrigger {
        self.trigger.clone()
    }

    /// Run until the shutdown token is cancelled
    pub async fn run(self) {
        tracing::info!(
            owner_id = %self.session.owner_id(),
            interval_secs = self.interval.as_secs(),
            "SyncWorker started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let force = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("SyncWorker shutting down");
                    break;
                }
                _ = interval.tick() => false,
                _ = self.trigger.0.notified() => true,
            };

            if let Err(e) = self.run_once(force).await {
                tracing::error!(error = %e, "Sync pass failed after retries");
            }
        }

        tracing::info!("SyncWorker stopped");
    }

    /// One trigger check
    ///
    /// Returns `Ok(None)` when the pass was skipped (nothing pending or the
    /// remote store is unreachable) unless `force` is set.
    pub async fn run_once(&self, force: bool) -> AppResult<Option<SyncReport>> {
        if !force {
            let pending = self.session.store().pending_count().await?;
            if pending == 0 {
                tracing::debug!("Nothing pending, skipping sync");
                return Ok(None);
            }
            if !self.engine.remote().ping().await {
                tracing::debug!(pending, "Remote store unreachable, skipping sync");
                return Ok(None);
            }
        }
        self.sync_with_retry().await.map(Some)
    }

    /// Run the pass with exponential backoff retry
    async fn sync_with_retry(&self) -> AppResult<SyncReport> {
        let mut delay = self.retry_delay;

        for attempt in 0..MAX_RETRIES {
            let result = match self.engine.sync(&self.session).await {
                Ok(report) => report.into_result(),
                Err(e) => Err(e),
            };
            match result {
                Ok(report) => return Ok(report),
                Err(e) if attempt + 1 < MAX_RETRIES => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        delay_ms = delay.as_millis() as u64,
                        "Sync attempt failed, retrying: {e}"
                    );
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return Err(e),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    delay = (delay * 2).min(Duration::from_secs(MAX_RETRY_DELAY_SECS));
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::sync_failed("Sync retries exhausted"))
    }
}
