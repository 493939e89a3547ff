//! Periodic background sweeping of expired entries.

use crate::error::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

const MIN_INTERVAL: Duration = Duration::from_millis(1);
// Roughly 30 years, the same horizon tokio uses for a far-future sleep.
const MAX_INTERVAL: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A store that can drop its expired entries in bulk.
#[async_trait]
pub trait ExpiredEntryCleanup: Send + Sync {
    /// Short name used in log output.
    fn store_name(&self) -> &'static str;

    /// Removes every entry whose expiry is at or before now and returns how many were
    /// removed.
    async fn cleanup(&self) -> StoreResult<usize>;
}

/// Handle to a running cleanup task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct CleanupHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CleanupHandle {
    /// Stops future sweeps. Safe to call any number of times.
    ///
    /// A sweep already running when this is called is allowed to finish; use
    /// [`CleanupHandle::shutdown`] to wait for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the task has exited, whether cancelled or not.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels the task and waits until it has exited.
    pub async fn shutdown(mut self) {
        self.token.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Cleanup task terminated abnormally");
            }
        }
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawns a task that calls `target.cleanup()` every `interval` until cancelled.
///
/// The first sweep happens one full interval after start. Ticks missed while a sweep runs
/// long are skipped rather than replayed. Sweep failures are logged and the task keeps
/// going, since lookups already ignore expired entries.
///
/// Must be called from within a tokio runtime.
pub fn start_cleanup<C>(target: Arc<C>, interval: Duration) -> CleanupHandle
where
    C: ExpiredEntryCleanup + ?Sized + 'static,
{
    let interval = if interval < MIN_INTERVAL {
        warn!(
            store = target.store_name(),
            ?interval,
            "Cleanup interval too small, using {:?}",
            MIN_INTERVAL
        );
        MIN_INTERVAL
    } else if interval > MAX_INTERVAL {
        warn!(
            store = target.store_name(),
            ?interval,
            "Cleanup interval too large, using {:?}",
            MAX_INTERVAL
        );
        MAX_INTERVAL
    } else {
        interval
    };

    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(store = target.store_name(), ?interval, "Cleanup scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = timer.tick() => {}
            }

            if cancelled.is_cancelled() {
                break;
            }

            run_cleanup(target.as_ref()).await;
        }

        debug!(store = target.store_name(), "Cleanup scheduler stopped");
    });

    CleanupHandle {
        token,
        task: Some(task),
    }
}

async fn run_cleanup<C>(target: &C)
where
    C: ExpiredEntryCleanup + ?Sized,
{
    match target.cleanup().await {
        Ok(0) => trace!(store = target.store_name(), "No expired entries"),
        Ok(count) => debug!(
            store = target.store_name(),
            removed = count,
            "Expired entries cleaned"
        ),
        Err(e) => error!(
            store = target.store_name(),
            error = %e,
            "Failed to clean up expired entries"
        ),
    }
}
