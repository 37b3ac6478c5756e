//! Delayed deletion of downloaded files
//!
//! Every published file gets a timer. When it fires the file is removed from
//! disk; the ticket record is left alone, so a ticket may outlive its file.

use crate::config::ExpirationShutdown;
use crate::types::Event;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// How one expiration ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpirationOutcome {
    /// The file was removed
    Deleted,
    /// The file was already gone when the timer fired
    AlreadyGone,
    /// The timer was cancelled; the file was left on disk
    Cancelled,
    /// Removal failed (e.g. permission denied)
    Failed(String),
}

/// Schedules file deletions on detached, tracked tasks
///
/// Cloning is cheap and clones share the same set of pending timers.
#[derive(Debug, Clone)]
pub struct ExpirationScheduler {
    tracker: TaskTracker,
    cancel: CancellationToken,
    expire_now: CancellationToken,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl ExpirationScheduler {
    /// Create a scheduler that does not report events
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            expire_now: CancellationToken::new(),
            event_tx: None,
        }
    }

    /// Create a scheduler that emits [`Event::Expired`] for every deleted file
    pub fn with_events(event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            event_tx: Some(event_tx),
            ..Self::new()
        }
    }

    /// Delete `path` once `delay` has elapsed
    ///
    /// The returned handle may be dropped; the task keeps running and is still
    /// drained by [`shutdown`](Self::shutdown). Failures are logged and reported
    /// only through the handle.
    pub fn schedule(&self, path: PathBuf, delay: Duration) -> JoinHandle<ExpirationOutcome> {
        let cancel = self.cancel.clone();
        let expire_now = self.expire_now.clone();
        let event_tx = self.event_tx.clone();

        tracing::debug!(path = %path.display(), delay_secs = delay.as_secs(), "Expiration scheduled");

        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(path = %path.display(), "Expiration cancelled");
                    return ExpirationOutcome::Cancelled;
                }
                _ = expire_now.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }

            let outcome = remove(&path).await;
            if outcome == ExpirationOutcome::Deleted
                && let Some(tx) = event_tx
            {
                tx.send(Event::Expired { path }).ok();
            }
            outcome
        })
    }

    /// Number of expirations not yet finished
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Settle every pending expiration and wait for the tasks to finish
    ///
    /// With [`ExpirationShutdown::ExpireNow`] pending files are deleted right
    /// away; with [`ExpirationShutdown::Cancel`] they stay on disk. Timers
    /// scheduled after shutdown settle immediately the same way.
    pub async fn shutdown(&self, mode: ExpirationShutdown) {
        let pending = self.pending();
        tracing::info!(pending, ?mode, "Shutting down expiration scheduler");

        match mode {
            ExpirationShutdown::ExpireNow => self.expire_now.cancel(),
            ExpirationShutdown::Cancel => self.cancel.cancel(),
        }
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Default for ExpirationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove `path` now; a missing file is not an error
pub(crate) async fn remove(path: &Path) -> ExpirationOutcome {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Expired file deleted");
            ExpirationOutcome::Deleted
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Expired file already gone");
            ExpirationOutcome::AlreadyGone
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete expired file");
            ExpirationOutcome::Failed(e.to_string())
        }
    }
}
