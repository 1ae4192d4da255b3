// src/watcher/handle.rs
// Caller-owned handle for one watch session

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::WatchEvent;
use super::stats::{StatsSnapshot, WatchStats};
use crate::csv::Schema;

/// A running (or finished) watch session.
///
/// The handle is the single consumer of the session's events. Dropping it
/// cancels the session without waiting for the task.
pub struct WatchHandle {
    pub(crate) id: u64,
    pub(crate) path: PathBuf,
    pub(crate) token: CancellationToken,
    pub(crate) task: Option<JoinHandle<()>>,
    pub(crate) events: mpsc::Receiver<WatchEvent>,
    pub(crate) schema: Arc<RwLock<Arc<Schema>>>,
    pub(crate) stats: Arc<WatchStats>,
    pub(crate) join_timeout: Duration,
}

impl WatchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Session id, unique per coordinator
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current schema; replaced when a rotation brings a new header
    pub fn schema(&self) -> Arc<Schema> {
        self.schema.read().clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// False once stopped, or after the session ended on its own
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Next event. `None` once the session is over and its queue drained,
    /// and always `None` after `stop`.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }

    /// Next event if one is queued, without waiting
    pub fn try_recv(&mut self) -> Option<WatchEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Stop the session.
    ///
    /// Signals the poll loop, waits up to the join timeout (aborting the task
    /// past it), then closes and drains the event queue so no event is
    /// observed after this returns. Safe to call repeatedly and after the
    /// file was deleted.
    pub async fn stop(&mut self) {
        self.token.cancel();

        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            match tokio::time::timeout(self.join_timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => {
                    tracing::error!(file = %self.path.display(), "poll task panicked: {}", e);
                }
                Err(_) => {
                    tracing::warn!(
                        file = %self.path.display(),
                        timeout_ms = self.join_timeout.as_millis() as u64,
                        "poll task did not exit in time, aborting"
                    );
                    abort.abort();
                }
            }
            tracing::info!(file = %self.path.display(), "stopped watching");
        }

        self.events.close();
        while self.events.try_recv().is_ok() {}
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}
