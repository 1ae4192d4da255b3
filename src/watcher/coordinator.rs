// src/watcher/coordinator.rs
// Session lifecycle: Idle -> Watching -> Stopped (-> Watching on a new start)

use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::handle::WatchHandle;
use super::notify_bridge;
use super::session::Session;
use super::stats::WatchStats;
use crate::config::{StartPosition, WatchConfig};
use crate::csv::{Schema, parse_header};
use crate::error::{Result, WatchError};
use crate::tail::{TailState, read_header_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No session was ever started
    Idle,
    Watching,
    /// The last session was stopped or ended on a fatal error
    Stopped,
}

struct ActiveSession {
    id: u64,
    path: PathBuf,
    token: CancellationToken,
}

/// Starts and stops watch sessions, one at a time.
///
/// `start` while a session is running fails with `AlreadyWatching`; switch
/// files by stopping first.
pub struct Coordinator {
    config: WatchConfig,
    session: Mutex<Option<ActiveSession>>,
    next_id: AtomicU64,
}

impl Coordinator {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        match &*self.session.lock() {
            None => CoordinatorState::Idle,
            Some(active) if active.token.is_cancelled() => CoordinatorState::Stopped,
            Some(_) => CoordinatorState::Watching,
        }
    }

    /// Path of the running session, if any
    pub fn watching(&self) -> Option<PathBuf> {
        self.session
            .lock()
            .as_ref()
            .filter(|active| !active.token.is_cancelled())
            .map(|active| active.path.clone())
    }

    /// Read the header of `path` and start tailing it in the background.
    ///
    /// Fails with `Format` for an empty file, `FileGone` for a missing one,
    /// and `AlreadyWatching` if a session is still running.
    pub async fn start(&self, path: impl AsRef<Path>) -> Result<WatchHandle> {
        let path = path.as_ref().to_path_buf();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        // Claim the slot before any I/O so two concurrent starts cannot both win
        let previous = {
            let mut session = self.session.lock();
            if let Some(active) = session.as_ref()
                && !active.token.is_cancelled()
            {
                return Err(WatchError::AlreadyWatching(active.path.clone()));
            }
            session.replace(ActiveSession {
                id,
                path: path.clone(),
                token: token.clone(),
            })
        };

        match self.launch(id, path.clone(), token.clone()).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to start watching");
                token.cancel();
                let mut session = self.session.lock();
                if session.as_ref().is_some_and(|active| active.id == id) {
                    *session = previous;
                }
                Err(e)
            }
        }
    }

    /// Stop a session started by this coordinator. Idempotent.
    pub async fn stop(&self, handle: &mut WatchHandle) {
        handle.stop().await;
    }

    async fn launch(&self, id: u64, path: PathBuf, token: CancellationToken) -> Result<WatchHandle> {
        let start_position = self.config.start_position;
        let (schema, state) = tokio::task::spawn_blocking({
            let path = path.clone();
            move || prepare(&path, start_position)
        })
        .await??;

        let (events_tx, events_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let stats = Arc::new(WatchStats::default());
        let shared_schema = Arc::new(RwLock::new(Arc::clone(&schema)));

        let (notifier, wake) = if self.config.notify {
            match notify_bridge::watch_file(&path) {
                Some((watcher, rx)) => (Some(watcher), Some(rx)),
                None => (None, None),
            }
        } else {
            (None, None)
        };

        let session = Session {
            state: Some(state),
            schema: Arc::clone(&schema),
            shared_schema: Arc::clone(&shared_schema),
            events: events_tx,
            token: token.clone(),
            stats: Arc::clone(&stats),
            poll_interval: self.config.poll_interval(),
            wake,
            notifier,
            awaiting_header: false,
        };
        let task = tokio::spawn(session.run());

        tracing::info!(
            file = %path.display(),
            columns = schema.len(),
            start = ?start_position,
            "started watching"
        );

        Ok(WatchHandle {
            id,
            path,
            token,
            task: Some(task),
            events: events_rx,
            schema: shared_schema,
            stats,
            join_timeout: self.config.join_timeout(),
        })
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(WatchConfig::default())
    }
}

/// Header -> schema, plus the initial tail position
fn prepare(path: &Path, start_position: StartPosition) -> Result<(Arc<Schema>, TailState)> {
    let header = read_header_line(path)?;
    let schema = Arc::new(parse_header(&header.text)?);
    let state = match start_position {
        StartPosition::Header => TailState::after_header(path, &header),
        StartPosition::LatestRow => TailState::at_latest_row(path, &header)?,
    };
    Ok((schema, state))
}
