// src/watcher/session.rs
// Background poll loop for one watch session

use notify::RecommendedWatcher;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::WatchEvent;
use super::stats::WatchStats;
use crate::csv::{Schema, parse_header, parse_row};
use crate::tail::{PollOutcome, TailError, TailState};

enum Flow {
    Continue,
    Stop,
}

/// Everything the poll task owns. Nothing here is touched from outside
/// except through `shared_schema` and `stats`.
pub(crate) struct Session {
    pub(crate) state: Option<TailState>,
    pub(crate) schema: Arc<Schema>,
    pub(crate) shared_schema: Arc<RwLock<Arc<Schema>>>,
    pub(crate) events: mpsc::Sender<WatchEvent>,
    pub(crate) token: CancellationToken,
    pub(crate) stats: Arc<WatchStats>,
    pub(crate) poll_interval: Duration,
    pub(crate) wake: Option<mpsc::Receiver<()>>,
    /// Held so the OS watch lives exactly as long as the session
    pub(crate) notifier: Option<RecommendedWatcher>,
    /// Set after a rotation until the new header line arrives
    pub(crate) awaiting_header: bool,
}

impl Session {
    pub(crate) async fn run(mut self) {
        let path = self
            .state
            .as_ref()
            .map(|s| s.path().display().to_string())
            .unwrap_or_default();
        tracing::debug!(file = %path, notify = self.notifier.is_some(), "poll loop started");

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
                Some(()) = recv_wake(&mut self.wake) => {}
            }

            if let Flow::Stop = self.poll_once().await {
                break;
            }
        }

        // Ends the session for the coordinator as well
        self.token.cancel();
        tracing::debug!(file = %path, "poll loop exited");
    }

    async fn poll_once(&mut self) -> Flow {
        let Some(mut state) = self.state.take() else {
            return Flow::Stop;
        };
        self.stats.record_poll();

        let blocking = tokio::task::spawn_blocking(move || {
            let result = state.poll();
            (state, result)
        });

        // A slow read must not hold up stop(); the result is simply dropped
        let joined = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Flow::Stop,
            joined = blocking => joined,
        };

        let (state, result) = match joined {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("tail poll task failed: {}", e);
                self.deliver(WatchEvent::Fatal(e.into())).await;
                return Flow::Stop;
            }
        };
        let path = state.path().to_path_buf();
        self.state = Some(state);

        match result {
            Ok(outcome) => self.handle_outcome(outcome).await,
            Err(TailError::Transient(e)) => {
                self.stats.record_transient();
                tracing::warn!(file = %path.display(), error = %e, "tail read failed, retrying next poll");
                Flow::Continue
            }
            Err(err @ TailError::Gone) => {
                tracing::warn!(file = %path.display(), "watched file disappeared, stopping");
                self.deliver(WatchEvent::Fatal(err.into_watch_error(&path)))
                    .await;
                Flow::Stop
            }
        }
    }

    async fn handle_outcome(&mut self, outcome: PollOutcome) -> Flow {
        if outcome.rotated {
            self.stats.record_rotation();
            self.awaiting_header = true;
        }

        for line in outcome.lines {
            if self.awaiting_header {
                match parse_header(&line) {
                    Ok(schema) => {
                        let schema = Arc::new(schema);
                        tracing::info!(columns = schema.len(), "new header after rotation");
                        self.schema = Arc::clone(&schema);
                        *self.shared_schema.write() = Arc::clone(&schema);
                        self.awaiting_header = false;
                        if !self.deliver(WatchEvent::Rotation(schema)).await {
                            return Flow::Stop;
                        }
                    }
                    Err(e) => {
                        self.deliver(WatchEvent::Fatal(e)).await;
                        return Flow::Stop;
                    }
                }
                continue;
            }

            let event = match parse_row(&line, &self.schema) {
                Ok(row) => {
                    self.stats.record_row();
                    WatchEvent::Row(row)
                }
                Err(err) => {
                    self.stats.record_malformed();
                    tracing::debug!(
                        expected = err.expected,
                        actual = err.actual,
                        "skipping malformed row"
                    );
                    WatchEvent::MalformedRow(err)
                }
            };
            if !self.deliver(event).await {
                return Flow::Stop;
            }
        }

        Flow::Continue
    }

    /// Send to the consumer unless the session is being stopped.
    /// Returns false when the loop should exit.
    async fn deliver(&self, event: WatchEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }
}

async fn recv_wake(wake: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match wake {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
