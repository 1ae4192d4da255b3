// src/watcher/mod.rs
// Watch coordinator: start/stop lifecycle and event delivery
//
// One coordinator runs at most one session. Each session owns a tokio task
// that polls the tail reader on a fixed interval (woken early by OS change
// notifications when available) and sends events over a bounded channel to
// the single consumer holding the `WatchHandle`.

mod coordinator;
mod handle;
mod notify_bridge;
mod session;
mod stats;

pub use coordinator::{Coordinator, CoordinatorState};
pub use handle::WatchHandle;
pub use stats::{StatsSnapshot, WatchStats};

use std::sync::Arc;

use crate::csv::{Row, Schema};
use crate::error::{MalformedRowError, WatchError};

/// What a watch session delivers to its consumer
#[derive(Debug)]
pub enum WatchEvent {
    /// A data line parsed against the current schema
    Row(Row),
    /// A data line with the wrong field count; skipped, session continues
    MalformedRow(MalformedRowError),
    /// The file was truncated or replaced and a new header was read.
    /// Always precedes rows parsed with the new schema.
    Rotation(Arc<Schema>),
    /// The session ended (file gone, unreadable header after rotation).
    /// Nothing follows this event.
    Fatal(WatchError),
}

impl WatchEvent {
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchEvent::Fatal(_))
    }
}
