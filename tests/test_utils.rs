//! Test utilities for logwatch integration tests

#![allow(dead_code)]

use logwatch::config::WatchConfig;
use logwatch::watcher::{WatchEvent, WatchHandle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Upper bound for any single event to show up
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A datalog inside its own temp dir
pub struct TestLog {
    _dir: TempDir,
    path: PathBuf,
}

impl TestLog {
    pub fn with_contents(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("datalog.csv");
        std::fs::write(&path, contents).expect("Failed to write datalog");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, text: &str) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .expect("Failed to open datalog for append");
        file.write_all(text.as_bytes())
            .expect("Failed to append to datalog");
        file.flush().expect("Failed to flush datalog");
    }

    /// Replace the file with a new one under the same name
    pub fn replace(&self, contents: &str) {
        let tmp = self.path.with_extension("csv.new");
        std::fs::write(&tmp, contents).expect("Failed to write replacement");
        std::fs::rename(&tmp, &self.path).expect("Failed to rename replacement");
    }
}

/// Fast polling, no OS notifications, so timing only depends on the interval
pub fn test_config() -> WatchConfig {
    WatchConfig {
        poll_interval_ms: 20,
        notify: false,
        ..WatchConfig::default()
    }
}

/// Next event, failing the test if nothing arrives in time
pub async fn next_event(handle: &mut WatchHandle) -> WatchEvent {
    tokio::time::timeout(EVENT_TIMEOUT, handle.recv())
        .await
        .expect("Timed out waiting for event")
        .expect("Event channel closed")
}

/// Next event, which must be a row; returns its values
pub async fn next_row(handle: &mut WatchHandle) -> Vec<String> {
    match next_event(handle).await {
        WatchEvent::Row(row) => row.into_values(),
        other => panic!("Expected row, got {:?}", other),
    }
}

/// Let a few poll intervals pass
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}
