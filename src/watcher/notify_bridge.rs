// src/watcher/notify_bridge.rs
// OS change notifications as early wake-ups for the poll loop
//
// Notifications only wake the loop early; the fixed-interval poll keeps
// running whether or not they arrive.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use tokio::sync::mpsc;

/// Watch the directory holding `path` and send a wake-up whenever an event
/// names the file. Returns `None` (polling only) if the platform watcher
/// cannot be set up.
pub(crate) fn watch_file(path: &Path) -> Option<(RecommendedWatcher, mpsc::Receiver<()>)> {
    let target: OsString = path.file_name()?.to_os_string();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    // Capacity 1: pending wake-ups coalesce into a single poll
    let (tx, rx) = mpsc::channel::<()>(1);

    let mut watcher = match RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if is_relevant(&event, &target) {
                    // Full channel means a wake-up is already pending
                    let _ = tx.try_send(());
                }
            }
            Err(e) => {
                tracing::warn!("file notification error: {}", e);
            }
        },
        Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "change notifications unavailable, polling only");
            return None;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        tracing::warn!(
            dir = %dir.display(),
            error = %e,
            "failed to watch directory, polling only"
        );
        return None;
    }

    tracing::debug!(dir = %dir.display(), "change notifications enabled");
    Some((watcher, rx))
}

fn is_relevant(event: &Event, target: &OsString) -> bool {
    let kind_matters = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    );
    kind_matters
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|name| name == target.as_os_str()))
}
