// src/columns/backend.rs
// Persistence for the column visibility mapping

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchError};

/// Stored form: canonical column name -> visible
pub type VisibilityMap = BTreeMap<String, bool>;

/// Where visibility preferences live. Format and location are up to the
/// implementation; the store only needs load/save of the whole mapping.
pub trait VisibilityBackend: Send + Sync {
    /// Saved mapping, or an empty one if nothing was saved yet
    fn load(&self) -> Result<VisibilityMap>;
    fn save(&self, map: &VisibilityMap) -> Result<()>;
}

/// JSON object on disk, written atomically via a sibling temp file
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VisibilityBackend for JsonFileBackend {
    fn load(&self) -> Result<VisibilityMap> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(VisibilityMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no saved column visibility");
                Ok(VisibilityMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, map: &VisibilityMap) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            WatchError::Store(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %self.path.display(), entries = map.len(), "saved column visibility");
        Ok(())
    }
}

/// Keeps the mapping in memory only
#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved: Mutex<VisibilityMap>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(map: VisibilityMap) -> Self {
        Self {
            saved: Mutex::new(map),
        }
    }

    /// What the last save wrote
    pub fn saved(&self) -> VisibilityMap {
        self.saved.lock().clone()
    }
}

impl VisibilityBackend for MemoryBackend {
    fn load(&self) -> Result<VisibilityMap> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, map: &VisibilityMap) -> Result<()> {
        *self.saved.lock() = map.clone();
        Ok(())
    }
}
