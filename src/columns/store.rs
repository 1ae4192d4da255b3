// src/columns/store.rs
// Per-column show/hide preferences, keyed by column name

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use super::backend::{MemoryBackend, VisibilityBackend, VisibilityMap};
use crate::csv::header::split_token;
use crate::csv::{ColumnDescriptor, Row, Schema};
use crate::error::Result;

/// Store key for a column typed the way it appears in a header: the token
/// is split exactly as `parse_header` splits it, so "Boost (psi)" and
/// "Boost" share one preference.
pub fn canonical_name(label: &str) -> String {
    split_token(label).0
}

/// Store key for a parsed column. The name is already unit-free and is
/// used as is.
fn column_key(column: &ColumnDescriptor) -> &str {
    column.name.trim()
}

/// Key -> visible. Keys that were never toggled are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnVisibilitySet {
    entries: VisibilityMap,
}

impl ColumnVisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: VisibilityMap) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, visible)| (key.trim().to_string(), visible))
            .collect();
        Self { entries }
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.entries.get(key.trim()).copied().unwrap_or(true)
    }

    /// Returns true if the effective visibility changed
    pub fn set_visible(&mut self, key: &str, visible: bool) -> bool {
        let key = key.trim();
        let before = self.is_visible(key);
        self.entries.insert(key.to_string(), visible);
        before != visible
    }

    /// Names explicitly hidden
    pub fn hidden(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &VisibilityMap {
        &self.entries
    }
}

/// Visibility preferences shared between the display and whoever edits
/// them. Survives schema changes: a column keeps its setting wherever it
/// appears in a later header.
pub struct ColumnVisibilityStore {
    set: RwLock<ColumnVisibilitySet>,
    backend: Box<dyn VisibilityBackend>,
    autosave: bool,
    dirty: AtomicBool,
}

impl ColumnVisibilityStore {
    /// Load saved preferences from `backend`. Saves on every change.
    pub fn load(backend: impl VisibilityBackend + 'static) -> Result<Self> {
        let map = backend.load()?;
        let set = ColumnVisibilitySet::from_map(map);
        tracing::debug!(entries = set.len(), hidden = set.hidden().count(), "loaded column visibility");
        Ok(Self {
            set: RwLock::new(set),
            backend: Box::new(backend),
            autosave: true,
            dirty: AtomicBool::new(false),
        })
    }

    /// Store with nothing saved anywhere
    pub fn in_memory() -> Self {
        Self {
            set: RwLock::new(ColumnVisibilitySet::new()),
            backend: Box::new(MemoryBackend::new()),
            autosave: true,
            dirty: AtomicBool::new(false),
        }
    }

    /// With autosave off, changes are kept until `save` or `flush`
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Visibility of a column given by its header label ("Boost (psi)")
    /// or plain name
    pub fn is_visible(&self, label: &str) -> bool {
        self.set.read().is_visible(&canonical_name(label))
    }

    /// Visibility of a parsed column
    pub fn is_column_visible(&self, column: &ColumnDescriptor) -> bool {
        self.set.read().is_visible(column_key(column))
    }

    /// Show or hide one column by label. Returns whether anything changed.
    pub fn set_visible(&self, label: &str, visible: bool) -> Result<bool> {
        self.set_key(&canonical_name(label), visible)
    }

    /// Show or hide a parsed column. Returns whether anything changed.
    pub fn set_column_visible(&self, column: &ColumnDescriptor, visible: bool) -> Result<bool> {
        self.set_key(column_key(column), visible)
    }

    /// Show or hide several columns by label with a single save
    pub fn set_all<'a, I>(&self, labels: I, visible: bool) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = self.set.write();
        let changed = labels
            .into_iter()
            .filter(|label| set.set_visible(&canonical_name(label), visible))
            .count();
        if changed > 0 || self.save_pending() {
            self.after_change(&set)?;
        }
        Ok(changed)
    }

    fn set_key(&self, key: &str, visible: bool) -> Result<bool> {
        let mut set = self.set.write();
        let changed = set.set_visible(key, visible);
        if changed {
            tracing::debug!(column = %key, visible, "column visibility changed");
        }
        // An earlier failed save is retried with the next edit
        if changed || self.save_pending() {
            self.after_change(&set)?;
        }
        Ok(changed)
    }

    /// Forget every preference; all columns become visible
    pub fn reset(&self) -> Result<()> {
        let mut set = self.set.write();
        *set = ColumnVisibilitySet::new();
        self.after_change(&set)
    }

    /// Write the current mapping to the backend
    pub fn save(&self) -> Result<()> {
        let set = self.set.read();
        self.backend.save(set.as_map())?;
        self.dirty.store(false, Ordering::Release);
        Ok(())
    }

    /// Save only if something changed since the last save
    pub fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save()?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> ColumnVisibilitySet {
        self.set.read().clone()
    }

    /// Columns of `schema` to display, in schema order
    pub fn visible_columns<'s>(&self, schema: &'s Schema) -> Vec<&'s ColumnDescriptor> {
        let set = self.set.read();
        schema
            .iter()
            .filter(|column| set.is_visible(column_key(column)))
            .collect()
    }

    /// (descriptor, value) pairs of `row` to display, in field order
    pub fn visible_fields<'r>(&self, row: &'r Row) -> Vec<(&'r ColumnDescriptor, &'r str)> {
        let set = self.set.read();
        row.fields()
            .filter(|(column, _)| set.is_visible(column_key(column)))
            .collect()
    }

    /// True if a change has not reached the backend yet
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn save_pending(&self) -> bool {
        self.autosave && self.is_dirty()
    }

    // Caller holds the write lock so saves land in change order.
    // `dirty` is cleared only once the backend accepted the mapping.
    fn after_change(&self, set: &ColumnVisibilitySet) -> Result<()> {
        self.dirty.store(true, Ordering::Release);
        if self.autosave {
            self.backend.save(set.as_map())?;
            self.dirty.store(false, Ordering::Release);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ColumnVisibilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnVisibilityStore")
            .field("set", &*self.set.read())
            .field("autosave", &self.autosave)
            .finish()
    }
}
