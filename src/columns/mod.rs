// src/columns/mod.rs
// Column visibility preferences and where they are kept

mod backend;
mod store;

pub use backend::{JsonFileBackend, MemoryBackend, VisibilityBackend, VisibilityMap};
pub use store::{ColumnVisibilitySet, ColumnVisibilityStore, canonical_name};
