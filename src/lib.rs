// src/lib.rs
// logwatch - live tailing of CSV datalogs with per-column visibility

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod columns;
pub mod config;
pub mod csv;
pub mod error;
pub mod tail;
pub mod watcher;

pub use error::{Result, WatchError};
