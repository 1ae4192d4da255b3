// src/tail/mod.rs
// Incremental tail reader: byte-offset tracking, rotation detection,
// and line splitting over a growing file

mod fingerprint;
mod seed;
mod state;

pub use fingerprint::Fingerprint;
pub use seed::{HeaderLine, read_header_line};
pub use state::TailState;

use std::io;
use std::path::Path;
use thiserror::Error;

use crate::error::WatchError;

/// Failure of a single poll. The tail state is left as it was.
#[derive(Error, Debug)]
pub enum TailError {
    /// The file no longer exists
    #[error("file no longer exists")]
    Gone,

    /// Stat/open/read failed for another reason (permissions, sharing lock)
    #[error("transient I/O error: {0}")]
    Transient(#[source] io::Error),
}

impl TailError {
    pub(crate) fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            TailError::Gone
        } else {
            TailError::Transient(err)
        }
    }

    pub fn into_watch_error(self, path: &Path) -> WatchError {
        match self {
            TailError::Gone => WatchError::FileGone(path.to_path_buf()),
            TailError::Transient(e) => WatchError::IoTransient(e.to_string()),
        }
    }
}

/// Result of one successful poll
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// The file was truncated or replaced since the last poll. The offset was
    /// reset to 0, so the first line in `lines` (if any) is the new header.
    pub rotated: bool,
    /// Complete, non-blank lines in file order, without terminators
    pub lines: Vec<String>,
}

impl PollOutcome {
    pub fn is_idle(&self) -> bool {
        !self.rotated && self.lines.is_empty()
    }
}
