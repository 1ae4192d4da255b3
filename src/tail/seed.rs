// src/tail/seed.rs
// Initial offsets for a new watch session

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::{Fingerprint, TailState};
use crate::error::{Result, WatchError};

/// Backwards scan step when looking for the newest complete row
const SCAN_CHUNK: u64 = 8 * 1024;

/// First line of a datalog as read from disk
#[derive(Debug, Clone)]
pub struct HeaderLine {
    /// Line text without terminator, decoded lossily
    pub text: String,
    /// Bytes consumed by the line including its newline
    pub len: u64,
    pub fingerprint: Fingerprint,
    /// File size at the time the header was read
    pub file_size: u64,
}

/// Read the first line of `path`.
///
/// The line must end in a newline. A first line that is still being
/// written is reported as `Format`.
pub fn read_header_line(path: &Path) -> Result<HeaderLine> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => WatchError::FileGone(path.to_path_buf()),
        _ => WatchError::Io(e),
    })?;
    let meta = file.metadata()?;
    let file_size = meta.len();
    let fingerprint = Fingerprint::from_metadata(&meta);

    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    let len = reader.read_until(b'\n', &mut raw)? as u64;

    if len == 0 {
        return Err(WatchError::Format(format!(
            "{} is empty, no header line",
            path.display()
        )));
    }

    if raw.last() != Some(&b'\n') {
        return Err(WatchError::Format(format!(
            "{}: header line is not terminated yet",
            path.display()
        )));
    }

    let text = String::from_utf8_lossy(&raw)
        .trim_end_matches(['\n', '\r'])
        .to_string();

    Ok(HeaderLine {
        text,
        len,
        fingerprint,
        file_size,
    })
}

impl TailState {
    /// Tail every row after the header
    pub fn after_header(path: &Path, header: &HeaderLine) -> Self {
        TailState::new(path, header.len, Some(header.fingerprint))
    }

    /// Tail from the newest complete, non-blank row already in the file, so
    /// the consumer gets current values immediately without replaying the
    /// whole history.
    pub fn at_latest_row(path: &Path, header: &HeaderLine) -> Result<Self> {
        let mut file = File::open(path)?;
        let offset = find_latest_line_start(&mut file, header.len, header.file_size)?;
        tracing::debug!(
            file = %path.display(),
            offset,
            "seeded tail at latest existing row"
        );
        Ok(TailState::new(path, offset, Some(header.fingerprint)))
    }
}

/// Start offset of the last complete non-blank line in `[data_start, size)`,
/// or `data_start` when there is none. Reads backwards in chunks so a large
/// existing log is not loaded whole.
fn find_latest_line_start<R: Read + Seek>(
    reader: &mut R,
    data_start: u64,
    size: u64,
) -> std::io::Result<u64> {
    if size <= data_start {
        return Ok(data_start);
    }

    let mut base = size;
    let mut tail: Vec<u8> = Vec::new();

    loop {
        let chunk_start = base.saturating_sub(SCAN_CHUNK).max(data_start);
        let mut chunk = vec![0u8; (base - chunk_start) as usize];
        reader.seek(SeekFrom::Start(chunk_start))?;
        reader.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&tail);
        tail = chunk;
        base = chunk_start;

        if let Some(found) = locate_latest_line(&tail, base, base == data_start) {
            return Ok(found);
        }
        if base == data_start {
            return Ok(data_start);
        }
    }
}

/// Search `tail` (file bytes starting at `base`) for the last complete
/// non-blank line. `at_line_start` says whether `base` begins a line.
/// `None` means more bytes before `base` are needed.
fn locate_latest_line(tail: &[u8], base: u64, at_line_start: bool) -> Option<u64> {
    let newlines: Vec<usize> = tail
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .map(|(i, _)| i)
        .collect();

    for k in (0..newlines.len()).rev() {
        let line_end = newlines[k];
        let line_start = if k > 0 {
            newlines[k - 1] + 1
        } else if at_line_start {
            0
        } else {
            return None;
        };
        let line = &tail[line_start..line_end];
        if line.iter().any(|b| !b.is_ascii_whitespace()) {
            return Some(base + line_start as u64);
        }
    }

    if at_line_start { Some(base) } else { None }
}
