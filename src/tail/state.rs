// src/tail/state.rs
// Per-session tail state and the poll step

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{Fingerprint, PollOutcome, TailError};

/// Position of one watch session inside its file.
///
/// Owned by the session's poll loop. `byte_offset` only moves forward,
/// except on rotation where it goes back to 0.
#[derive(Debug, Clone)]
pub struct TailState {
    path: PathBuf,
    byte_offset: u64,
    fingerprint: Option<Fingerprint>,
    /// Bytes after the last newline, carried until the line completes.
    /// Kept undecoded so a UTF-8 sequence split across writes survives.
    partial: Vec<u8>,
}

impl TailState {
    pub fn new(path: impl Into<PathBuf>, byte_offset: u64, fingerprint: Option<Fingerprint>) -> Self {
        Self {
            path: path.into(),
            byte_offset,
            fingerprint,
            partial: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_offset(&self) -> u64 {
        self.byte_offset
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// Bytes of the unterminated trailing line seen so far
    pub fn partial_len(&self) -> usize {
        self.partial.len()
    }

    /// Read whatever was appended since the last poll.
    ///
    /// An idle poll is a single stat. On error nothing is modified, so the
    /// same state can be polled again.
    pub fn poll(&mut self) -> Result<PollOutcome, TailError> {
        let meta = fs::metadata(&self.path).map_err(TailError::from_io)?;
        let size = meta.len();
        let current = Fingerprint::from_metadata(&meta);

        let replaced = self
            .fingerprint
            .as_ref()
            .is_some_and(|known| known.differs_from(&current));
        let rotated = size < self.byte_offset || replaced;

        let start = if rotated { 0 } else { self.byte_offset };

        if size == start {
            if rotated {
                tracing::info!(
                    file = %self.path.display(),
                    old_offset = self.byte_offset,
                    new_size = size,
                    "file truncated or replaced, resetting offset"
                );
                self.reset(current);
            }
            return Ok(PollOutcome {
                rotated,
                lines: Vec::new(),
            });
        }

        let bytes = read_range(&self.path, start, size - start).map_err(TailError::from_io)?;

        if rotated {
            tracing::info!(
                file = %self.path.display(),
                old_offset = self.byte_offset,
                new_size = size,
                "file truncated or replaced, resetting offset"
            );
            self.reset(current);
        }
        self.fingerprint = Some(current);
        self.byte_offset = start + bytes.len() as u64;
        self.partial.extend_from_slice(&bytes);

        let lines = drain_complete_lines(&mut self.partial);
        tracing::trace!(
            file = %self.path.display(),
            read = bytes.len(),
            lines = lines.len(),
            carried = self.partial.len(),
            "tail poll"
        );

        Ok(PollOutcome { rotated, lines })
    }

    fn reset(&mut self, fingerprint: Fingerprint) {
        self.byte_offset = 0;
        self.partial.clear();
        self.fingerprint = Some(fingerprint);
    }
}

/// Read up to `len` bytes starting at `start`. The file may shrink between
/// stat and read, so fewer bytes can come back.
fn read_range(path: &Path, start: u64, len: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Split off every newline-terminated line from `buf`, leaving the
/// unterminated remainder in place. Blank lines are dropped.
fn drain_complete_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
        return Vec::new();
    };

    let complete: Vec<u8> = buf.drain(..=last_newline).collect();
    complete
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .filter(|line| !line.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn append(file: &mut NamedTempFile, data: &str) {
        file.write_all(data.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    fn state_at(file: &NamedTempFile, offset: u64) -> TailState {
        let meta = fs::metadata(file.path()).unwrap();
        TailState::new(file.path(), offset, Some(Fingerprint::from_metadata(&meta)))
    }

    // ============================================================================
    // drain_complete_lines tests
    // ============================================================================

    #[test]
    fn test_drain_keeps_unterminated_tail() {
        let mut buf = b"a,b\nc,d\ne,".to_vec();
        let lines = drain_complete_lines(&mut buf);
        assert_eq!(lines, vec!["a,b", "c,d"]);
        assert_eq!(buf, b"e,");
    }

    #[test]
    fn test_drain_without_newline_takes_nothing() {
        let mut buf = b"x,y".to_vec();
        assert!(drain_complete_lines(&mut buf).is_empty());
        assert_eq!(buf, b"x,y");
    }

    #[test]
    fn test_drain_strips_cr_and_skips_blank_lines() {
        let mut buf = b"1,2\r\n\r\n\n3,4\r\n".to_vec();
        assert_eq!(drain_complete_lines(&mut buf), vec!["1,2", "3,4"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_drain_split_utf8_sequence() {
        // "λ" is 0xCE 0xBB; first poll only sees the lead byte
        let mut buf = vec![b'A', b',', 0xCE];
        assert!(drain_complete_lines(&mut buf).is_empty());
        buf.extend_from_slice(&[0xBB, b'\n']);
        assert_eq!(drain_complete_lines(&mut buf), vec!["A,λ"]);
    }

    // ============================================================================
    // poll tests
    // ============================================================================

    #[test]
    fn test_idle_polls_leave_offset_unchanged() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "A,B\n1,2\n");
        let mut state = state_at(&file, 8);

        let first = state.poll().unwrap();
        let second = state.poll().unwrap();
        assert!(first.is_idle());
        assert!(second.is_idle());
        assert_eq!(state.byte_offset(), 8);
    }

    #[test]
    fn test_two_writes_match_one_write() {
        let mut split = NamedTempFile::new().unwrap();
        append(&mut split, "A,B\n");
        let mut split_state = state_at(&split, 4);
        append(&mut split, "a,b\n");
        let mut split_lines = split_state.poll().unwrap().lines;
        append(&mut split, "c,d\n");
        split_lines.extend(split_state.poll().unwrap().lines);

        let mut whole = NamedTempFile::new().unwrap();
        append(&mut whole, "A,B\n");
        let mut whole_state = state_at(&whole, 4);
        append(&mut whole, "a,b\nc,d\n");
        let whole_lines = whole_state.poll().unwrap().lines;

        assert_eq!(split_lines, vec!["a,b", "c,d"]);
        assert_eq!(split_lines, whole_lines);
        assert_eq!(split_state.byte_offset(), whole_state.byte_offset());
    }

    #[test]
    fn test_partial_line_carried_across_polls() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "A,B,C\n");
        let mut state = state_at(&file, 6);

        append(&mut file, "x,y");
        let first = state.poll().unwrap();
        assert!(first.lines.is_empty());
        assert_eq!(state.partial_len(), 3);
        assert_eq!(state.byte_offset(), 9);

        append(&mut file, ",z\n");
        let second = state.poll().unwrap();
        assert_eq!(second.lines, vec!["x,y,z"]);
        assert_eq!(state.partial_len(), 0);
    }

    #[test]
    fn test_truncation_resets_offset() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "Long Header A,Long Header B\n1,2\n3,4\n");
        let mut state = state_at(&file, 36);

        file.as_file().set_len(0).unwrap();
        fs::write(file.path(), "X,Y\n9,9\n").unwrap();

        let outcome = state.poll().unwrap();
        assert!(outcome.rotated);
        assert_eq!(outcome.lines, vec!["X,Y", "9,9"]);
        assert_eq!(state.byte_offset(), 8);
    }

    #[test]
    fn test_truncation_to_empty_reports_rotation() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "A,B\n1,2\n");
        let mut state = state_at(&file, 8);

        file.as_file().set_len(0).unwrap();
        let outcome = state.poll().unwrap();
        assert!(outcome.rotated);
        assert!(outcome.lines.is_empty());
        assert_eq!(state.byte_offset(), 0);

        // Next poll on the still-empty file is idle again
        assert!(state.poll().unwrap().is_idle());
    }

    #[test]
    fn test_missing_file_is_gone_and_state_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.csv");
        fs::write(&path, "A\n1\n").unwrap();
        let meta = fs::metadata(&path).unwrap();
        let mut state = TailState::new(&path, 4, Some(Fingerprint::from_metadata(&meta)));

        fs::remove_file(&path).unwrap();
        assert!(matches!(state.poll(), Err(TailError::Gone)));
        assert_eq!(state.byte_offset(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_file_detected_by_inode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        fs::write(&path, "A,B\n1,2\n").unwrap();
        let meta = fs::metadata(&path).unwrap();
        let mut state = TailState::new(&path, 8, Some(Fingerprint::from_metadata(&meta)));

        // Keep the old inode alive so the new file cannot reuse it
        let _old = File::open(&path).unwrap();
        let replacement = dir.path().join("run.csv.new");
        fs::write(&replacement, "C,D\n5,6\n7,8\n").unwrap();
        fs::rename(&replacement, &path).unwrap();

        let outcome = state.poll().unwrap();
        assert!(outcome.rotated);
        assert_eq!(outcome.lines, vec!["C,D", "5,6", "7,8"]);
    }

    #[test]
    fn test_long_line_accumulates_without_truncation() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "A\n");
        let mut state = state_at(&file, 2);

        let chunk = "9".repeat(64 * 1024);
        for _ in 0..4 {
            append(&mut file, &chunk);
            assert!(state.poll().unwrap().lines.is_empty());
        }
        append(&mut file, "\n");
        let lines = state.poll().unwrap().lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 4 * 64 * 1024);
    }
}
