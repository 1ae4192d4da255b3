// src/tail/fingerprint.rs
// File identity heuristic for rotation detection
//
// Unix compares (device, inode). Elsewhere, creation time is compared when
// the filesystem reports one. A delete+recreate between two polls that
// reuses the inode (or has no creation time) and grows past the old offset
// goes unnoticed; the size-decrease check in the poll covers the rest.

use std::fs::Metadata;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    inode: Option<(u64, u64)>,
    created: Option<SystemTime>,
}

impl Fingerprint {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            inode: inode_of(meta),
            created: meta.created().ok(),
        }
    }

    /// True when both fingerprints carry a comparable field and it differs
    pub fn differs_from(&self, other: &Fingerprint) -> bool {
        if let (Some(a), Some(b)) = (self.inode, other.inode) {
            return a != b;
        }
        matches!((self.created, other.created), (Some(a), Some(b)) if a != b)
    }
}

#[cfg(unix)]
fn inode_of(meta: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn inode_of(_meta: &Metadata) -> Option<(u64, u64)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fp(inode: Option<(u64, u64)>, created: Option<SystemTime>) -> Fingerprint {
        Fingerprint { inode, created }
    }

    #[test]
    fn test_same_inode_is_same_file() {
        let t = SystemTime::UNIX_EPOCH;
        assert!(!fp(Some((1, 42)), Some(t)).differs_from(&fp(Some((1, 42)), Some(t))));
    }

    #[test]
    fn test_inode_change_is_rotation() {
        assert!(fp(Some((1, 42)), None).differs_from(&fp(Some((1, 43)), None)));
    }

    #[test]
    fn test_inode_takes_precedence_over_created() {
        let a = SystemTime::UNIX_EPOCH;
        let b = a + Duration::from_secs(5);
        assert!(!fp(Some((1, 42)), Some(a)).differs_from(&fp(Some((1, 42)), Some(b))));
    }

    #[test]
    fn test_created_used_without_inode() {
        let a = SystemTime::UNIX_EPOCH;
        let b = a + Duration::from_secs(5);
        assert!(fp(None, Some(a)).differs_from(&fp(None, Some(b))));
        assert!(!fp(None, Some(a)).differs_from(&fp(None, Some(a))));
    }

    #[test]
    fn test_nothing_comparable_never_differs() {
        assert!(!fp(None, None).differs_from(&fp(None, Some(SystemTime::UNIX_EPOCH))));
    }

    #[test]
    fn test_from_metadata_is_stable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let a = Fingerprint::from_metadata(&file.as_file().metadata().unwrap());
        let b = Fingerprint::from_metadata(&std::fs::metadata(file.path()).unwrap());
        assert!(!a.differs_from(&b));
    }
}
