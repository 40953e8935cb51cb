//! Anonymous installation identity
//!
//! A single random UUID, generated on first access and stored as a flat
//! marker file inside the storage root. It identifies an installation
//! without identifying a person, and is never regenerated or deleted.
//!
//! Identity is optional metadata: every I/O failure yields `None` rather
//! than an error. Concurrent first-writers may race on creation; a lost
//! race produces a transient duplicate identity, not corruption, so no
//! locking is used.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::IDENTITY_FILE;

/// Store for the per-installation anonymous identity marker
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Create a store rooted at the given storage directory
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(IDENTITY_FILE),
        }
    }

    /// Read the existing identity, if any
    pub fn get(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|token| token.trim().to_string())
    }

    /// Read the identity, generating and persisting one if absent
    pub fn get_or_create(&self) -> Option<String> {
        if self.path.exists() {
            return self.get();
        }

        let token = Uuid::new_v4().to_string();
        fs::write(&self.path, &token).ok()?;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_identity_on_first_access() {
        let tmp = TempDir::new().unwrap();
        let store = IdentityStore::new(tmp.path());

        assert!(store.get().is_none());

        let token = store.get_or_create().unwrap();
        assert_eq!(token.len(), 36); // canonical UUID form
        assert!(tmp.path().join(IDENTITY_FILE).is_file());
    }

    #[test]
    fn test_identity_is_stable_across_reads() {
        let tmp = TempDir::new().unwrap();
        let store = IdentityStore::new(tmp.path());

        let first = store.get_or_create().unwrap();
        let second = store.get_or_create().unwrap();
        let third = IdentityStore::new(tmp.path()).get_or_create().unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_existing_marker_is_trimmed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(IDENTITY_FILE), "  abc-123\n").unwrap();

        let store = IdentityStore::new(tmp.path());
        assert_eq!(store.get_or_create().as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_io_failure_yields_none() {
        // Marker path inside a directory that does not exist
        let store = IdentityStore::new(Path::new("/nonexistent/promptpulse"));
        assert!(store.get_or_create().is_none());
    }
}
