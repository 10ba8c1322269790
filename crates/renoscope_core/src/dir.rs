//! Store directory management.
//!
//! ```text
//! <store_path>/
//! ├─ LOCK          # Advisory lock for single-writer
//! └─ journal.log   # Row change journal
//! ```
//!
//! The LOCK file ensures only one process writes to the store at a time.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Name of the lock file.
pub const LOCK_FILE: &str = "LOCK";

/// Name of the journal file.
pub const JOURNAL_FILE: &str = "journal.log";

/// An opened store directory holding the exclusive lock.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store directory and takes the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - The path exists but is not a directory
    /// - Another process holds the lock
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::StoreNotFound {
                    path: path.display().to_string(),
                });
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the journal file.
    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.path.join(JOURNAL_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("field").join("store");

        let store_dir = StoreDir::open(&store_path, true).unwrap();
        assert!(store_path.is_dir());
        assert!(store_path.join(LOCK_FILE).exists());
        assert_eq!(store_dir.journal_path(), store_path.join(JOURNAL_FILE));
    }

    #[test]
    fn missing_directory_without_create() {
        let dir = tempdir().unwrap();
        let err = StoreDir::open(&dir.path().join("absent"), false).unwrap_err();
        assert!(matches!(err, CoreError::StoreNotFound { .. }));
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _first = StoreDir::open(dir.path(), true).unwrap();
        let err = StoreDir::open(dir.path(), true).unwrap_err();
        assert!(matches!(err, CoreError::StoreLocked));
    }

    #[test]
    fn file_path_is_rejected() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("not-a-dir");
        File::create(&file_path).unwrap();
        assert!(StoreDir::open(&file_path, true).is_err());
    }
}
