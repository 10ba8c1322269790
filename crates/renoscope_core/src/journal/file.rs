//! File-backed journal.

use super::backend::JournalBackend;
use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A journal backend writing to a single file.
///
/// `sync()` calls `File::sync_all()`; with [`crate::StoreConfig::sync_on_write`]
/// enabled every committed row change survives a crash.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl FileJournal {
    /// Opens or creates the journal file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        // Left behind by a compaction that died before its rename
        let temp = temp_path(path);
        if temp.exists() {
            tracing::warn!(path = %temp.display(), "removing unfinished compacted journal");
            fs::remove_file(&temp)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }

    /// Returns the path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JournalBackend for FileJournal {
    fn read_at(&self, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        let end = offset.saturating_add(len as u64);
        if offset > self.size || end > self.size {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read of {len} bytes at {offset} past end {}", self.size),
            )));
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> CoreResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }

        let mut file = self.file.lock();
        // Bytes past the known end belong to a write that failed earlier
        if file.metadata()?.len() != offset {
            file.set_len(offset)?;
        }
        file.seek(SeekFrom::Start(offset))?;
        if let Err(err) = file.write_all(data) {
            if let Err(rollback) = file.set_len(offset) {
                tracing::warn!(offset, error = %rollback, "could not roll back partial journal write");
            }
            return Err(err.into());
        }
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn size(&self) -> CoreResult<u64> {
        Ok(self.size)
    }

    fn sync(&mut self) -> CoreResult<()> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> CoreResult<()> {
        if new_size > self.size {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot truncate to {new_size}, size is {}", self.size),
            )));
        }
        let file = self.file.lock();
        file.set_len(new_size)?;
        file.sync_all()?;
        self.size = new_size;
        Ok(())
    }

    /// Writes `data` to a sibling temp file, syncs it, renames it over the
    /// journal and syncs the directory.
    fn replace(&mut self, data: &[u8]) -> CoreResult<()> {
        let temp = temp_path(&self.path);
        let written = write_synced(&temp, data).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&temp) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "could not remove temp journal");
                }
            }
            return Err(err.into());
        }
        sync_directory(&self.path)?;

        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        *self.file.get_mut() = file;
        self.size = data.len() as u64;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Makes a rename of `path` durable.
#[cfg(unix)]
fn sync_directory(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> io::Result<()> {
    // NTFS journals metadata itself
    Ok(())
}
