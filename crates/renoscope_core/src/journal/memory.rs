//! In-memory journal backend.

use super::backend::JournalBackend;
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;

/// A journal backend that keeps the log in memory.
///
/// Used by [`crate::LocalStore::open_in_memory`] and by recovery tests that
/// need to hand-craft a damaged log. Clones share the same bytes.
#[derive(Debug, Default, Clone)]
pub struct MemoryJournal {
    data: Arc<RwLock<Vec<u8>>>,
}

impl MemoryJournal {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log with pre-existing bytes.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Returns a copy of the log bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl JournalBackend for MemoryJournal {
    fn read_at(&self, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        let data = self.data.read();
        let start = offset as usize;
        let end = start.saturating_add(len);
        if start > data.len() || end > data.len() {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read of {len} bytes at {offset} past end {}", data.len()),
            )));
        }
        Ok(data[start..end].to_vec())
    }

    fn append(&mut self, bytes: &[u8]) -> CoreResult<u64> {
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn size(&self) -> CoreResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> CoreResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> CoreResult<()> {
        let mut data = self.data.write();
        if new_size > data.len() as u64 {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot truncate to {new_size}, size is {}", data.len()),
            )));
        }
        data.truncate(new_size as usize);
        Ok(())
    }

    fn replace(&mut self, bytes: &[u8]) -> CoreResult<()> {
        *self.data.write() = bytes.to_vec();
        Ok(())
    }
}
