//! Append-only journal of row changes.
//!
//! The store writes one record per row mutation before applying it to the
//! in-memory table. Opening a store replays the journal from the start.
//! Compaction rewrites it as one upsert per surviving row.

mod backend;
mod file;
mod memory;
mod record;

pub use backend::JournalBackend;
pub use file::FileJournal;
pub use memory::MemoryJournal;
pub use record::{
    compute_crc32, decode_frame, Frame, JournalEntry, RecordKind, CRC_SIZE, HEADER_SIZE,
    JOURNAL_MAGIC, JOURNAL_VERSION,
};

use crate::error::CoreResult;

/// Result of scanning a journal.
#[derive(Debug, Default)]
pub struct JournalScan {
    /// Valid entries in log order.
    pub entries: Vec<JournalEntry>,
    /// Byte length of the valid prefix.
    pub valid_len: u64,
    /// Bytes after the valid prefix belonging to an interrupted write.
    pub torn_bytes: u64,
}

/// Decodes every record in `bytes`.
///
/// # Errors
///
/// Returns an error if a complete record in the log fails validation.
pub fn scan(bytes: &[u8]) -> CoreResult<JournalScan> {
    let mut scan = JournalScan::default();
    let size = bytes.len() as u64;
    let mut offset = 0u64;

    while offset < size {
        match decode_frame(bytes, offset)? {
            Frame::Record(entry, next) => {
                scan.entries.push(entry);
                offset = next;
            }
            Frame::Torn => {
                scan.torn_bytes = size - offset;
                break;
            }
        }
    }

    scan.valid_len = offset;
    Ok(scan)
}

/// The store journal on top of a byte backend.
pub struct Journal {
    backend: Box<dyn JournalBackend>,
    sync_on_write: bool,
    records: usize,
}

impl Journal {
    /// Wraps a backend.
    pub fn new(backend: Box<dyn JournalBackend>, sync_on_write: bool) -> Self {
        Self {
            backend,
            sync_on_write,
            records: 0,
        }
    }

    /// Reads every valid entry and drops a torn trailing record.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is corrupted before its last record.
    pub fn recover(&mut self) -> CoreResult<Vec<JournalEntry>> {
        let bytes = self.backend.read_all()?;
        let scan = scan(&bytes)?;

        if scan.torn_bytes > 0 {
            tracing::warn!(
                valid_len = scan.valid_len,
                torn_bytes = scan.torn_bytes,
                "dropping torn journal tail"
            );
            self.backend.truncate(scan.valid_len)?;
            self.backend.sync()?;
        }

        self.records = scan.entries.len();
        Ok(scan.entries)
    }

    /// Appends one entry and returns its offset.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub fn append(&mut self, entry: &JournalEntry) -> CoreResult<u64> {
        let bytes = entry.encode()?;
        let offset = self.backend.append(&bytes)?;
        if self.sync_on_write {
            self.backend.sync()?;
        }
        self.records += 1;
        Ok(offset)
    }

    /// Replaces the whole log with `entries`.
    ///
    /// The swap goes through [`JournalBackend::replace`], so a failure leaves
    /// the previous log intact.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend replace fails.
    pub fn rewrite(&mut self, entries: &[JournalEntry]) -> CoreResult<()> {
        let mut bytes = Vec::new();
        for entry in entries {
            bytes.extend_from_slice(&entry.encode()?);
        }
        self.backend.replace(&bytes)?;
        self.records = entries.len();
        Ok(())
    }

    /// Forces appended records to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend sync fails.
    pub fn sync(&mut self) -> CoreResult<()> {
        self.backend.sync()
    }

    /// Returns the log size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report its size.
    pub fn size(&self) -> CoreResult<u64> {
        self.backend.size()
    }

    /// Returns the number of records in the log.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("sync_on_write", &self.sync_on_write)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
