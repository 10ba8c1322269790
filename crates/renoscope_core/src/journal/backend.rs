//! Byte-level backend trait for the journal.

use crate::error::CoreResult;

/// Append-only byte log backing the store journal.
///
/// Backends are opaque: they know nothing about record framing. The
/// [`super::Journal`] owns the format.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `sync` makes every appended byte durable
/// - `replace` is atomic with respect to crashes
pub trait JournalBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range extends past the end of the log.
    fn read_at(&self, offset: u64, len: usize) -> CoreResult<Vec<u8>>;

    /// Appends data and returns the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> CoreResult<u64>;

    /// Returns the current size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> CoreResult<u64>;

    /// Flushes appended data to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> CoreResult<()>;

    /// Cuts the log back to `new_size` bytes.
    ///
    /// Used to drop a torn trailing record.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` exceeds the current size or I/O fails.
    fn truncate(&mut self, new_size: u64) -> CoreResult<()>;

    /// Replaces the whole log with `data` in one step.
    ///
    /// Either the new contents or the old ones survive a failure; the log is
    /// never observed empty or half written.
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails. The previous log is left in place.
    fn replace(&mut self, data: &[u8]) -> CoreResult<()>;

    /// Reads the whole log.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn read_all(&self) -> CoreResult<Vec<u8>> {
        let size = self.size()?;
        self.read_at(0, size as usize)
    }
}
