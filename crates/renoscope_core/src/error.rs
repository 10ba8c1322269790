//! Error types for the Renoscope local store.

use crate::types::{EntityKind, LocalId};
use std::io;
use thiserror::Error;

/// Result type for local store operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in local store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CBOR encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// The journal is corrupted or invalid.
    #[error("journal corruption at offset {offset}: {message}")]
    JournalCorruption {
        /// Byte offset of the bad record.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Another process holds the store lock.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// Store directory does not exist and creation was disabled.
    #[error("store not found at {path}")]
    StoreNotFound {
        /// The path that was searched.
        path: String,
    },

    /// Row not found.
    #[error("{entity} row {local_id} not found")]
    NotFound {
        /// Entity table searched.
        entity: EntityKind,
        /// Local identifier that was not found.
        local_id: LocalId,
    },

    /// Invalid journal format or version.
    #[error("invalid journal format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },
}

impl CoreError {
    /// Creates a journal corruption error.
    pub fn journal_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a codec error from any displayable error.
    pub fn codec(err: impl std::fmt::Display) -> Self {
        Self::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::NotFound {
            entity: EntityKind::ScopeItem,
            local_id: LocalId::new(7),
        };
        assert_eq!(err.to_string(), "scope_item row 7 not found");

        let err = CoreError::journal_corruption(42, "bad magic");
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
