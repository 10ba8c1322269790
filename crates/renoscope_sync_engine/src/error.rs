//! Error types for the sync engine.

use renoscope_core::{CoreError, EntityKind, LocalId};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Only [`SyncError::AdapterNotRegistered`], [`SyncError::SyncInProgress`] and
/// [`SyncError::Cancelled`] abort an engine call. Every other error is caught
/// at the row (push) or item (pull) level and reported in the batch result.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No adapter is registered under this entity name.
    #[error("no adapter registered for model '{0}'")]
    AdapterNotRegistered(String),

    /// Another sync call is already running on this engine.
    #[error("a sync is already in progress")]
    SyncInProgress,

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The server answered with an unsuccessful response.
    #[error("server returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or the status line.
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local store error during sync.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// The entity is mirrored from the server and cannot be pushed.
    #[error("{0} is read-only and cannot be pushed")]
    ReadOnlyEntity(EntityKind),

    /// A row disappeared from the local store while it was being synced.
    #[error("{entity} row {local_id} not found")]
    RowNotFound {
        /// Entity table.
        entity: EntityKind,
        /// Local id of the missing row.
        local_id: LocalId,
    },

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns true if this error can be retried.
    ///
    /// Transport failures marked retryable, server errors (5xx) and rate
    /// limiting (429) are transient; everything else fails the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true for errors that abort an engine call instead of failing a row.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::AdapterNotRegistered(_) | SyncError::SyncInProgress | SyncError::Cancelled
        )
    }
}
