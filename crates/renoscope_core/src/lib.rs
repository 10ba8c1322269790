//! # Renoscope Core
//!
//! Offline-first local store for Renoscope field scoping data.
//!
//! This crate provides:
//! - Entity rows (properties, scope items, media) with sync metadata
//! - Per-entity tables with a remote-id index
//! - An append-only, checksummed change journal for durability
//! - The [`LocalStore`] API used by the app and the sync engine
//!
//! ## Sync metadata
//!
//! Every row carries a [`SyncMeta`]: a local id assigned on insert, an
//! optional server id, a [`SyncStatus`] and a soft-delete flag. Local edits
//! put a row back into `Pending`; the sync engine drives it through
//! `Syncing` to `Synced` or `Failed`.
//!
//! ## Durability
//!
//! Each write is journaled before it is applied in memory. Opening a store
//! replays the journal; a torn trailing record from an interrupted write is
//! dropped. [`LocalStore::compact`] rewrites the journal as one record per row.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod entity;
mod error;
mod journal;
mod record;
mod store;
mod table;
mod types;

pub use config::StoreConfig;
pub use dir::{StoreDir, JOURNAL_FILE, LOCK_FILE};
pub use entity::{Complexity, Media, PermitLikelihood, Property, PropertyStatus, ScopeItem};
pub use error::{CoreError, CoreResult};
pub use journal::{
    scan, FileJournal, Journal, JournalBackend, JournalEntry, JournalScan, MemoryJournal,
    RecordKind,
};
pub use record::Syncable;
pub use store::{CompactStats, LocalStore, StoreStats, Tables};
pub use table::{Table, TableStats};
pub use types::{now_millis, EntityKind, LocalId, SyncMeta, SyncStatus};
