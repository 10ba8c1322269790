//! Adapters for the renovation scoping entities.
//!
//! Registration order matters for a full sync: properties first, then scope
//! items, then media, so that parents are known locally before their
//! children are pulled.

mod media;
mod property;
mod scope_item;

pub use media::{MediaAdapter, MediaWire};
pub use property::{PropertyAdapter, PropertyWire};
pub use scope_item::{ScopeItemAdapter, ScopeItemWire};

use renoscope_core::{LocalId, LocalStore, SyncMeta, SyncStatus, Syncable};

/// Remote id of the parent row a local foreign key points at.
///
/// Falls back to the deferred reference; `None` when the parent has never
/// been created on the server.
pub(crate) fn parent_remote_id<P: Syncable>(
    store: &LocalStore,
    parent: Option<LocalId>,
    deferred: Option<&str>,
) -> Option<String> {
    parent
        .and_then(|id| store.get::<P>(id))
        .and_then(|row| row.remote_id().map(str::to_string))
        .or_else(|| deferred.map(str::to_string))
}

/// Resolves a remote foreign key to `(local id, deferred reference)`.
pub(crate) fn resolve_parent<P: Syncable>(
    store: &LocalStore,
    remote_id: Option<&str>,
) -> (Option<LocalId>, Option<String>) {
    match remote_id {
        None => (None, None),
        Some(remote_id) => match store.find_by_remote_id::<P>(remote_id) {
            Some(parent) => (Some(parent.local_id()), None),
            None => (None, Some(remote_id.to_string())),
        },
    }
}

/// Metadata of a detached snapshot built from a server object.
pub(crate) fn snapshot_meta(remote_id: Option<&String>, is_deleted: bool) -> SyncMeta {
    SyncMeta {
        remote_id: remote_id.cloned(),
        is_deleted,
        sync_status: SyncStatus::Synced,
        ..SyncMeta::default()
    }
}
