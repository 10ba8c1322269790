//! The `Syncable` row contract.

use crate::store::Tables;
use crate::table::Table;
use crate::types::{EntityKind, LocalId, SyncMeta, SyncStatus};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A row type stored in one of the local tables and synchronized with the server.
///
/// Implementors carry a [`SyncMeta`] next to their domain fields. The store
/// only touches the metadata; domain fields change through
/// [`Syncable::assign_fields`] (remote snapshots) or caller closures (local edits).
pub trait Syncable:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The table this row type lives in.
    const KIND: EntityKind;

    /// Returns the sync metadata.
    fn meta(&self) -> &SyncMeta;

    /// Returns the sync metadata mutably.
    fn meta_mut(&mut self) -> &mut SyncMeta;

    /// Copies every domain field from `snapshot`, leaving the metadata untouched.
    fn assign_fields(&mut self, snapshot: &Self);

    /// Selects this row type's table.
    fn table(tables: &Tables) -> &RwLock<Table<Self>>;

    /// Remote id of a parent row that could not be resolved locally yet.
    fn unresolved_reference(&self) -> Option<&str> {
        None
    }

    /// Links the row to its parent once the deferred reference resolves.
    fn link_reference(&mut self, _parent: LocalId) {}

    /// Keeps `local`'s parent link when this snapshot carries none.
    ///
    /// A server echo of a row pushed without its parent has no reference at
    /// all; applying it must not drop the link the device still knows about.
    fn inherit_reference(&mut self, _local: &Self) {}

    /// Returns the local id.
    fn local_id(&self) -> LocalId {
        self.meta().local_id
    }

    /// Returns the remote id, if the row has been created on the server.
    fn remote_id(&self) -> Option<&str> {
        self.meta().remote_id.as_deref()
    }

    /// Returns the sync status.
    fn sync_status(&self) -> SyncStatus {
        self.meta().sync_status
    }

    /// Returns true if the row is soft-deleted.
    fn is_deleted(&self) -> bool {
        self.meta().is_deleted
    }
}
