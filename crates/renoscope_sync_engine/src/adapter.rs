//! The model adapter contract.
//!
//! One adapter per entity translates between local rows and the server's
//! wire objects and implements the entity-specific sync primitives. Most
//! primitives have defaults over the [`LocalStore`]; an adapter only has to
//! provide its configuration, its store handle and the two translations.

use crate::config::AdapterConfig;
use crate::context::SyncContext;
use crate::error::SyncResult;
use crate::pull::pull_model;
use crate::push::push_model;
use crate::result::SyncItemResult;
use renoscope_core::{LocalId, LocalStore, SyncStatus, Syncable};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Per-entity translation and sync primitives.
pub trait ModelAdapter: Send + Sync + 'static {
    /// Local row type.
    type Row: Syncable;

    /// Wire object type. Its identifier field is serialized as `_id`.
    type Wire: Serialize + DeserializeOwned + fmt::Debug;

    /// Returns the adapter configuration.
    fn config(&self) -> &AdapterConfig;

    /// Returns the store the adapter reads and writes.
    fn store(&self) -> &LocalStore;

    /// Serializes a row for the server.
    ///
    /// Local foreign keys must be translated to the referenced row's remote
    /// id; a reference that has no remote id yet is left out.
    ///
    /// # Errors
    ///
    /// Fails for read-only entities.
    fn to_wire(&self, row: &Self::Row) -> SyncResult<Self::Wire>;

    /// Builds a detached row snapshot from a server object.
    ///
    /// Remote foreign keys are resolved through the store's remote-id index.
    /// An unresolved reference keeps the remote id in the row's `*_ref`
    /// field for [`ModelAdapter::resolve_references`].
    ///
    /// # Errors
    ///
    /// Fails if the object cannot be represented as a row.
    fn from_wire(&self, wire: &Self::Wire) -> SyncResult<Self::Row>;

    /// Returns the name the adapter is registered under.
    fn entity_name(&self) -> &str {
        &self.config().entity_name
    }

    /// Rows awaiting a create or update push.
    fn get_pending(&self) -> Vec<Self::Row> {
        self.store().get_pending::<Self::Row>()
    }

    /// Soft-deleted rows whose deletion still has to be pushed.
    fn get_pending_deletions(&self) -> Vec<Self::Row> {
        self.store().get_pending_deletions::<Self::Row>()
    }

    /// All rows.
    fn get_all(&self, include_deleted: bool) -> Vec<Self::Row> {
        self.store().get_all::<Self::Row>(include_deleted)
    }

    /// Finds the local copy of a server record.
    fn find_by_remote_id(&self, remote_id: &str) -> Option<Self::Row> {
        self.store().find_by_remote_id::<Self::Row>(remote_id)
    }

    /// Persists a sync state transition.
    ///
    /// With a snapshot, the row's domain fields and deleted flag are replaced
    /// by the snapshot's first. Returns false if the row no longer exists.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    fn apply_status(
        &self,
        local_id: LocalId,
        status: SyncStatus,
        remote_id: Option<&str>,
        snapshot: Option<&Self::Row>,
    ) -> SyncResult<bool> {
        let deleted = match snapshot {
            Some(snapshot) => {
                if self.store().apply_remote(local_id, snapshot)?.is_none() {
                    return Ok(false);
                }
                Some(snapshot.is_deleted())
            }
            None => None,
        };
        Ok(self
            .store()
            .set_sync_state::<Self::Row>(local_id, status, remote_id, deleted)?)
    }

    /// Materializes a server record as a new `Synced` row.
    ///
    /// Returns `None` if the snapshot carries no remote id.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    fn create_from_remote(&self, snapshot: &Self::Row) -> SyncResult<Option<Self::Row>> {
        match snapshot.remote_id() {
            Some(remote_id) => Ok(Some(self.store().insert_remote(snapshot, remote_id)?)),
            None => Ok(None),
        }
    }

    /// Overwrites an existing row with a server record.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    fn update_from_remote(
        &self,
        local_id: LocalId,
        snapshot: &Self::Row,
    ) -> SyncResult<Option<Self::Row>> {
        Ok(self.store().apply_remote(local_id, snapshot)?)
    }

    /// Soft-deletes a row because the server deleted it.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    fn delete_local(&self, local_id: LocalId) -> SyncResult<bool> {
        Ok(self.store().soft_delete::<Self::Row>(local_id)?)
    }

    /// Links rows whose parent was not known locally when they were pulled.
    ///
    /// Returns the number of rows linked.
    ///
    /// # Errors
    ///
    /// Returns a store error if a write fails.
    fn resolve_references(&self) -> SyncResult<usize> {
        Ok(0)
    }
}

/// Type-erased view of an adapter held by the engine registry.
pub(crate) trait RegisteredModel: Send + Sync {
    fn entity_name(&self) -> &str;

    fn push(&self, ctx: &SyncContext<'_>) -> SyncResult<Vec<SyncItemResult>>;

    fn pull(&self, ctx: &SyncContext<'_>) -> SyncResult<Vec<SyncItemResult>>;

    fn resolve_references(&self) -> SyncResult<usize>;
}

impl<A: ModelAdapter> RegisteredModel for A {
    fn entity_name(&self) -> &str {
        ModelAdapter::entity_name(self)
    }

    fn push(&self, ctx: &SyncContext<'_>) -> SyncResult<Vec<SyncItemResult>> {
        push_model(self, ctx)
    }

    fn pull(&self, ctx: &SyncContext<'_>) -> SyncResult<Vec<SyncItemResult>> {
        pull_model(self, ctx)
    }

    fn resolve_references(&self) -> SyncResult<usize> {
        ModelAdapter::resolve_references(self)
    }
}
