//! Photos and other media attached to scope items.

use crate::record::Syncable;
use crate::store::Tables;
use crate::table::Table;
use crate::types::{EntityKind, LocalId, SyncMeta};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A media file captured in the field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Media {
    /// Sync metadata.
    pub meta: SyncMeta,
    /// Local id of the scope item this media documents.
    pub scope_item_id: Option<LocalId>,
    /// Remote id of the scope item while it is not yet known locally.
    pub scope_item_ref: Option<String>,
    /// Location of the file (device path or uploaded URL).
    pub uri: String,
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Optional caption.
    pub caption: Option<String>,
}

impl Media {
    /// Creates a media row attached to a scope item.
    pub fn new(
        scope_item_id: LocalId,
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            scope_item_id: Some(scope_item_id),
            uri: uri.into(),
            mime_type: mime_type.into(),
            size,
            ..Self::default()
        }
    }
}

impl Syncable for Media {
    const KIND: EntityKind = EntityKind::Media;

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }

    fn assign_fields(&mut self, snapshot: &Self) {
        self.scope_item_id = snapshot.scope_item_id;
        self.scope_item_ref.clone_from(&snapshot.scope_item_ref);
        self.uri.clone_from(&snapshot.uri);
        self.mime_type.clone_from(&snapshot.mime_type);
        self.size = snapshot.size;
        self.caption.clone_from(&snapshot.caption);
    }

    fn table(tables: &Tables) -> &RwLock<Table<Self>> {
        tables.media()
    }

    fn unresolved_reference(&self) -> Option<&str> {
        match self.scope_item_id {
            Some(_) => None,
            None => self.scope_item_ref.as_deref(),
        }
    }

    fn link_reference(&mut self, parent: LocalId) {
        self.scope_item_id = Some(parent);
        self.scope_item_ref = None;
    }

    fn inherit_reference(&mut self, local: &Self) {
        if self.scope_item_id.is_none() && self.scope_item_ref.is_none() {
            self.scope_item_id = local.scope_item_id;
            self.scope_item_ref.clone_from(&local.scope_item_ref);
        }
    }
}
