//! Media adapter.

use super::{parent_remote_id, resolve_parent, snapshot_meta};
use crate::adapter::ModelAdapter;
use crate::config::{AdapterConfig, RetryConfig};
use crate::error::SyncResult;
use renoscope_core::{LocalStore, Media, ScopeItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Server representation of a media record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaWire {
    /// Remote id.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Remote id of the scope item the media documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_item: Option<String>,
    /// File location.
    pub uri: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Caption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// Syncs media metadata. File upload itself happens elsewhere.
#[derive(Debug, Clone)]
pub struct MediaAdapter {
    store: Arc<LocalStore>,
    config: AdapterConfig,
}

impl MediaAdapter {
    /// Registered name.
    pub const ENTITY_NAME: &'static str = "media";

    /// Collection endpoint.
    pub const ENDPOINT: &'static str = "/api/media";

    /// Creates the adapter with the default configuration.
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            store,
            config: AdapterConfig::new(Self::ENTITY_NAME, Self::ENDPOINT),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }
}

impl ModelAdapter for MediaAdapter {
    type Row = Media;
    type Wire = MediaWire;

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn store(&self) -> &LocalStore {
        &self.store
    }

    fn to_wire(&self, row: &Media) -> SyncResult<MediaWire> {
        Ok(MediaWire {
            id: row.meta.remote_id.clone(),
            scope_item: parent_remote_id::<ScopeItem>(
                &self.store,
                row.scope_item_id,
                row.scope_item_ref.as_deref(),
            ),
            uri: row.uri.clone(),
            mime_type: row.mime_type.clone(),
            size: row.size,
            caption: row.caption.clone(),
            is_deleted: row.meta.is_deleted,
        })
    }

    fn from_wire(&self, wire: &MediaWire) -> SyncResult<Media> {
        let (scope_item_id, scope_item_ref) =
            resolve_parent::<ScopeItem>(&self.store, wire.scope_item.as_deref());
        Ok(Media {
            meta: snapshot_meta(wire.id.as_ref(), wire.is_deleted),
            scope_item_id,
            scope_item_ref,
            uri: wire.uri.clone(),
            mime_type: wire.mime_type.clone(),
            size: wire.size,
            caption: wire.caption.clone(),
        })
    }

    fn resolve_references(&self) -> SyncResult<usize> {
        Ok(self.store.resolve_references::<Media, ScopeItem>()?)
    }
}
