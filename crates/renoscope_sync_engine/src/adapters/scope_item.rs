//! Scope item adapter.

use super::{parent_remote_id, resolve_parent, snapshot_meta};
use crate::adapter::ModelAdapter;
use crate::config::{AdapterConfig, RetryConfig};
use crate::error::SyncResult;
use renoscope_core::{Complexity, LocalStore, PermitLikelihood, Property, ScopeItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Server representation of a scope item.
///
/// `property` holds the remote id of the owning property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeItemWire {
    /// Remote id.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Remote id of the owning property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Room name.
    pub room_name: String,
    /// Catalog area.
    pub component_area: String,
    /// Catalog component.
    pub component: String,
    /// Quantity.
    pub quantity: f64,
    /// Unit of measure.
    pub unit: String,
    /// Estimated difficulty.
    pub complexity: Complexity,
    /// Permit expectation.
    pub permit_likelihood: PermitLikelihood,
    /// Notes.
    pub notes: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// Pushes scope items recorded in the field and pulls the server's copy.
#[derive(Debug, Clone)]
pub struct ScopeItemAdapter {
    store: Arc<LocalStore>,
    config: AdapterConfig,
}

impl ScopeItemAdapter {
    /// Registered name.
    pub const ENTITY_NAME: &'static str = "scopeItems";

    /// Collection endpoint.
    pub const ENDPOINT: &'static str = "/api/scope-items";

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

impl ModelAdapter for ScopeItemAdapter {
    type Row = ScopeItem;
    type Wire = ScopeItemWire;

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn store(&self) -> &LocalStore {
        &self.store
    }

    fn to_wire(&self, row: &ScopeItem) -> SyncResult<ScopeItemWire> {
        Ok(ScopeItemWire {
            id: row.meta.remote_id.clone(),
            property: parent_remote_id::<Property>(
                &self.store,
                row.property_id,
                row.property_ref.as_deref(),
            ),
            room_name: row.room_name.clone(),
            component_area: row.component_area.clone(),
            component: row.component.clone(),
            quantity: row.quantity,
            unit: row.unit.clone(),
            complexity: row.complexity,
            permit_likelihood: row.permit_likelihood,
            notes: row.notes.clone(),
            is_deleted: row.meta.is_deleted,
        })
    }

    fn from_wire(&self, wire: &ScopeItemWire) -> SyncResult<ScopeItem> {
        let (property_id, property_ref) =
            resolve_parent::<Property>(&self.store, wire.property.as_deref());
        Ok(ScopeItem {
            meta: snapshot_meta(wire.id.as_ref(), wire.is_deleted),
            property_id,
            property_ref,
            room_name: wire.room_name.clone(),
            component_area: wire.component_area.clone(),
            component: wire.component.clone(),
            quantity: wire.quantity,
            unit: wire.unit.clone(),
            complexity: wire.complexity,
            permit_likelihood: wire.permit_likelihood,
            notes: wire.notes.clone(),
        })
    }

    fn resolve_references(&self) -> SyncResult<usize> {
        Ok(self.store.resolve_references::<ScopeItem, Property>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renoscope_core::{LocalId, SyncMeta, Syncable};
    use serde_json::json;

    fn adapter() -> ScopeItemAdapter {
        ScopeItemAdapter::new(Arc::new(LocalStore::open_in_memory().unwrap()))
    }

    #[test]
    fn to_wire_translates_the_property_link() {
        let adapter = adapter();
        let property = adapter
            .store()
            .insert_remote(
                &Property {
                    meta: SyncMeta::remote("P-99", false),
                    ..Property::new("Elm House", "12 Elm St")
                },
                "P-99",
            )
            .unwrap();
        let item = adapter
            .store()
            .insert(ScopeItem::new(property.local_id(), "Kitchen", "Flooring", 120.0))
            .unwrap();

        let body = serde_json::to_value(adapter.to_wire(&item).unwrap()).unwrap();
        assert_eq!(body["property"], json!("P-99"));
        assert_eq!(body["roomName"], json!("Kitchen"));
        assert_eq!(body["componentArea"], json!("Flooring"));
        assert_eq!(body["isDeleted"], json!(false));
        assert!(body.get("_id").is_none());
    }

    #[test]
    fn unsynced_property_is_left_out() {
        let adapter = adapter();
        let property = adapter
            .store()
            .insert(Property::new("Local only", "1 St"))
            .unwrap();
        let item = ScopeItem::new(property.local_id(), "Bath", "Tile", 40.0);

        let body = serde_json::to_value(adapter.to_wire(&item).unwrap()).unwrap();
        assert!(body.get("property").is_none());

        let dangling = ScopeItem::new(LocalId::new(404), "Bath", "Tile", 40.0);
        let body = serde_json::to_value(adapter.to_wire(&dangling).unwrap()).unwrap();
        assert!(body.get("property").is_none());
    }

    #[test]
    fn deferred_reference_is_sent_as_is() {
        let adapter = adapter();
        let item = ScopeItem {
            property_ref: Some("P-7".into()),
            ..ScopeItem::default()
        };
        let wire = adapter.to_wire(&item).unwrap();
        assert_eq!(wire.property.as_deref(), Some("P-7"));
    }

    #[test]
    fn from_wire_resolves_known_parents() {
        let adapter = adapter();
        let property = adapter
            .store()
            .insert_remote(
                &Property {
                    meta: SyncMeta::remote("P-1", false),
                    ..Property::default()
                },
                "P-1",
            )
            .unwrap();

        let wire = ScopeItemWire {
            id: Some("S-1".into()),
            property: Some("P-1".into()),
            room_name: "Kitchen".into(),
            ..ScopeItemWire::default()
        };
        let row = adapter.from_wire(&wire).unwrap();
        assert_eq!(row.property_id, Some(property.local_id()));
        assert!(row.property_ref.is_none());
        assert_eq!(row.remote_id(), Some("S-1"));

        let orphan = ScopeItemWire {
            id: Some("S-2".into()),
            property: Some("P-404".into()),
            ..ScopeItemWire::default()
        };
        let row = adapter.from_wire(&orphan).unwrap();
        assert!(row.property_id.is_none());
        assert_eq!(row.unresolved_reference(), Some("P-404"));
    }
}
