//! Property adapter. Properties are read-only on the device.

use super::snapshot_meta;
use crate::adapter::ModelAdapter;
use crate::config::{AdapterConfig, RetryConfig};
use crate::error::{SyncError, SyncResult};
use renoscope_core::{EntityKind, LocalStore, Property, PropertyStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Server representation of a property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyWire {
    /// Remote id.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Lifecycle status.
    pub status: PropertyStatus,
    /// Renovation phase label.
    pub phase: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// Mirrors the server's property collection into the local store.
///
/// Pushing is refused: the device never has pending properties to send, and
/// [`ModelAdapter::to_wire`] fails with [`SyncError::ReadOnlyEntity`].
#[derive(Debug, Clone)]
pub struct PropertyAdapter {
    store: Arc<LocalStore>,
    config: AdapterConfig,
}

impl PropertyAdapter {
    /// Registered name.
    pub const ENTITY_NAME: &'static str = "properties";

    /// Collection endpoint.
    pub const ENDPOINT: &'static str = "/api/properties";

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

impl ModelAdapter for PropertyAdapter {
    type Row = Property;
    type Wire = PropertyWire;

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn store(&self) -> &LocalStore {
        &self.store
    }

    fn to_wire(&self, _row: &Property) -> SyncResult<PropertyWire> {
        Err(SyncError::ReadOnlyEntity(EntityKind::Property))
    }

    fn from_wire(&self, wire: &PropertyWire) -> SyncResult<Property> {
        Ok(Property {
            meta: snapshot_meta(wire.id.as_ref(), wire.is_deleted),
            name: wire.name.clone(),
            address: wire.address.clone(),
            city: wire.city.clone(),
            status: wire.status,
            phase: wire.phase.clone(),
        })
    }

    fn get_pending(&self) -> Vec<Property> {
        Vec::new()
    }

    fn get_pending_deletions(&self) -> Vec<Property> {
        Vec::new()
    }
}
