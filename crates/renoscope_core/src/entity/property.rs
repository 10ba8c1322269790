//! Property records.

use crate::record::Syncable;
use crate::store::Tables;
use crate::table::Table;
use crate::types::{EntityKind, SyncMeta};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Lifecycle of a renovation property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    /// Open for scoping.
    #[default]
    Active,
    /// Temporarily paused.
    OnHold,
    /// Scoping finished.
    Completed,
    /// No longer shown in the field app.
    Archived,
}

/// A property being scoped.
///
/// Properties are sourced by the back office and only mirrored locally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Property {
    /// Sync metadata.
    pub meta: SyncMeta,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Lifecycle status.
    pub status: PropertyStatus,
    /// Renovation phase label (e.g. "pre-acquisition").
    pub phase: String,
}

impl Property {
    /// Creates a property with the given name and address.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    /// Sets the city.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Sets the renovation phase.
    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }
}

impl Syncable for Property {
    const KIND: EntityKind = EntityKind::Property;

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }

    fn assign_fields(&mut self, snapshot: &Self) {
        self.name.clone_from(&snapshot.name);
        self.address.clone_from(&snapshot.address);
        self.city.clone_from(&snapshot.city);
        self.status = snapshot.status;
        self.phase.clone_from(&snapshot.phase);
    }

    fn table(tables: &Tables) -> &RwLock<Table<Self>> {
        tables.properties()
    }
}
