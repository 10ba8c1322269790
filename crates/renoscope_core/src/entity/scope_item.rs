//! Scope items: one line of renovation work recorded in a room.

use crate::record::Syncable;
use crate::store::Tables;
use crate::table::Table;
use crate::types::{EntityKind, LocalId, SyncMeta};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Estimated difficulty of a scope item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    /// Routine work.
    Low,
    /// Needs a specialist or coordination.
    #[default]
    Medium,
    /// Structural or otherwise risky work.
    High,
}

/// How likely the work is to require a permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitLikelihood {
    /// No permit expected.
    #[default]
    Unlikely,
    /// Depends on the jurisdiction.
    Possible,
    /// Usually needs one.
    Likely,
    /// Always needs one.
    Required,
}

/// A unit of scoped work inside a property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeItem {
    /// Sync metadata.
    pub meta: SyncMeta,
    /// Local id of the owning property.
    pub property_id: Option<LocalId>,
    /// Remote id of the owning property while it is not yet known locally.
    pub property_ref: Option<String>,
    /// Room the work belongs to (e.g. "Kitchen").
    pub room_name: String,
    /// Catalog area (e.g. "Flooring").
    pub component_area: String,
    /// Catalog component (e.g. "Hardwood refinish").
    pub component: String,
    /// Quantity in `unit`.
    pub quantity: f64,
    /// Unit of measure (e.g. "sqft").
    pub unit: String,
    /// Estimated difficulty.
    pub complexity: Complexity,
    /// Permit expectation.
    pub permit_likelihood: PermitLikelihood,
    /// Free-form notes.
    pub notes: String,
}

impl ScopeItem {
    /// Creates a scope item for a property.
    pub fn new(
        property_id: LocalId,
        room_name: impl Into<String>,
        component_area: impl Into<String>,
        quantity: f64,
    ) -> Self {
        Self {
            property_id: Some(property_id),
            room_name: room_name.into(),
            component_area: component_area.into(),
            quantity,
            ..Self::default()
        }
    }

    /// Sets the catalog component and unit.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>, unit: impl Into<String>) -> Self {
        self.component = component.into();
        self.unit = unit.into();
        self
    }

    /// Sets complexity and permit likelihood.
    #[must_use]
    pub fn with_assessment(mut self, complexity: Complexity, permit: PermitLikelihood) -> Self {
        self.complexity = complexity;
        self.permit_likelihood = permit;
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl Syncable for ScopeItem {
    const KIND: EntityKind = EntityKind::ScopeItem;

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }

    fn assign_fields(&mut self, snapshot: &Self) {
        self.property_id = snapshot.property_id;
        self.property_ref.clone_from(&snapshot.property_ref);
        self.room_name.clone_from(&snapshot.room_name);
        self.component_area.clone_from(&snapshot.component_area);
        self.component.clone_from(&snapshot.component);
        self.quantity = snapshot.quantity;
        self.unit.clone_from(&snapshot.unit);
        self.complexity = snapshot.complexity;
        self.permit_likelihood = snapshot.permit_likelihood;
        self.notes.clone_from(&snapshot.notes);
    }

    fn table(tables: &Tables) -> &RwLock<Table<Self>> {
        tables.scope_items()
    }

    fn unresolved_reference(&self) -> Option<&str> {
        match self.property_id {
            Some(_) => None,
            None => self.property_ref.as_deref(),
        }
    }

    fn link_reference(&mut self, parent: LocalId) {
        self.property_id = Some(parent);
        self.property_ref = None;
    }

    fn inherit_reference(&mut self, local: &Self) {
        if self.property_id.is_none() && self.property_ref.is_none() {
            self.property_id = local.property_id;
            self.property_ref.clone_from(&local.property_ref);
        }
    }
}
