//! Core type definitions shared by every table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-local row identifier.
///
/// Assigned by the store on insert and never transmitted to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(u64);

impl LocalId {
    /// Creates a local id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LocalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Per-row synchronization status.
///
/// Rows move `Pending → Syncing → {Synced | Failed}`. A `Failed` row is
/// picked up again by the next push exactly like a `Pending` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Local change not yet pushed.
    #[default]
    Pending,
    /// Push in flight.
    Syncing,
    /// Local and remote copies agree.
    Synced,
    /// The last push attempt failed.
    Failed,
}

impl SyncStatus {
    /// All statuses, in state machine order.
    pub const ALL: [SyncStatus; 4] = [
        SyncStatus::Pending,
        SyncStatus::Syncing,
        SyncStatus::Synced,
        SyncStatus::Failed,
    ];

    /// Returns true if the row must be included in the next push.
    #[must_use]
    pub fn needs_push(self) -> bool {
        matches!(self, SyncStatus::Pending | SyncStatus::Failed)
    }

    /// Returns the lowercase name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The synchronizable entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Property records (mirrored from the server).
    Property,
    /// Scope items recorded in the field.
    ScopeItem,
    /// Photos and other media attached to scope items.
    Media,
}

impl EntityKind {
    /// All entity kinds, in dependency order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Property, EntityKind::ScopeItem, EntityKind::Media];

    /// Returns the table name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Property => "property",
            EntityKind::ScopeItem => "scope_item",
            EntityKind::Media => "media",
        }
    }

    /// Converts a journal tag byte to an entity kind.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Property),
            2 => Some(Self::ScopeItem),
            3 => Some(Self::Media),
            _ => None,
        }
    }

    /// Returns the journal tag byte.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            EntityKind::Property => 1,
            EntityKind::ScopeItem => 2,
            EntityKind::Media => 3,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync-control columns carried by every row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncMeta {
    /// Process-local primary key.
    pub local_id: LocalId,
    /// Server-assigned identifier, present once the row has been created remotely.
    pub remote_id: Option<String>,
    /// Current position in the sync state machine.
    pub sync_status: SyncStatus,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Milliseconds since epoch when the row was inserted.
    pub created_at: u64,
    /// Milliseconds since epoch of the last mutation or sync write.
    pub updated_at: u64,
}

impl SyncMeta {
    /// Metadata for a row materialized from a server snapshot.
    #[must_use]
    pub fn remote(remote_id: impl Into<String>, is_deleted: bool) -> Self {
        Self {
            remote_id: Some(remote_id.into()),
            is_deleted,
            sync_status: SyncStatus::Synced,
            ..Self::default()
        }
    }

    /// Returns true if the row has never been created on the server.
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.remote_id.is_none()
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_push_covers_pending_and_failed() {
        assert!(SyncStatus::Pending.needs_push());
        assert!(SyncStatus::Failed.needs_push());
        assert!(!SyncStatus::Syncing.needs_push());
        assert!(!SyncStatus::Synced.needs_push());
    }

    #[test]
    fn entity_tags_are_stable() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EntityKind::from_tag(0), None);
        assert_eq!(EntityKind::from_tag(9), None);
    }

    #[test]
    fn remote_meta_is_synced() {
        let meta = SyncMeta::remote("P-1", false);
        assert_eq!(meta.remote_id.as_deref(), Some("P-1"));
        assert_eq!(meta.sync_status, SyncStatus::Synced);
        assert!(!meta.is_local_only());
        assert!(SyncMeta::default().is_local_only());
    }
}
