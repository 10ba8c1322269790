//! In-memory table of one entity type.
//!
//! A table owns its rows in local-id order and keeps a remote-id index so that
//! pull reconciliation can find the local copy of a server record without a
//! full scan. Tables do no I/O; [`crate::LocalStore`] journals every change
//! before applying it here.

use crate::record::Syncable;
use crate::types::{LocalId, SyncStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Row counts of a table broken down by sync state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Number of rows, including soft-deleted ones.
    pub total: usize,
    /// Rows in `Pending`.
    pub pending: usize,
    /// Rows in `Syncing`.
    pub syncing: usize,
    /// Rows in `Synced`.
    pub synced: usize,
    /// Rows in `Failed`.
    pub failed: usize,
    /// Soft-deleted rows.
    pub deleted: usize,
    /// Rows that have never been created remotely.
    pub local_only: usize,
}

/// Rows of a single entity type.
#[derive(Debug)]
pub struct Table<R> {
    rows: BTreeMap<LocalId, R>,
    by_remote: HashMap<String, LocalId>,
    next_id: u64,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            by_remote: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<R: Syncable> Table<R> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows, including soft-deleted ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the local id the next insert will receive.
    #[must_use]
    pub fn next_local_id(&self) -> LocalId {
        LocalId::new(self.next_id)
    }

    /// Reserves the next local id.
    pub fn allocate_id(&mut self) -> LocalId {
        let id = LocalId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Marks every id up to `local_id` as used, so none is handed out again.
    pub fn reserve_through(&mut self, local_id: LocalId) {
        if local_id.as_u64() >= self.next_id {
            self.next_id = local_id.as_u64() + 1;
        }
    }

    /// Returns the last allocated id if its row no longer exists.
    ///
    /// A compacted journal holds no record of such an id, so it has to be
    /// written out explicitly to survive a reopen.
    #[must_use]
    pub fn retired_high_water(&self) -> Option<LocalId> {
        let last = self.next_id.checked_sub(1).filter(|id| *id > 0)?;
        let last = LocalId::new(last);
        (!self.rows.contains_key(&last)).then_some(last)
    }

    /// Gets a row by local id.
    #[must_use]
    pub fn get(&self, local_id: LocalId) -> Option<&R> {
        self.rows.get(&local_id)
    }

    /// Gets a row by remote id, deleted rows included.
    #[must_use]
    pub fn find_by_remote_id(&self, remote_id: &str) -> Option<&R> {
        self.by_remote
            .get(remote_id)
            .and_then(|local_id| self.rows.get(local_id))
    }

    /// Iterates over all rows in local-id order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    /// Rows awaiting a create or update push.
    #[must_use]
    pub fn pending(&self) -> Vec<R> {
        self.rows
            .values()
            .filter(|row| !row.is_deleted() && row.sync_status().needs_push())
            .cloned()
            .collect()
    }

    /// Soft-deleted rows whose deletion has not been propagated yet.
    #[must_use]
    pub fn pending_deletions(&self) -> Vec<R> {
        self.rows
            .values()
            .filter(|row| row.is_deleted() && row.sync_status().needs_push())
            .cloned()
            .collect()
    }

    /// All rows, optionally including soft-deleted ones.
    #[must_use]
    pub fn all(&self, include_deleted: bool) -> Vec<R> {
        self.rows
            .values()
            .filter(|row| include_deleted || !row.is_deleted())
            .cloned()
            .collect()
    }

    /// Inserts or replaces a row under its own local id.
    ///
    /// Keeps the remote-id index and the id allocator consistent, so this is
    /// also the journal replay entry point.
    pub fn put(&mut self, row: R) {
        let local_id = row.local_id();
        if let Some(previous) = self.rows.get(&local_id) {
            if let Some(old_remote) = previous.remote_id() {
                if row.remote_id() != Some(old_remote) {
                    self.by_remote.remove(old_remote);
                }
            }
        }
        if let Some(remote_id) = row.remote_id() {
            self.by_remote.insert(remote_id.to_string(), local_id);
        }
        self.reserve_through(local_id);
        self.rows.insert(local_id, row);
    }

    /// Physically removes a row.
    pub fn remove(&mut self, local_id: LocalId) -> Option<R> {
        let row = self.rows.remove(&local_id)?;
        if let Some(remote_id) = row.remote_id() {
            if self.by_remote.get(remote_id) == Some(&local_id) {
                self.by_remote.remove(remote_id);
            }
        }
        Some(row)
    }

    /// Local ids of soft-deleted rows whose deletion has been propagated.
    #[must_use]
    pub fn settled_deletions(&self) -> Vec<LocalId> {
        self.rows
            .values()
            .filter(|row| row.is_deleted() && row.sync_status() == SyncStatus::Synced)
            .map(Syncable::local_id)
            .collect()
    }

    /// Counts rows per sync state.
    #[must_use]
    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats {
            total: self.rows.len(),
            ..TableStats::default()
        };
        for row in self.rows.values() {
            match row.sync_status() {
                SyncStatus::Pending => stats.pending += 1,
                SyncStatus::Syncing => stats.syncing += 1,
                SyncStatus::Synced => stats.synced += 1,
                SyncStatus::Failed => stats.failed += 1,
            }
            if row.is_deleted() {
                stats.deleted += 1;
            }
            if row.meta().is_local_only() {
                stats.local_only += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Property;
    use crate::types::SyncMeta;

    fn property(id: u64, remote: Option<&str>, status: SyncStatus, deleted: bool) -> Property {
        Property {
            meta: SyncMeta {
                local_id: LocalId::new(id),
                remote_id: remote.map(str::to_string),
                sync_status: status,
                is_deleted: deleted,
                ..SyncMeta::default()
            },
            ..Property::new(format!("p{id}"), "1 Main St")
        }
    }

    #[test]
    fn put_tracks_next_id() {
        let mut table = Table::new();
        assert_eq!(table.next_local_id(), LocalId::new(1));

        table.put(property(5, None, SyncStatus::Pending, false));
        assert_eq!(table.next_local_id(), LocalId::new(6));

        table.put(property(2, None, SyncStatus::Pending, false));
        assert_eq!(table.next_local_id(), LocalId::new(6));
        assert_eq!(table.allocate_id(), LocalId::new(6));
        assert_eq!(table.next_local_id(), LocalId::new(7));
    }

    #[test]
    fn retired_ids_stay_reserved() {
        let mut table: Table<Property> = Table::new();
        assert_eq!(table.retired_high_water(), None);

        table.put(property(1, None, SyncStatus::Pending, false));
        table.put(property(2, None, SyncStatus::Pending, false));
        assert_eq!(table.retired_high_water(), None);

        table.remove(LocalId::new(2));
        assert_eq!(table.retired_high_water(), Some(LocalId::new(2)));

        let mut replayed: Table<Property> = Table::new();
        replayed.put(property(1, None, SyncStatus::Pending, false));
        replayed.reserve_through(LocalId::new(2));
        assert_eq!(replayed.allocate_id(), LocalId::new(3));
    }

    #[test]
    fn remote_index_follows_updates() {
        let mut table = Table::new();
        table.put(property(1, Some("P-1"), SyncStatus::Synced, false));
        assert_eq!(
            table.find_by_remote_id("P-1").map(Syncable::local_id),
            Some(LocalId::new(1))
        );

        // Remote id reassigned
        table.put(property(1, Some("P-2"), SyncStatus::Synced, false));
        assert!(table.find_by_remote_id("P-1").is_none());
        assert!(table.find_by_remote_id("P-2").is_some());

        table.remove(LocalId::new(1));
        assert!(table.find_by_remote_id("P-2").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn pending_sets_are_disjoint() {
        let mut table = Table::new();
        table.put(property(1, None, SyncStatus::Pending, false));
        table.put(property(2, Some("P-2"), SyncStatus::Failed, false));
        table.put(property(3, Some("P-3"), SyncStatus::Synced, false));
        table.put(property(4, Some("P-4"), SyncStatus::Pending, true));
        table.put(property(5, Some("P-5"), SyncStatus::Synced, true));

        let pending: Vec<_> = table.pending().iter().map(Syncable::local_id).collect();
        assert_eq!(pending, vec![LocalId::new(1), LocalId::new(2)]);

        let deletions: Vec<_> = table
            .pending_deletions()
            .iter()
            .map(Syncable::local_id)
            .collect();
        assert_eq!(deletions, vec![LocalId::new(4)]);

        assert_eq!(table.settled_deletions(), vec![LocalId::new(5)]);
        assert_eq!(table.all(false).len(), 3);
        assert_eq!(table.all(true).len(), 5);
    }

    #[test]
    fn stats_count_states() {
        let mut table = Table::new();
        table.put(property(1, None, SyncStatus::Pending, false));
        table.put(property(2, Some("P-2"), SyncStatus::Synced, true));
        table.put(property(3, Some("P-3"), SyncStatus::Failed, false));

        let stats = table.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.synced, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.local_only, 1);
    }
}
