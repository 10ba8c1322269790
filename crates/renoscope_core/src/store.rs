//! The local store: one table per entity plus the change journal.

use crate::config::StoreConfig;
use crate::dir::StoreDir;
use crate::entity::{Media, Property, ScopeItem};
use crate::error::CoreResult;
use crate::journal::{FileJournal, Journal, JournalBackend, JournalEntry, MemoryJournal};
use crate::record::Syncable;
use crate::table::{Table, TableStats};
use crate::types::{now_millis, EntityKind, LocalId, SyncStatus};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// The per-entity tables of a store.
///
/// Reached through [`Syncable::table`]; every write goes through
/// [`LocalStore`] so that it is journaled.
#[derive(Debug, Default)]
pub struct Tables {
    properties: RwLock<Table<Property>>,
    scope_items: RwLock<Table<ScopeItem>>,
    media: RwLock<Table<Media>>,
}

impl Tables {
    /// The property table.
    pub fn properties(&self) -> &RwLock<Table<Property>> {
        &self.properties
    }

    /// The scope item table.
    pub fn scope_items(&self) -> &RwLock<Table<ScopeItem>> {
        &self.scope_items
    }

    /// The media table.
    pub fn media(&self) -> &RwLock<Table<Media>> {
        &self.media
    }
}

/// Snapshot of store contents.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Per-table counts.
    pub tables: BTreeMap<EntityKind, TableStats>,
    /// Journal size in bytes.
    pub journal_size: u64,
    /// Number of journal records.
    pub journal_records: usize,
}

/// Outcome of a compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompactStats {
    /// Journal records before compaction.
    pub records_before: usize,
    /// Journal records after compaction.
    pub records_after: usize,
    /// Journal bytes before compaction.
    pub bytes_before: u64,
    /// Journal bytes after compaction.
    pub bytes_after: u64,
    /// Rows physically removed because their deletion had synced.
    pub purged: usize,
}

/// Durable row storage for every synchronizable entity.
///
/// Writes are journaled before they are applied to the in-memory table, and
/// each write is independent: no transaction spans several rows.
///
/// # Example
///
/// ```rust
/// use renoscope_core::{LocalStore, Property, ScopeItem, SyncStatus, Syncable};
///
/// let store = LocalStore::open_in_memory().unwrap();
/// let property = store.insert(Property::new("Elm House", "12 Elm St")).unwrap();
/// let item = store
///     .insert(ScopeItem::new(property.local_id(), "Kitchen", "Flooring", 120.0))
///     .unwrap();
/// assert_eq!(item.sync_status(), SyncStatus::Pending);
/// assert_eq!(store.get_pending::<ScopeItem>().len(), 1);
/// ```
pub struct LocalStore {
    tables: Tables,
    journal: Mutex<Journal>,
    config: StoreConfig,
    dir: Option<StoreDir>,
}

impl LocalStore {
    /// Opens (or creates) a store directory and replays its journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be opened or locked, or the
    /// journal is corrupted.
    pub fn open(path: &Path, config: StoreConfig) -> CoreResult<Self> {
        let dir = StoreDir::open(path, config.create_if_missing)?;
        let backend = FileJournal::open(&dir.journal_path())?;
        let mut store = Self::open_with_journal(Box::new(backend), config)?;
        store.dir = Some(dir);
        Ok(store)
    }

    /// Opens an empty store kept entirely in memory.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other constructors.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_journal(
            Box::new(MemoryJournal::new()),
            StoreConfig::default().sync_on_write(false),
        )
    }

    /// Opens a store on an arbitrary journal backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be replayed.
    pub fn open_with_journal(
        backend: Box<dyn JournalBackend>,
        config: StoreConfig,
    ) -> CoreResult<Self> {
        let mut journal = Journal::new(backend, config.sync_on_write);
        let entries = journal.recover()?;

        let store = Self {
            tables: Tables::default(),
            journal: Mutex::new(journal),
            config,
            dir: None,
        };

        let replayed = entries.len();
        for entry in &entries {
            store.replay(entry)?;
        }

        let interrupted = store.fail_interrupted::<Property>()?
            + store.fail_interrupted::<ScopeItem>()?
            + store.fail_interrupted::<Media>()?;
        if interrupted > 0 {
            tracing::warn!(interrupted, "rows left mid-push marked failed");
        }
        tracing::debug!(replayed, "local store opened");

        Ok(store)
    }

    fn replay(&self, entry: &JournalEntry) -> CoreResult<()> {
        match entry.entity() {
            EntityKind::Property => self.replay_into::<Property>(entry),
            EntityKind::ScopeItem => self.replay_into::<ScopeItem>(entry),
            EntityKind::Media => self.replay_into::<Media>(entry),
        }
    }

    fn replay_into<R: Syncable>(&self, entry: &JournalEntry) -> CoreResult<()> {
        let mut table = R::table(&self.tables).write();
        match entry {
            JournalEntry::Upsert { .. } => table.put(entry.decode_row::<R>()?),
            JournalEntry::Remove { local_id, .. } => {
                table.remove(*local_id);
                table.reserve_through(*local_id);
            }
        }
        Ok(())
    }

    /// Moves rows stuck in `Syncing` (the process died mid-push) to `Failed`
    /// so the next push picks them up again.
    fn fail_interrupted<R: Syncable>(&self) -> CoreResult<usize> {
        let mut table = R::table(&self.tables).write();
        let stuck: Vec<R> = table
            .iter()
            .filter(|row| row.sync_status() == SyncStatus::Syncing)
            .cloned()
            .collect();
        let count = stuck.len();
        for mut row in stuck {
            row.meta_mut().sync_status = SyncStatus::Failed;
            self.commit(&mut table, row)?;
        }
        Ok(count)
    }

    /// Journals `row` and applies it to `table`.
    fn commit<R: Syncable>(&self, table: &mut Table<R>, row: R) -> CoreResult<R> {
        self.journal.lock().append(&JournalEntry::upsert(&row)?)?;
        table.put(row.clone());
        Ok(row)
    }

    /// Returns the store directory, if the store is file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(StoreDir::path)
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the tables for read access.
    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Gets a row by local id.
    #[must_use]
    pub fn get<R: Syncable>(&self, local_id: LocalId) -> Option<R> {
        R::table(&self.tables).read().get(local_id).cloned()
    }

    /// Gets a row by remote id, soft-deleted rows included.
    #[must_use]
    pub fn find_by_remote_id<R: Syncable>(&self, remote_id: &str) -> Option<R> {
        R::table(&self.tables)
            .read()
            .find_by_remote_id(remote_id)
            .cloned()
    }

    /// Rows awaiting a create or update push (`Pending` or `Failed`, not deleted).
    #[must_use]
    pub fn get_pending<R: Syncable>(&self) -> Vec<R> {
        R::table(&self.tables).read().pending()
    }

    /// Soft-deleted rows whose deletion still has to be propagated.
    #[must_use]
    pub fn get_pending_deletions<R: Syncable>(&self) -> Vec<R> {
        R::table(&self.tables).read().pending_deletions()
    }

    /// All rows in local-id order.
    #[must_use]
    pub fn get_all<R: Syncable>(&self, include_deleted: bool) -> Vec<R> {
        R::table(&self.tables).read().all(include_deleted)
    }

    /// Live scope items of a property.
    #[must_use]
    pub fn scope_items_for_property(&self, property_id: LocalId) -> Vec<ScopeItem> {
        self.tables
            .scope_items
            .read()
            .iter()
            .filter(|item| !item.is_deleted() && item.property_id == Some(property_id))
            .cloned()
            .collect()
    }

    /// Live media of a scope item.
    #[must_use]
    pub fn media_for_scope_item(&self, scope_item_id: LocalId) -> Vec<Media> {
        self.tables
            .media
            .read()
            .iter()
            .filter(|media| !media.is_deleted() && media.scope_item_id == Some(scope_item_id))
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Local mutations
    // ------------------------------------------------------------------

    /// Inserts a row created on this device.
    ///
    /// The row gets a fresh local id, no remote id and `Pending` status.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn insert<R: Syncable>(&self, mut row: R) -> CoreResult<R> {
        let mut table = R::table(&self.tables).write();
        let now = now_millis();
        let meta = row.meta_mut();
        meta.local_id = table.allocate_id();
        meta.remote_id = None;
        meta.sync_status = SyncStatus::Pending;
        meta.is_deleted = false;
        meta.created_at = now;
        meta.updated_at = now;
        self.commit(&mut table, row)
    }

    /// Applies a local edit and marks the row `Pending`.
    ///
    /// The closure may change domain fields only; identity and remote id are
    /// restored after it runs. Returns `None` if the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn update<R, F>(&self, local_id: LocalId, edit: F) -> CoreResult<Option<R>>
    where
        R: Syncable,
        F: FnOnce(&mut R),
    {
        let mut table = R::table(&self.tables).write();
        let Some(current) = table.get(local_id) else {
            return Ok(None);
        };
        let original = current.meta().clone();
        let mut row = current.clone();
        edit(&mut row);

        let meta = row.meta_mut();
        meta.local_id = original.local_id;
        meta.remote_id = original.remote_id;
        meta.created_at = original.created_at;
        meta.is_deleted = original.is_deleted;
        meta.sync_status = SyncStatus::Pending;
        meta.updated_at = now_millis();
        self.commit(&mut table, row).map(Some)
    }

    /// Soft-deletes a row so that the deletion itself gets synced.
    ///
    /// Returns false if the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn soft_delete<R: Syncable>(&self, local_id: LocalId) -> CoreResult<bool> {
        let mut table = R::table(&self.tables).write();
        let Some(current) = table.get(local_id) else {
            return Ok(false);
        };
        let mut row = current.clone();
        let meta = row.meta_mut();
        meta.is_deleted = true;
        meta.sync_status = SyncStatus::Pending;
        meta.updated_at = now_millis();
        self.commit(&mut table, row)?;
        Ok(true)
    }

    /// Physically removes a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn purge<R: Syncable>(&self, local_id: LocalId) -> CoreResult<bool> {
        let mut table = R::table(&self.tables).write();
        if table.get(local_id).is_none() {
            return Ok(false);
        }
        self.journal
            .lock()
            .append(&JournalEntry::remove::<R>(local_id))?;
        table.remove(local_id);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Sync-side writes
    // ------------------------------------------------------------------

    /// Writes a sync state transition.
    ///
    /// `remote_id` replaces the stored remote id when given; `deleted`
    /// replaces the soft-delete flag when the server is authoritative about it.
    /// Returns false if the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn set_sync_state<R: Syncable>(
        &self,
        local_id: LocalId,
        status: SyncStatus,
        remote_id: Option<&str>,
        deleted: Option<bool>,
    ) -> CoreResult<bool> {
        let mut table = R::table(&self.tables).write();
        let Some(current) = table.get(local_id) else {
            return Ok(false);
        };
        let mut row = current.clone();
        let meta = row.meta_mut();
        meta.sync_status = status;
        if let Some(remote_id) = remote_id {
            meta.remote_id = Some(remote_id.to_string());
        }
        if let Some(deleted) = deleted {
            meta.is_deleted = deleted;
        }
        meta.updated_at = now_millis();
        self.commit(&mut table, row)?;
        Ok(true)
    }

    /// Materializes a server record as a new `Synced` row.
    ///
    /// If a row with the same remote id already exists it is updated in place
    /// instead, so a record is never mirrored twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn insert_remote<R: Syncable>(&self, snapshot: &R, remote_id: &str) -> CoreResult<R> {
        let mut table = R::table(&self.tables).write();
        let now = now_millis();

        let mut row = match table.find_by_remote_id(remote_id) {
            Some(existing) => {
                let mut row = existing.clone();
                row.assign_fields(snapshot);
                row
            }
            None => {
                let mut row = snapshot.clone();
                let meta = row.meta_mut();
                meta.local_id = table.allocate_id();
                meta.created_at = now;
                row
            }
        };

        let meta = row.meta_mut();
        meta.remote_id = Some(remote_id.to_string());
        meta.is_deleted = snapshot.is_deleted();
        meta.sync_status = SyncStatus::Synced;
        meta.updated_at = now;
        self.commit(&mut table, row)
    }

    /// Overwrites a row's domain fields with a server snapshot.
    ///
    /// The soft-delete flag follows the snapshot; the sync status is left for
    /// the caller to settle. Returns `None` if the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal write fails.
    pub fn apply_remote<R: Syncable>(&self, local_id: LocalId, snapshot: &R) -> CoreResult<Option<R>> {
        let mut table = R::table(&self.tables).write();
        let Some(current) = table.get(local_id) else {
            return Ok(None);
        };
        let mut row = current.clone();
        row.assign_fields(snapshot);
        let meta = row.meta_mut();
        if let Some(remote_id) = snapshot.remote_id() {
            meta.remote_id = Some(remote_id.to_string());
        }
        meta.is_deleted = snapshot.is_deleted();
        meta.updated_at = now_millis();
        self.commit(&mut table, row).map(Some)
    }

    /// Links rows of `R` whose parent (`P`) was unknown when they were pulled.
    ///
    /// Linking is bookkeeping only: the sync status of a linked row does not
    /// change. Returns the number of rows linked.
    ///
    /// # Errors
    ///
    /// Returns an error if a journal write fails.
    pub fn resolve_references<R: Syncable, P: Syncable>(&self) -> CoreResult<usize> {
        let unresolved: Vec<(LocalId, String)> = R::table(&self.tables)
            .read()
            .iter()
            .filter_map(|row| {
                row.unresolved_reference()
                    .map(|reference| (row.local_id(), reference.to_string()))
            })
            .collect();
        if unresolved.is_empty() {
            return Ok(0);
        }

        let parents: Vec<(LocalId, LocalId)> = {
            let parent_table = P::table(&self.tables).read();
            unresolved
                .iter()
                .filter_map(|(child, reference)| {
                    parent_table
                        .find_by_remote_id(reference)
                        .map(|parent| (*child, parent.local_id()))
                })
                .collect()
        };

        let mut table = R::table(&self.tables).write();
        let mut linked = 0;
        for (child, parent) in parents {
            let Some(current) = table.get(child) else {
                continue;
            };
            if current.unresolved_reference().is_none() {
                continue;
            }
            let mut row = current.clone();
            row.link_reference(parent);
            self.commit(&mut table, row)?;
            linked += 1;
        }

        if linked > 0 {
            tracing::debug!(entity = %R::KIND, linked, "resolved deferred references");
        }
        Ok(linked)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Physically removes every row whose deletion has been synced.
    ///
    /// # Errors
    ///
    /// Returns an error if a journal write fails.
    pub fn purge_settled_deletions(&self) -> CoreResult<usize> {
        Ok(self.purge_settled::<Property>()?
            + self.purge_settled::<ScopeItem>()?
            + self.purge_settled::<Media>()?)
    }

    fn purge_settled<R: Syncable>(&self) -> CoreResult<usize> {
        let settled = R::table(&self.tables).read().settled_deletions();
        let mut purged = 0;
        for local_id in settled {
            if self.purge::<R>(local_id)? {
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// Compacts the journal using the configured purge policy.
    ///
    /// # Errors
    ///
    /// Returns an error if purging or rewriting the journal fails.
    pub fn compact(&self) -> CoreResult<CompactStats> {
        self.compact_with(self.config.purge_on_compact)
    }

    /// Rewrites the journal as one record per row.
    ///
    /// # Errors
    ///
    /// Returns an error if purging or rewriting the journal fails.
    pub fn compact_with(&self, purge: bool) -> CoreResult<CompactStats> {
        let purged = if purge {
            self.purge_settled_deletions()?
        } else {
            0
        };

        let properties = self.tables.properties.read();
        let scope_items = self.tables.scope_items.read();
        let media = self.tables.media.read();

        let mut entries = Vec::with_capacity(properties.len() + scope_items.len() + media.len());
        compacted_entries(&properties, &mut entries)?;
        compacted_entries(&scope_items, &mut entries)?;
        compacted_entries(&media, &mut entries)?;

        let mut journal = self.journal.lock();
        let records_before = journal.record_count();
        let bytes_before = journal.size()?;
        journal.rewrite(&entries)?;

        let stats = CompactStats {
            records_before,
            records_after: journal.record_count(),
            bytes_before,
            bytes_after: journal.size()?,
            purged,
        };
        tracing::info!(
            records_before = stats.records_before,
            records_after = stats.records_after,
            purged = stats.purged,
            "journal compacted"
        );
        Ok(stats)
    }

    /// Forces journaled writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal sync fails.
    pub fn flush(&self) -> CoreResult<()> {
        self.journal.lock().sync()
    }

    /// Returns per-table counts and journal size.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal size cannot be read.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        let mut tables = BTreeMap::new();
        tables.insert(EntityKind::Property, self.tables.properties.read().stats());
        tables.insert(EntityKind::ScopeItem, self.tables.scope_items.read().stats());
        tables.insert(EntityKind::Media, self.tables.media.read().stats());

        let journal = self.journal.lock();
        Ok(StoreStats {
            tables,
            journal_size: journal.size()?,
            journal_records: journal.record_count(),
        })
    }
}

/// One upsert per row, then a removal record for the last allocated id if
/// that row is gone, so replay never hands the id out again.
fn compacted_entries<R: Syncable>(
    table: &Table<R>,
    entries: &mut Vec<JournalEntry>,
) -> CoreResult<()> {
    for row in table.iter() {
        entries.push(JournalEntry::upsert(row)?);
    }
    if let Some(retired) = table.retired_high_water() {
        entries.push(JournalEntry::remove::<R>(retired));
    }
    Ok(())
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("path", &self.path())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SyncMeta;

    fn store() -> LocalStore {
        LocalStore::open_in_memory().unwrap()
    }

    fn remote_property(remote_id: &str, name: &str) -> Property {
        Property {
            meta: SyncMeta::remote(remote_id, false),
            ..Property::new(name, "1 Remote Rd")
        }
    }

    #[test]
    fn insert_assigns_identity() {
        let store = store();
        let a = store.insert(Property::new("A", "1 A St")).unwrap();
        let b = store.insert(Property::new("B", "2 B St")).unwrap();

        assert_eq!(a.local_id(), LocalId::new(1));
        assert_eq!(b.local_id(), LocalId::new(2));
        assert_eq!(a.sync_status(), SyncStatus::Pending);
        assert!(a.remote_id().is_none());
        assert!(a.meta.updated_at > 0);
    }

    #[test]
    fn update_resets_pending_and_keeps_identity() {
        let store = store();
        let p = store.insert(Property::new("A", "1 A St")).unwrap();
        store
            .set_sync_state::<Property>(p.local_id(), SyncStatus::Synced, Some("P-1"), None)
            .unwrap();

        let updated = store
            .update::<Property, _>(p.local_id(), |row| {
                row.phase = "demo".into();
                row.meta.remote_id = None;
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.phase, "demo");
        assert_eq!(updated.remote_id(), Some("P-1"));
        assert_eq!(updated.sync_status(), SyncStatus::Pending);
        assert!(store
            .update::<Property, _>(LocalId::new(99), |_| {})
            .unwrap()
            .is_none());
    }

    #[test]
    fn soft_delete_moves_row_to_pending_deletions() {
        let store = store();
        let item = store
            .insert(ScopeItem::new(LocalId::new(1), "Bath", "Tile", 40.0))
            .unwrap();

        assert!(store.soft_delete::<ScopeItem>(item.local_id()).unwrap());
        assert!(store.get_pending::<ScopeItem>().is_empty());
        assert_eq!(store.get_pending_deletions::<ScopeItem>().len(), 1);
        assert!(store.get_all::<ScopeItem>(false).is_empty());
        assert_eq!(store.get_all::<ScopeItem>(true).len(), 1);
        assert!(!store.soft_delete::<ScopeItem>(LocalId::new(42)).unwrap());
    }

    #[test]
    fn insert_remote_never_duplicates() {
        let store = store();
        let first = store
            .insert_remote(&remote_property("P-9", "Old name"), "P-9")
            .unwrap();
        let second = store
            .insert_remote(&remote_property("P-9", "New name"), "P-9")
            .unwrap();

        assert_eq!(first.local_id(), second.local_id());
        assert_eq!(second.name, "New name");
        assert_eq!(second.sync_status(), SyncStatus::Synced);
        assert_eq!(store.get_all::<Property>(true).len(), 1);
    }

    #[test]
    fn apply_remote_follows_deleted_flag() {
        let store = store();
        let local = store
            .insert_remote(&remote_property("P-1", "Elm"), "P-1")
            .unwrap();
        let mut snapshot = remote_property("P-1", "Elm renamed");
        snapshot.meta.is_deleted = true;

        let row = store
            .apply_remote(local.local_id(), &snapshot)
            .unwrap()
            .unwrap();
        assert_eq!(row.name, "Elm renamed");
        assert!(row.is_deleted());
        assert_eq!(row.local_id(), local.local_id());
    }

    #[test]
    fn resolve_references_links_children() {
        let store = store();
        let orphan = ScopeItem {
            meta: SyncMeta::remote("S-1", false),
            property_id: None,
            property_ref: Some("P-7".into()),
            ..ScopeItem::default()
        };
        let orphan = store.insert_remote(&orphan, "S-1").unwrap();

        // Parent unknown yet
        assert_eq!(store.resolve_references::<ScopeItem, Property>().unwrap(), 0);

        let parent = store
            .insert_remote(&remote_property("P-7", "Late"), "P-7")
            .unwrap();
        assert_eq!(store.resolve_references::<ScopeItem, Property>().unwrap(), 1);

        let linked: ScopeItem = store.get(orphan.local_id()).unwrap();
        assert_eq!(linked.property_id, Some(parent.local_id()));
        assert!(linked.property_ref.is_none());
        assert_eq!(linked.sync_status(), SyncStatus::Synced);
        assert_eq!(store.scope_items_for_property(parent.local_id()).len(), 1);
    }

    #[test]
    fn compact_purges_settled_deletions() {
        let store = store();
        let keep = store.insert(Property::new("Keep", "1 St")).unwrap();
        let gone = store.insert(Property::new("Gone", "2 St")).unwrap();
        store.soft_delete::<Property>(gone.local_id()).unwrap();
        store
            .set_sync_state::<Property>(gone.local_id(), SyncStatus::Synced, None, None)
            .unwrap();

        let stats = store.compact().unwrap();
        assert_eq!(stats.purged, 1);
        // The surviving row plus the retired id of the purged one
        assert_eq!(stats.records_after, 2);
        assert!(stats.bytes_after < stats.bytes_before);
        assert!(store.get::<Property>(gone.local_id()).is_none());
        assert!(store.get::<Property>(keep.local_id()).is_some());
    }

    #[test]
    fn stats_cover_all_tables() {
        let store = store();
        let p = store.insert(Property::new("A", "1 A St")).unwrap();
        let item = store
            .insert(ScopeItem::new(p.local_id(), "Kitchen", "Cabinets", 12.0))
            .unwrap();
        store
            .insert(Media::new(item.local_id(), "file:///a.jpg", "image/jpeg", 2048))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.tables.len(), 3);
        assert_eq!(stats.tables[&EntityKind::Media].pending, 1);
        assert_eq!(stats.journal_records, 3);
        assert_eq!(store.media_for_scope_item(item.local_id()).len(), 1);
    }
}
