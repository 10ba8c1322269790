//! Persistence and invariant tests for the local store.

use proptest::prelude::*;
use renoscope_core::{
    CoreError, CoreResult, JournalBackend, LocalId, LocalStore, Media, MemoryJournal, Property,
    ScopeItem, StoreConfig, SyncStatus, Syncable, JOURNAL_FILE,
};
use std::fs::OpenOptions;
use std::io::{self, Write};
use tempfile::tempdir;

#[test]
fn rows_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store");

    let (property_id, item_id) = {
        let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
        let property = store.insert(Property::new("Elm House", "12 Elm St")).unwrap();
        store
            .set_sync_state::<Property>(property.local_id(), SyncStatus::Synced, Some("P-1"), None)
            .unwrap();
        let item = store
            .insert(
                ScopeItem::new(property.local_id(), "Kitchen", "Flooring", 120.0)
                    .with_component("Hardwood refinish", "sqft"),
            )
            .unwrap();
        store
            .insert(Media::new(item.local_id(), "file:///k1.jpg", "image/jpeg", 4096))
            .unwrap();
        (property.local_id(), item.local_id())
    };

    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    let property: Property = store.get(property_id).unwrap();
    assert_eq!(property.remote_id(), Some("P-1"));
    assert_eq!(property.sync_status(), SyncStatus::Synced);
    assert_eq!(
        store.find_by_remote_id::<Property>("P-1").unwrap().local_id(),
        property_id
    );

    let items = store.scope_items_for_property(property_id);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].component, "Hardwood refinish");
    assert_eq!(store.media_for_scope_item(item_id).len(), 1);

    // Ids keep counting after replay
    let next = store.insert(Property::new("Oak House", "3 Oak Ave")).unwrap();
    assert_eq!(next.local_id(), LocalId::new(2));
}

#[test]
fn torn_tail_is_dropped_on_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store");

    {
        let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
        store.insert(Property::new("Elm House", "12 Elm St")).unwrap();
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path.join(JOURNAL_FILE))
        .unwrap();
    file.write_all(b"RSJ1\x01\x00").unwrap();
    drop(file);

    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    assert_eq!(store.get_all::<Property>(true).len(), 1);
    let stats = store.stats().unwrap();
    assert_eq!(stats.journal_records, 1);
}

#[test]
fn compacted_store_reopens_identically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store");

    let before = {
        let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
        for n in 0..5 {
            let p = store
                .insert(Property::new(format!("House {n}"), "Main St"))
                .unwrap();
            store
                .update::<Property, _>(p.local_id(), |row| row.phase = "scoping".into())
                .unwrap();
        }
        store.soft_delete::<Property>(LocalId::new(2)).unwrap();
        let stats = store.compact_with(false).unwrap();
        assert_eq!(stats.records_after, 5);
        store.get_all::<Property>(true)
    };

    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    assert_eq!(store.get_all::<Property>(true), before);
    assert_eq!(store.get_pending_deletions::<Property>().len(), 1);
}

#[test]
fn locked_store_cannot_be_opened_twice() {
    let dir = tempdir().unwrap();
    let _store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
    let err = LocalStore::open(dir.path(), StoreConfig::default()).unwrap_err();
    assert!(matches!(err, CoreError::StoreLocked));
}

#[test]
fn missing_store_without_create() {
    let dir = tempdir().unwrap();
    let config = StoreConfig::new().create_if_missing(false);
    let err = LocalStore::open(&dir.path().join("absent"), config).unwrap_err();
    assert!(matches!(err, CoreError::StoreNotFound { .. }));
}

/// Memory backend whose atomic replace always fails, like a full disk
/// during compaction.
struct ReplaceFails(MemoryJournal);

impl JournalBackend for ReplaceFails {
    fn read_at(&self, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        self.0.read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> CoreResult<u64> {
        self.0.append(data)
    }

    fn size(&self) -> CoreResult<u64> {
        self.0.size()
    }

    fn sync(&mut self) -> CoreResult<()> {
        self.0.sync()
    }

    fn truncate(&mut self, new_size: u64) -> CoreResult<()> {
        self.0.truncate(new_size)
    }

    fn replace(&mut self, _data: &[u8]) -> CoreResult<()> {
        Err(CoreError::Io(io::Error::other("no space left")))
    }
}

#[test]
fn failed_compaction_keeps_the_journal() {
    let journal = MemoryJournal::new();
    let config = StoreConfig::default().sync_on_write(false);
    let store = LocalStore::open_with_journal(
        Box::new(ReplaceFails(journal.clone())),
        config.clone(),
    )
    .unwrap();

    let property = store.insert(Property::new("Elm House", "12 Elm St")).unwrap();
    for room in ["Bath", "Kitchen", "Hall"] {
        let item = store
            .insert(ScopeItem::new(property.local_id(), room, "Paint", 20.0))
            .unwrap();
        store
            .update::<ScopeItem, _>(item.local_id(), |row| row.quantity = 25.0)
            .unwrap();
    }
    let before = journal.data();
    let records = store.stats().unwrap().journal_records;

    assert!(store.compact_with(true).is_err());
    assert_eq!(journal.data(), before);
    assert_eq!(store.stats().unwrap().journal_records, records);

    // Later writes still land after the intact log
    store
        .insert(ScopeItem::new(property.local_id(), "Loft", "Insulation", 40.0))
        .unwrap();
    drop(store);

    let reopened = LocalStore::open_with_journal(Box::new(journal), config).unwrap();
    assert_eq!(reopened.get_pending::<ScopeItem>().len(), 4);
    assert!(reopened
        .get_all::<ScopeItem>(false)
        .iter()
        .filter(|row| row.room_name != "Loft")
        .all(|row| row.quantity == 25.0));
}

#[test]
fn purged_ids_are_not_reused_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store");

    let (item_id, media_id) = {
        let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
        let property = store.insert(Property::new("Elm House", "12 Elm St")).unwrap();
        let item = store
            .insert(ScopeItem::new(property.local_id(), "Bath", "Tile", 40.0))
            .unwrap();
        let media = store
            .insert(Media::new(item.local_id(), "file:///bath.jpg", "image/jpeg", 1024))
            .unwrap();
        store.soft_delete::<ScopeItem>(item.local_id()).unwrap();
        store
            .set_sync_state::<ScopeItem>(item.local_id(), SyncStatus::Synced, None, None)
            .unwrap();
        assert_eq!(store.compact_with(true).unwrap().purged, 1);
        (item.local_id(), media.local_id())
    };

    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    let fresh = store
        .insert(ScopeItem::new(LocalId::new(1), "Hall", "Paint", 10.0))
        .unwrap();
    assert_ne!(fresh.local_id(), item_id);
    assert!(store.media_for_scope_item(fresh.local_id()).is_empty());

    let media: Media = store.get(media_id).unwrap();
    assert_eq!(media.scope_item_id, Some(item_id));

    // A second compaction keeps the reservation
    store.compact_with(true).unwrap();
    drop(store);
    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    let next = store
        .insert(ScopeItem::new(LocalId::new(1), "Loft", "Insulation", 5.0))
        .unwrap();
    assert!(next.local_id() > fresh.local_id());
}

#[test]
fn partial_write_in_the_middle_does_not_corrupt_the_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store");

    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    store.insert(Property::new("Elm House", "12 Elm St")).unwrap();

    // Half a frame left by a write that failed after the store accounted
    // for the log size.
    let mut file = OpenOptions::new()
        .append(true)
        .open(path.join(JOURNAL_FILE))
        .unwrap();
    file.write_all(b"RSJ1\x01\x00\x01\x40\x00\x00\x00\xa4").unwrap();
    drop(file);

    store.insert(Property::new("Oak Lodge", "3 Oak Rd")).unwrap();
    drop(store);

    let store = LocalStore::open(&path, StoreConfig::default()).unwrap();
    let names: Vec<String> = store
        .get_all::<Property>(true)
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Elm House", "Oak Lodge"]);
}

#[derive(Debug, Clone)]
enum Op {
    Insert,
    Update(u64),
    Delete(u64),
    Settle(u64, bool),
    Purge(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Insert),
        2 => (1..12u64).prop_map(Op::Update),
        1 => (1..12u64).prop_map(Op::Delete),
        2 => (1..12u64, any::<bool>()).prop_map(|(id, ok)| Op::Settle(id, ok)),
        1 => (1..12u64).prop_map(Op::Purge),
    ]
}

fn apply(store: &LocalStore, op: &Op) {
    match op {
        Op::Insert => {
            store.insert(ScopeItem::new(LocalId::new(1), "Bath", "Tile", 10.0)).unwrap();
        }
        Op::Update(id) => {
            store
                .update::<ScopeItem, _>(LocalId::new(*id), |row| row.quantity += 1.0)
                .unwrap();
        }
        Op::Delete(id) => {
            store.soft_delete::<ScopeItem>(LocalId::new(*id)).unwrap();
        }
        Op::Settle(id, ok) => {
            let status = if *ok { SyncStatus::Synced } else { SyncStatus::Failed };
            let remote = format!("S-{id}");
            store
                .set_sync_state::<ScopeItem>(LocalId::new(*id), status, Some(&remote), None)
                .unwrap();
        }
        Op::Purge(id) => {
            store.purge::<ScopeItem>(LocalId::new(*id)).unwrap();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pending_sets_partition_unsynced_rows(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let store = LocalStore::open_in_memory().unwrap();
        for op in &ops {
            apply(&store, op);
        }

        let all = store.get_all::<ScopeItem>(true);
        let pending = store.get_pending::<ScopeItem>();
        let deletions = store.get_pending_deletions::<ScopeItem>();

        for row in &pending {
            prop_assert!(!row.is_deleted());
            prop_assert!(row.sync_status().needs_push());
        }
        for row in &deletions {
            prop_assert!(row.is_deleted());
            prop_assert!(row.sync_status().needs_push());
        }
        let unsynced = all.iter().filter(|row| row.sync_status().needs_push()).count();
        prop_assert_eq!(pending.len() + deletions.len(), unsynced);

        // Remote ids stay unique
        for row in &all {
            if let Some(remote_id) = row.remote_id() {
                let found = store.find_by_remote_id::<ScopeItem>(remote_id).unwrap();
                prop_assert_eq!(found.local_id(), row.local_id());
            }
        }
    }

    #[test]
    fn replay_reproduces_tables(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let journal = MemoryJournal::new();
        let store = LocalStore::open_with_journal(
            Box::new(journal.clone()),
            StoreConfig::default().sync_on_write(false),
        )
        .unwrap();
        for op in &ops {
            apply(&store, op);
        }
        let expected = store.get_all::<ScopeItem>(true);
        drop(store);

        let reopened = LocalStore::open_with_journal(
            Box::new(MemoryJournal::with_data(journal.data())),
            StoreConfig::default(),
        )
        .unwrap();
        prop_assert_eq!(reopened.get_all::<ScopeItem>(true), expected);
    }
}

#[test]
fn interrupted_push_is_retried_after_reopen() {
    let journal = MemoryJournal::new();
    let config = StoreConfig::default().sync_on_write(false);
    let item_id = {
        let store = LocalStore::open_with_journal(Box::new(journal.clone()), config.clone()).unwrap();
        let item = store
            .insert(ScopeItem::new(LocalId::new(1), "Hall", "Paint", 30.0))
            .unwrap();
        store
            .set_sync_state::<ScopeItem>(item.local_id(), SyncStatus::Syncing, None, None)
            .unwrap();
        item.local_id()
    };

    let store = LocalStore::open_with_journal(Box::new(journal), config).unwrap();
    let item: ScopeItem = store.get(item_id).unwrap();
    assert_eq!(item.sync_status(), SyncStatus::Failed);
    assert_eq!(store.get_pending::<ScopeItem>().len(), 1);
}
