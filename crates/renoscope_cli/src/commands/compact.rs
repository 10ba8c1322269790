//! Compact command implementation.

use super::open_store;
use renoscope_core::{LocalStore, Media, Property, ScopeItem, SyncStatus, Syncable};
use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path, purge: bool, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;

    println!("Compacting journal at {}", path.display());
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let stats = store.stats()?;
    let rows: usize = stats.tables.values().map(|t| t.total).sum();
    let settled = settled_deletions(&store);

    println!("Compaction Analysis:");
    println!("  Journal records:    {}", stats.journal_records);
    println!("  Live rows:          {rows}");
    println!(
        "  Synced deletions:   {} (will be {})",
        settled,
        if purge { "purged" } else { "kept" }
    );
    println!("  Size before:        {} bytes", stats.journal_size);

    if dry_run {
        return Ok(());
    }

    let expected = if purge { rows - settled } else { rows };
    if expected >= stats.journal_records {
        println!();
        println!("No compaction needed - journal is already optimal");
        return Ok(());
    }

    println!();
    println!("Performing compaction...");
    let result = store.compact_with(purge)?;
    println!("  Records: {} -> {}", result.records_before, result.records_after);
    println!("  Size:    {} -> {} bytes", result.bytes_before, result.bytes_after);
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        result.bytes_before.saturating_sub(result.bytes_after),
        if result.bytes_before > 0 {
            (result.bytes_before.saturating_sub(result.bytes_after) as f64
                / result.bytes_before as f64)
                * 100.0
        } else {
            0.0
        }
    );
    println!("✓ Compaction complete");

    Ok(())
}

fn settled_deletions(store: &LocalStore) -> usize {
    count_settled::<Property>(store) + count_settled::<ScopeItem>(store) + count_settled::<Media>(store)
}

fn count_settled<R: Syncable>(store: &LocalStore) -> usize {
    store
        .get_all::<R>(true)
        .iter()
        .filter(|row| row.is_deleted() && row.sync_status() == SyncStatus::Synced)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use renoscope_core::StoreConfig;

    #[test]
    fn compacts_a_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
            let p = store.insert(Property::new("Elm", "1 Elm St")).unwrap();
            for quantity in [1.0, 2.0, 3.0] {
                let item = store
                    .insert(ScopeItem::new(p.local_id(), "Bath", "Tile", quantity))
                    .unwrap();
                store.soft_delete::<ScopeItem>(item.local_id()).unwrap();
                store
                    .set_sync_state::<ScopeItem>(item.local_id(), SyncStatus::Synced, None, None)
                    .unwrap();
            }
            assert_eq!(settled_deletions(&store), 3);
        }

        run(dir.path(), true, false).unwrap();

        let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        // The property plus the retired id of the purged scope items
        assert_eq!(store.stats().unwrap().journal_records, 2);
        assert!(store.get_all::<ScopeItem>(true).is_empty());
    }

    #[test]
    fn dry_run_leaves_the_journal_alone() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
            let p = store.insert(Property::new("Elm", "1 Elm St")).unwrap();
            store
                .update::<Property, _>(p.local_id(), |row| row.city = "Leeds".into())
                .unwrap();
        }

        run(dir.path(), true, true).unwrap();

        let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(store.stats().unwrap().journal_records, 2);
    }

    #[test]
    fn missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("absent"), true, false).is_err());
    }
}
