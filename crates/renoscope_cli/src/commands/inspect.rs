//! Inspect command implementation.

use super::open_store;
use renoscope_core::{EntityKind, LocalStore, Media, Property, ScopeItem, StoreStats, Syncable};
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Per-table counts and journal size.
    #[serde(flatten)]
    pub stats: StoreStats,
    /// Rows awaiting a push (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<Vec<PendingRow>>,
}

/// A row that still has to be pushed.
#[derive(Debug, Serialize)]
pub struct PendingRow {
    /// Table.
    pub entity: EntityKind,
    /// Local id.
    pub local_id: u64,
    /// Remote id, once created on the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    /// Sync status.
    pub status: String,
    /// True for a pending deletion.
    pub deleted: bool,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_pending: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;
    let result = InspectResult {
        path: path.display().to_string(),
        stats: store.stats()?,
        pending: show_pending.then(|| pending_rows(&store)),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn pending_rows(store: &LocalStore) -> Vec<PendingRow> {
    let mut rows = Vec::new();
    collect_pending::<Property>(store, &mut rows);
    collect_pending::<ScopeItem>(store, &mut rows);
    collect_pending::<Media>(store, &mut rows);
    rows
}

fn collect_pending<R: Syncable>(store: &LocalStore, out: &mut Vec<PendingRow>) {
    let rows = store
        .get_pending::<R>()
        .into_iter()
        .chain(store.get_pending_deletions::<R>());
    out.extend(rows.map(|row| PendingRow {
        entity: R::KIND,
        local_id: row.local_id().as_u64(),
        remote_id: row.remote_id().map(str::to_string),
        status: row.sync_status().to_string(),
        deleted: row.is_deleted(),
    }));
}

fn print_text_output(result: &InspectResult) {
    println!("Renoscope Store Inspection");
    println!("==========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Journal:");
    println!("  Size:    {}", format_size(result.stats.journal_size));
    println!("  Records: {}", result.stats.journal_records);
    println!();
    println!(
        "{:<12} {:>7} {:>8} {:>8} {:>7} {:>7} {:>8}",
        "Table", "Rows", "Pending", "Syncing", "Synced", "Failed", "Deleted"
    );
    for (kind, table) in &result.stats.tables {
        println!(
            "{:<12} {:>7} {:>8} {:>8} {:>7} {:>7} {:>8}",
            kind.as_str(),
            table.total,
            table.pending,
            table.syncing,
            table.synced,
            table.failed,
            table.deleted
        );
    }

    if let Some(pending) = &result.pending {
        println!();
        println!("Pending rows ({}):", pending.len());
        for row in pending {
            print!("  {}#{} {}", row.entity, row.local_id, row.status);
            if let Some(remote_id) = &row.remote_id {
                print!(" remote={remote_id}");
            }
            if row.deleted {
                print!(" (deletion)");
            }
            println!();
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
