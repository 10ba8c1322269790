//! Dump journal command implementation.

use renoscope_core::{
    scan, EntityKind, JournalEntry, Media, Property, RecordKind, ScopeItem, SyncMeta, Syncable,
    JOURNAL_FILE,
};
use serde::Serialize;
use std::path::Path;

/// Journal record representation for output.
#[derive(Debug, Serialize)]
pub struct JournalRecordInfo {
    /// Position in the journal.
    pub index: usize,
    /// Record type.
    pub record_type: &'static str,
    /// Table.
    pub entity: EntityKind,
    /// Local id.
    pub local_id: u64,
    /// Remote id (upserts only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    /// Sync status (upserts only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Soft-delete flag (upserts only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

/// Runs the dump-journal command.
///
/// Reads the journal file directly, so it works while another process holds
/// the store lock.
pub fn run(path: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let journal_path = path.join(JOURNAL_FILE);

    if !journal_path.exists() {
        return Err("Journal file not found".into());
    }

    let bytes = std::fs::read(&journal_path)?;
    let journal = scan(&bytes)?;
    let records = describe(&journal.entries, limit);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
            if journal.torn_bytes > 0 {
                println!();
                println!(
                    "Torn tail: {} bytes after offset {}",
                    journal.torn_bytes, journal.valid_len
                );
            }
        }
    }

    Ok(())
}

fn describe(entries: &[JournalEntry], limit: Option<usize>) -> Vec<JournalRecordInfo> {
    entries
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, entry)| {
            let meta = row_meta(entry);
            JournalRecordInfo {
                index,
                record_type: match entry.kind() {
                    RecordKind::Upsert => "UPSERT",
                    RecordKind::Remove => "REMOVE",
                },
                entity: entry.entity(),
                local_id: entry.local_id().as_u64(),
                remote_id: meta.as_ref().and_then(|m| m.remote_id.clone()),
                status: meta.as_ref().map(|m| m.sync_status.to_string()),
                deleted: meta.as_ref().map(|m| m.is_deleted),
            }
        })
        .collect()
}

fn row_meta(entry: &JournalEntry) -> Option<SyncMeta> {
    if entry.kind() != RecordKind::Upsert {
        return None;
    }
    match entry.entity() {
        EntityKind::Property => decoded_meta::<Property>(entry),
        EntityKind::ScopeItem => decoded_meta::<ScopeItem>(entry),
        EntityKind::Media => decoded_meta::<Media>(entry),
    }
}

fn decoded_meta<R: Syncable>(entry: &JournalEntry) -> Option<SyncMeta> {
    entry.decode_row::<R>().ok().map(|row| row.meta().clone())
}

fn print_text_output(records: &[JournalRecordInfo]) {
    println!("Journal Records ({} total)", records.len());
    println!("================");
    println!();

    for record in records {
        print!(
            "[{:06}] {:6} {}#{}",
            record.index, record.record_type, record.entity, record.local_id
        );
        if let Some(status) = &record.status {
            print!(" status={status}");
        }
        if let Some(remote_id) = &record.remote_id {
            print!(" remote={remote_id}");
        }
        if record.deleted == Some(true) {
            print!(" deleted");
        }
        println!();
    }
}
