//! Pull phase: the server collection into the local store.

use crate::adapter::ModelAdapter;
use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use crate::remote::Method;
use crate::result::{SyncDirection, SyncItemResult, SyncOperation};
use crate::wire;
use renoscope_core::{SyncStatus, Syncable};
use serde_json::Value;

/// Fetches the adapter's collection and merges every object into the store.
///
/// The server is authoritative: an existing local copy is overwritten even if
/// it has unpushed edits. Objects the device has never seen and that are
/// already deleted remotely are skipped without a result. A failed fetch
/// yields a single failed `Fetch` result.
pub(crate) fn pull_model<A: ModelAdapter>(
    adapter: &A,
    ctx: &SyncContext<'_>,
) -> SyncResult<Vec<SyncItemResult>> {
    let entity = adapter.entity_name();
    let config = adapter.config();

    let data = match ctx.send(&config.retry, Method::Get, &config.endpoint, None) {
        Ok(data) => data,
        Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
        Err(err) => {
            tracing::warn!(entity, error = %err, "fetch failed");
            return Ok(vec![SyncItemResult::failed(
                None,
                None,
                SyncOperation::Fetch,
                SyncDirection::Pull,
                err,
            )]);
        }
    };

    let objects = wire::normalize_collection(data, &config.collection_key);
    tracing::info!(entity, objects = objects.len(), "pull started");

    let mut results = Vec::with_capacity(objects.len());
    for object in objects {
        ctx.check_cancelled()?;
        let remote_hint = wire::extract_remote_id(&object);
        match merge_object(adapter, object) {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    entity,
                    remote_id = remote_hint.as_deref().unwrap_or(""),
                    error = %err,
                    "object merge failed"
                );
                results.push(SyncItemResult::failed(
                    None,
                    remote_hint,
                    SyncOperation::Fetch,
                    SyncDirection::Pull,
                    err,
                ));
            }
        }
    }

    if let Err(err) = adapter.resolve_references() {
        tracing::warn!(entity, error = %err, "reference resolution failed");
    }

    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!(entity, merged = results.len() - failed, failed, "pull finished");
    Ok(results)
}

/// Merges one server object. Returns `None` for skipped objects.
fn merge_object<A: ModelAdapter>(adapter: &A, object: Value) -> SyncResult<Option<SyncItemResult>> {
    let wire = wire::decode::<A::Wire>(object)?;
    let snapshot = adapter.from_wire(&wire)?;
    let remote_id = snapshot
        .remote_id()
        .map(str::to_string)
        .ok_or_else(|| SyncError::protocol("server object carried no id"))?;

    let (local_id, operation) = match adapter.find_by_remote_id(&remote_id) {
        Some(existing) if snapshot.is_deleted() => {
            let local_id = existing.local_id();
            adapter.delete_local(local_id)?;
            adapter.apply_status(local_id, SyncStatus::Synced, Some(&remote_id), None)?;
            (local_id, SyncOperation::Delete)
        }
        Some(existing) => {
            let local_id = existing.local_id();
            adapter.update_from_remote(local_id, &snapshot)?;
            adapter.apply_status(local_id, SyncStatus::Synced, Some(&remote_id), None)?;
            (local_id, SyncOperation::Update)
        }
        None if snapshot.is_deleted() => {
            tracing::trace!(entity = adapter.entity_name(), %remote_id, "skipping remote tombstone");
            return Ok(None);
        }
        None => match adapter.create_from_remote(&snapshot)? {
            Some(row) => (row.local_id(), SyncOperation::Create),
            None => return Err(SyncError::protocol("server object carried no id")),
        },
    };

    Ok(Some(SyncItemResult::succeeded(
        local_id,
        Some(remote_id),
        operation,
        SyncDirection::Pull,
    )))
}
