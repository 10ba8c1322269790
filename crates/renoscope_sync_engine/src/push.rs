//! Push phase: local pending rows to the server.

use crate::adapter::ModelAdapter;
use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use crate::remote::Method;
use crate::result::{SyncDirection, SyncItemResult, SyncOperation};
use crate::wire;
use renoscope_core::{SyncStatus, Syncable};

/// Pushes every pending row and pending deletion of one adapter.
///
/// Rows are processed one at a time in local-id order, live rows first. A
/// failing row is marked `Failed` and the push continues; only cancellation
/// ends it early, leaving the untouched rows as they were.
pub(crate) fn push_model<A: ModelAdapter>(
    adapter: &A,
    ctx: &SyncContext<'_>,
) -> SyncResult<Vec<SyncItemResult>> {
    let entity = adapter.entity_name();
    let mut pending = adapter.get_pending();
    pending.extend(adapter.get_pending_deletions());

    if pending.is_empty() {
        tracing::debug!(entity, "nothing to push");
        return Ok(Vec::new());
    }

    let batch_size = adapter.config().batch_size.max(1);
    let batches = pending.len().div_ceil(batch_size);
    tracing::info!(entity, rows = pending.len(), batches, "push started");

    let mut results = Vec::with_capacity(pending.len());
    for (index, batch) in pending.chunks(batch_size).enumerate() {
        tracing::debug!(entity, batch = index + 1, of = batches, rows = batch.len(), "pushing batch");
        for row in batch {
            ctx.check_cancelled()?;
            results.push(push_row(adapter, ctx, row)?);
        }
    }

    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!(entity, pushed = results.len() - failed, failed, "push finished");
    Ok(results)
}

fn operation_for<R: Syncable>(row: &R) -> SyncOperation {
    if row.is_deleted() {
        SyncOperation::Delete
    } else if row.remote_id().is_some() {
        SyncOperation::Update
    } else {
        SyncOperation::Create
    }
}

/// Pushes one row and settles its state.
///
/// Only [`SyncError::Cancelled`] escapes; the row goes back to the status it
/// had before the push started.
fn push_row<A: ModelAdapter>(
    adapter: &A,
    ctx: &SyncContext<'_>,
    row: &A::Row,
) -> SyncResult<SyncItemResult> {
    let local_id = row.local_id();
    let operation = operation_for(row);

    match try_push_row(adapter, ctx, row) {
        Ok(remote_id) => {
            tracing::debug!(
                entity = adapter.entity_name(),
                %local_id,
                remote_id = remote_id.as_deref().unwrap_or(""),
                %operation,
                "row pushed"
            );
            Ok(SyncItemResult::succeeded(
                local_id,
                remote_id,
                operation,
                SyncDirection::Push,
            ))
        }
        Err(SyncError::Cancelled) => {
            adapter.apply_status(local_id, row.sync_status(), None, None)?;
            Err(SyncError::Cancelled)
        }
        Err(err) => {
            tracing::warn!(
                entity = adapter.entity_name(),
                %local_id,
                %operation,
                error = %err,
                "row push failed"
            );
            if let Err(mark_err) = adapter.apply_status(local_id, SyncStatus::Failed, None, None) {
                tracing::warn!(%local_id, error = %mark_err, "could not mark row failed");
            }
            Ok(SyncItemResult::failed(
                Some(local_id),
                row.remote_id().map(str::to_string),
                operation,
                SyncDirection::Push,
                err,
            ))
        }
    }
}

/// Returns the remote id the row ends up with.
fn try_push_row<A: ModelAdapter>(
    adapter: &A,
    ctx: &SyncContext<'_>,
    row: &A::Row,
) -> SyncResult<Option<String>> {
    let config = adapter.config();
    let local_id = row.local_id();
    let existing_remote = row.remote_id().map(str::to_string);

    if !adapter.apply_status(local_id, SyncStatus::Syncing, None, None)? {
        return Err(SyncError::RowNotFound {
            entity: <A::Row as Syncable>::KIND,
            local_id,
        });
    }

    if row.is_deleted() {
        // Never created remotely: nothing to delete.
        if let Some(remote_id) = existing_remote.as_deref() {
            ctx.send(&config.retry, Method::Delete, &config.item_path(remote_id), None)?;
        }
        adapter.apply_status(local_id, SyncStatus::Synced, None, None)?;
        return Ok(existing_remote);
    }

    let body = serde_json::to_value(adapter.to_wire(row)?)?;
    let data = match existing_remote.as_deref() {
        Some(remote_id) => ctx.send(
            &config.retry,
            Method::Put,
            &config.item_path(remote_id),
            Some(&body),
        )?,
        None => ctx.send(&config.retry, Method::Post, &config.endpoint, Some(&body))?,
    };

    let confirmed = data
        .as_ref()
        .and_then(wire::extract_remote_id)
        .or(existing_remote)
        .ok_or_else(|| SyncError::protocol("create response carried no id"))?;

    let snapshot = match data {
        Some(object) if object.is_object() => {
            let wire = wire::decode::<A::Wire>(object)?;
            let mut snapshot = adapter.from_wire(&wire)?;
            snapshot.inherit_reference(row);
            Some(snapshot)
        }
        _ => None,
    };

    adapter.apply_status(local_id, SyncStatus::Synced, Some(&confirmed), snapshot.as_ref())?;
    Ok(Some(confirmed))
}
