//! Per-row and per-model sync results.

use renoscope_core::LocalId;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which way a row or item travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Local change sent to the server.
    Push,
    /// Remote state reconciled into the local store.
    Pull,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncDirection::Push => "push",
            SyncDirection::Pull => "pull",
        })
    }
}

/// What a row or item result did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    /// A row was created (remotely on push, locally on pull).
    Create,
    /// An existing row was updated.
    Update,
    /// A deletion was propagated.
    Delete,
    /// The collection GET itself.
    Fetch,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
            SyncOperation::Fetch => "fetch",
        })
    }
}

/// Outcome of syncing a single row or remote item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncItemResult {
    /// Local row, when one is involved.
    pub local_id: Option<LocalId>,
    /// Remote id, when known.
    pub remote_id: Option<String>,
    /// What was attempted.
    pub operation: SyncOperation,
    /// Push or pull.
    pub direction: SyncDirection,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message of a failure.
    pub error: Option<String>,
}

impl SyncItemResult {
    /// A successful result.
    pub fn succeeded(
        local_id: LocalId,
        remote_id: Option<String>,
        operation: SyncOperation,
        direction: SyncDirection,
    ) -> Self {
        Self {
            local_id: Some(local_id),
            remote_id,
            operation,
            direction,
            success: true,
            error: None,
        }
    }

    /// A failed result.
    pub fn failed(
        local_id: Option<LocalId>,
        remote_id: Option<String>,
        operation: SyncOperation,
        direction: SyncDirection,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            local_id,
            remote_id,
            operation,
            direction,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregated result of syncing one model.
#[derive(Debug, Clone, Serialize)]
pub struct SyncBatchResult {
    /// Model name.
    pub entity_name: String,
    /// True when no row or item failed.
    pub success: bool,
    /// Number of results.
    pub total: usize,
    /// Successful results.
    pub succeeded: usize,
    /// Failed results.
    pub failed: usize,
    /// Itemized results, push results first.
    pub results: Vec<SyncItemResult>,
    /// Error messages of the failed results.
    pub errors: Vec<String>,
    /// Wall time of the model sync in milliseconds.
    pub duration_ms: u64,
}

impl SyncBatchResult {
    /// Aggregates itemized results.
    pub fn from_results(
        entity_name: impl Into<String>,
        results: Vec<SyncItemResult>,
        duration: Duration,
    ) -> Self {
        let failed = results.iter().filter(|r| !r.success).count();
        let errors = results
            .iter()
            .filter_map(|r| r.error.clone())
            .collect();
        Self {
            entity_name: entity_name.into(),
            success: failed == 0,
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
            results,
            errors,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Results of one direction.
    pub fn direction(&self, direction: SyncDirection) -> impl Iterator<Item = &SyncItemResult> {
        self.results.iter().filter(move |r| r.direction == direction)
    }

    /// One-line human summary, e.g. "scopeItems: 1 of 4 items failed".
    pub fn summary(&self) -> String {
        if self.failed == 0 {
            format!("{}: {} items synced", self.entity_name, self.total)
        } else {
            format!(
                "{}: {} of {} items failed",
                self.entity_name, self.failed, self.total
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(id: u64) -> SyncItemResult {
        SyncItemResult::succeeded(
            LocalId::new(id),
            Some(format!("S-{id}")),
            SyncOperation::Create,
            SyncDirection::Push,
        )
    }

    #[test]
    fn aggregates_counts() {
        let results = vec![
            ok(1),
            SyncItemResult::failed(
                Some(LocalId::new(2)),
                None,
                SyncOperation::Create,
                SyncDirection::Push,
                "server returned 422: quantity required",
            ),
            ok(3),
        ];
        let batch = SyncBatchResult::from_results("scopeItems", results, Duration::from_millis(12));

        assert!(!batch.success);
        assert_eq!(batch.total, 3);
        assert_eq!(batch.succeeded, 2);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.errors, vec!["server returned 422: quantity required"]);
        assert_eq!(batch.duration_ms, 12);
        assert_eq!(batch.summary(), "scopeItems: 1 of 3 items failed");
    }

    #[test]
    fn empty_batch_is_success() {
        let batch = SyncBatchResult::from_results("media", Vec::new(), Duration::ZERO);
        assert!(batch.success);
        assert_eq!(batch.summary(), "media: 0 items synced");
        assert_eq!(batch.direction(SyncDirection::Pull).count(), 0);
    }
}
