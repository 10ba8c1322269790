//! The sync engine: adapter registry, sync mutex and orchestration.

use crate::adapter::{ModelAdapter, RegisteredModel};
use crate::config::{SyncAllOptions, SyncOptions, SyncProgress};
use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteClient;
use crate::result::{SyncBatchResult, SyncDirection};
use parking_lot::RwLock;
use renoscope_core::now_millis;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Snapshot of the engine's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    /// True while a sync call holds the engine.
    pub is_syncing: bool,
    /// Milliseconds since epoch of the last completed full sync.
    pub last_sync_time: Option<u64>,
}

/// Statistics about sync calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    /// Model syncs completed.
    pub runs: u64,
    /// Rows pushed successfully.
    pub items_pushed: u64,
    /// Server objects merged successfully.
    pub items_pulled: u64,
    /// Failed rows and items.
    pub items_failed: u64,
    /// Milliseconds since epoch of the last completed full sync.
    pub last_sync_time: Option<u64>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Releases the sync mutex when a sync call ends, however it ends.
struct SyncGuard<'a> {
    syncing: &'a AtomicBool,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.syncing.store(false, Ordering::SeqCst);
    }
}

/// Reconciles the local store with the server, one registered model at a time.
///
/// At most one sync call runs per engine; a second concurrent call fails
/// immediately with [`SyncError::SyncInProgress`]. Within a call, models run
/// sequentially in registration order (or the order given by the caller),
/// each push before its pull.
///
/// # Example
///
/// ```rust
/// use renoscope_core::{LocalStore, Property};
/// use renoscope_sync_engine::{
///     MockRemote, PropertyAdapter, ScopeItemAdapter, SyncAllOptions, SyncEngine,
/// };
/// use std::sync::Arc;
///
/// let store = Arc::new(LocalStore::open_in_memory().unwrap());
/// let remote = MockRemote::new();
/// remote.seed("/api/properties", [serde_json::json!({"_id": "P-99", "name": "Elm House"})]);
///
/// let engine = SyncEngine::new(remote.clone());
/// engine.register_adapter(PropertyAdapter::new(Arc::clone(&store)));
/// engine.register_adapter(ScopeItemAdapter::new(Arc::clone(&store)));
///
/// let batches = engine.sync_all(SyncAllOptions::new()).unwrap();
/// assert_eq!(batches.len(), 2);
/// assert!(batches.iter().all(|b| b.success));
/// assert!(store.find_by_remote_id::<Property>("P-99").is_some());
/// ```
pub struct SyncEngine<C: RemoteClient> {
    remote: Arc<C>,
    adapters: RwLock<Vec<Arc<dyn RegisteredModel>>>,
    syncing: AtomicBool,
    cancelled: AtomicBool,
    stats: RwLock<SyncStats>,
}

impl<C: RemoteClient> SyncEngine<C> {
    /// Creates an engine talking to `remote`.
    pub fn new(remote: C) -> Self {
        Self {
            remote: Arc::new(remote),
            adapters: RwLock::new(Vec::new()),
            syncing: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the remote client.
    pub fn remote(&self) -> &C {
        &self.remote
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Registers an adapter under its entity name.
    ///
    /// An adapter already registered under the same name is replaced in place,
    /// keeping its position in the sync order.
    pub fn register_adapter<A: ModelAdapter>(&self, adapter: A) {
        let name = ModelAdapter::entity_name(&adapter).to_string();
        let adapter: Arc<dyn RegisteredModel> = Arc::new(adapter);
        let mut adapters = self.adapters.write();
        match adapters.iter().position(|a| a.entity_name() == name) {
            Some(index) => {
                tracing::debug!(entity = %name, "replacing adapter");
                adapters[index] = adapter;
            }
            None => {
                tracing::debug!(entity = %name, "registering adapter");
                adapters.push(adapter);
            }
        }
    }

    /// Removes an adapter. Returns false if none was registered under `name`.
    pub fn unregister_adapter(&self, name: &str) -> bool {
        let mut adapters = self.adapters.write();
        let before = adapters.len();
        adapters.retain(|a| a.entity_name() != name);
        adapters.len() != before
    }

    /// Returns true if an adapter is registered under `name`.
    pub fn is_model_registered(&self, name: &str) -> bool {
        self.adapters.read().iter().any(|a| a.entity_name() == name)
    }

    /// Names of the registered adapters, in sync order.
    pub fn registered_models(&self) -> Vec<String> {
        self.adapters
            .read()
            .iter()
            .map(|a| a.entity_name().to_string())
            .collect()
    }

    fn lookup(&self, name: &str) -> SyncResult<Arc<dyn RegisteredModel>> {
        self.adapters
            .read()
            .iter()
            .find(|a| a.entity_name() == name)
            .cloned()
            .ok_or_else(|| SyncError::AdapterNotRegistered(name.to_string()))
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Returns the engine status.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            is_syncing: self.is_syncing(),
            last_sync_time: self.stats.read().last_sync_time,
        }
    }

    /// Returns true while a sync call is running.
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Asks the running sync call to stop.
    ///
    /// The call ends with [`SyncError::Cancelled`] at the next row, item or
    /// model boundary. The row in flight is restored to the status it had
    /// before the call. Each new sync call clears the request.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Acquires the sync mutex.
    fn begin(&self) -> SyncResult<SyncGuard<'_>> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sync requested while another is running");
            return Err(SyncError::SyncInProgress);
        }
        self.cancelled.store(false, Ordering::SeqCst);
        Ok(SyncGuard {
            syncing: &self.syncing,
        })
    }

    fn context(&self) -> SyncContext<'_> {
        SyncContext::new(self.remote.as_ref(), &self.cancelled)
    }

    fn record_error(&self, err: &SyncError) {
        self.stats.write().last_error = Some(err.to_string());
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Syncs one model: push then pull, unless `options` skips a phase.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::SyncInProgress`] if another call is running,
    /// [`SyncError::AdapterNotRegistered`] for an unknown model, and
    /// [`SyncError::Cancelled`] if [`SyncEngine::cancel`] was called. Row and
    /// item failures are reported in the batch result instead.
    pub fn sync_model(&self, name: &str, options: &SyncOptions) -> SyncResult<SyncBatchResult> {
        let _guard = self.begin()?;
        let model = self.lookup(name)?;
        let ctx = self.context();
        self.run_model(model.as_ref(), &ctx, *options)
            .inspect_err(|err| self.record_error(err))
    }

    /// Syncs several models in order.
    ///
    /// One model's failures do not stop the others. After the last model a
    /// final reference-resolution pass links children pulled before their
    /// parents, and the last sync time is recorded.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::SyncInProgress`] if another call is running,
    /// [`SyncError::AdapterNotRegistered`] if a requested model is unknown
    /// (before anything is synced), and [`SyncError::Cancelled`] if
    /// [`SyncEngine::cancel`] was called.
    pub fn sync_all(&self, options: SyncAllOptions) -> SyncResult<Vec<SyncBatchResult>> {
        let _guard = self.begin()?;
        self.run_all(&options)
            .inspect_err(|err| self.record_error(err))
    }

    fn run_all(&self, options: &SyncAllOptions) -> SyncResult<Vec<SyncBatchResult>> {
        let models = match &options.models {
            Some(names) => names
                .iter()
                .map(|name| self.lookup(name))
                .collect::<SyncResult<Vec<_>>>()?,
            None => self.adapters.read().clone(),
        };

        let ctx = self.context();
        let total = models.len();
        let started = Instant::now();
        tracing::info!(models = total, "full sync started");

        let mut batches = Vec::with_capacity(total);
        for (index, model) in models.iter().enumerate() {
            ctx.check_cancelled()?;
            let batch = self.run_model(model.as_ref(), &ctx, options.sync)?;

            if let Some(on_progress) = &options.on_progress {
                on_progress(&SyncProgress {
                    entity_name: batch.entity_name.clone(),
                    completed: index + 1,
                    total,
                });
            }
            let callback = if batch.success {
                &options.on_complete
            } else {
                &options.on_error
            };
            if let Some(callback) = callback {
                callback(&batch);
            }
            batches.push(batch);
        }

        // Children may have been pulled before their parents.
        let adapters = self.adapters.read().clone();
        for model in &adapters {
            if let Err(err) = model.resolve_references() {
                tracing::warn!(entity = model.entity_name(), error = %err, "reference resolution failed");
            }
        }

        let failed: usize = batches.iter().map(|b| b.failed).sum();
        self.stats.write().last_sync_time = Some(now_millis());
        tracing::info!(
            models = total,
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "full sync finished"
        );
        Ok(batches)
    }

    fn run_model(
        &self,
        model: &dyn RegisteredModel,
        ctx: &SyncContext<'_>,
        options: SyncOptions,
    ) -> SyncResult<SyncBatchResult> {
        let entity = model.entity_name();
        let started = Instant::now();

        let mut results = Vec::new();
        if !options.pull_only {
            results.extend(model.push(ctx)?);
        }
        if !options.push_only {
            results.extend(model.pull(ctx)?);
        }

        let batch = SyncBatchResult::from_results(entity, results, started.elapsed());
        {
            let mut stats = self.stats.write();
            stats.runs += 1;
            stats.items_pushed += batch
                .direction(SyncDirection::Push)
                .filter(|r| r.success)
                .count() as u64;
            stats.items_pulled += batch
                .direction(SyncDirection::Pull)
                .filter(|r| r.success)
                .count() as u64;
            stats.items_failed += batch.failed as u64;
            if let Some(error) = batch.errors.first() {
                stats.last_error = Some(format!("{entity}: {error}"));
            }
        }

        if batch.success {
            tracing::info!(entity, total = batch.total, duration_ms = batch.duration_ms, "model synced");
        } else {
            tracing::warn!(entity, failed = batch.failed, total = batch.total, "{}", batch.summary());
        }
        Ok(batch)
    }
}

impl<C: RemoteClient> std::fmt::Debug for SyncEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("models", &self.registered_models())
            .field("is_syncing", &self.is_syncing())
            .finish_non_exhaustive()
    }
}
