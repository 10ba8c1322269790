//! Configuration for adapters and sync calls.

use crate::result::SyncBatchResult;
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Per-entity adapter configuration.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Name the adapter is registered under (e.g. "scopeItems").
    pub entity_name: String,
    /// Collection endpoint, relative to the server base URL.
    pub endpoint: String,
    /// Key of the collection array in a wrapped GET response.
    pub collection_key: String,
    /// Rows per push batch (logging and progress granularity only).
    pub batch_size: usize,
    /// Per-request retry behavior.
    pub retry: RetryConfig,
}

impl AdapterConfig {
    /// Creates a configuration; the collection key defaults to the entity name.
    pub fn new(entity_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let entity_name = entity_name.into();
        Self {
            collection_key: entity_name.clone(),
            entity_name,
            endpoint: endpoint.into(),
            batch_size: 10,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the collection key.
    #[must_use]
    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }

    /// Sets the push batch size.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Path of one resource in the collection.
    pub fn item_path(&self, remote_id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), remote_id)
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts per request, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    #[must_use]
    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.add_jitter = enabled;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        // A negative multiplier flips the sign on odd attempts
        let delay_secs = base_delay.min(self.max_delay.as_secs_f64()).max(0.0);

        if self.add_jitter && delay_secs > 0.0 {
            // Up to 25% on top
            let jitter = delay_secs * 0.25 * rand::thread_rng().gen::<f64>();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Options for syncing one model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Skip the push phase.
    pub pull_only: bool,
    /// Skip the pull phase.
    pub push_only: bool,
}

impl SyncOptions {
    /// Only pulls remote state.
    #[must_use]
    pub const fn pull_only() -> Self {
        Self {
            pull_only: true,
            push_only: false,
        }
    }

    /// Only pushes local changes.
    #[must_use]
    pub const fn push_only() -> Self {
        Self {
            pull_only: false,
            push_only: true,
        }
    }
}

/// Progress notification sent after each model of a [`crate::SyncEngine::sync_all`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    /// Model that just finished.
    pub entity_name: String,
    /// Models finished so far, this one included.
    pub completed: usize,
    /// Models in this run.
    pub total: usize,
}

/// Callback fired with progress after each model.
pub type ProgressCallback = Box<dyn Fn(&SyncProgress) + Send + Sync>;

/// Callback fired with a model's batch result.
pub type BatchCallback = Box<dyn Fn(&SyncBatchResult) + Send + Sync>;

/// Options for syncing several models.
#[derive(Default)]
pub struct SyncAllOptions {
    /// Per-model options.
    pub sync: SyncOptions,
    /// Models to sync, in order; all registered models when `None`.
    pub models: Option<Vec<String>>,
    /// Fired after every model.
    pub on_progress: Option<ProgressCallback>,
    /// Fired with the batch result of every model that finished cleanly.
    pub on_complete: Option<BatchCallback>,
    /// Fired instead of `on_complete` for a model with failed rows or items.
    pub on_error: Option<BatchCallback>,
}

impl SyncAllOptions {
    /// Creates options syncing every registered model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets per-model options.
    #[must_use]
    pub fn with_sync_options(mut self, sync: SyncOptions) -> Self {
        self.sync = sync;
        self
    }

    /// Restricts the run to the given models.
    #[must_use]
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the progress callback.
    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&SyncProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Sets the completion callback.
    #[must_use]
    pub fn on_complete(mut self, callback: impl Fn(&SyncBatchResult) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&SyncBatchResult) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for SyncAllOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncAllOptions")
            .field("sync", &self.sync)
            .field("models", &self.models)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
