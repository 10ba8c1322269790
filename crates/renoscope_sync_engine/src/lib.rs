//! # Renoscope Sync Engine
//!
//! Push/pull reconciliation between the Renoscope local store and the
//! back-office REST server.
//!
//! This crate provides:
//! - The model adapter contract and adapters for properties, scope items and media
//! - A sync engine with an adapter registry and a per-engine sync mutex
//! - Per-row sync state transitions (pending → syncing → synced | failed)
//! - Per-request retry with exponential backoff
//! - An HTTP client abstraction and an in-memory mock server
//!
//! ## Architecture
//!
//! Each model is synced **push-then-pull**:
//! 1. Push every pending row and pending deletion, one request per row
//! 2. Pull the server collection and merge it into the store
//!
//! Models run one after another in registration order, parents before
//! children, so that foreign keys resolve while pulling.
//!
//! ## Key Invariants
//!
//! - Local ids never leave the device; references travel as remote ids
//! - A failing row never stops the rest of its batch
//! - The server is authoritative when pulling
//! - At most one sync call runs per engine
//! - A record is never mirrored twice locally

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod adapters;
mod config;
mod context;
mod engine;
mod error;
mod http;
mod mock;
mod pull;
mod push;
mod remote;
mod result;
pub mod wire;

pub use adapter::ModelAdapter;
pub use adapters::{
    MediaAdapter, MediaWire, PropertyAdapter, PropertyWire, ScopeItemAdapter, ScopeItemWire,
};
pub use config::{
    AdapterConfig, BatchCallback, ProgressCallback, RetryConfig, SyncAllOptions, SyncOptions,
    SyncProgress,
};
pub use engine::{EngineStatus, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpRequest, HttpResponse, RestClient};
pub use mock::{CollectionShape, MockFailure, MockRemote, RecordedRequest};
pub use remote::{ApiResponse, Method, RemoteClient};
pub use result::{SyncBatchResult, SyncDirection, SyncItemResult, SyncOperation};
