//! Integration tests for the sync engine against an in-memory server.

use renoscope_core::{
    LocalStore, Media, Property, ScopeItem, StoreConfig, SyncMeta, SyncStatus, Syncable,
};
use renoscope_sync_engine::{
    CollectionShape, HttpClient, HttpRequest, HttpResponse, MediaAdapter, Method,
    MockFailure, MockRemote, PropertyAdapter, RemoteClient, RestClient, RetryConfig,
    ScopeItemAdapter, SyncAllOptions, SyncEngine, SyncOperation, SyncOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://api.renoscope.test";

/// Serves HTTP requests from a [`MockRemote`], wrapping every response in
/// the server's `{success, message, data}` envelope.
struct EnvelopeServer {
    remote: MockRemote,
}

impl HttpClient for EnvelopeServer {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .ok_or_else(|| format!("unexpected host in {}", request.url))?;
        let body = match &request.body {
            Some(bytes) => Some(serde_json::from_slice::<Value>(bytes).map_err(|e| e.to_string())?),
            None => None,
        };

        let response = match self.remote.send(request.method, path, body.as_ref()) {
            Ok(response) => response,
            Err(err) => return Err(err.to_string()),
        };
        let envelope = json!({
            "success": response.success,
            "message": response.message,
            "data": response.data,
        });
        Ok(HttpResponse {
            status: response.status,
            body: serde_json::to_vec(&envelope).map_err(|e| e.to_string())?,
        })
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig::new(2)
        .with_initial_delay(Duration::from_millis(1))
        .with_jitter(false)
}

fn engine_for<C: RemoteClient>(store: &Arc<LocalStore>, remote: C) -> SyncEngine<C> {
    let engine = SyncEngine::new(remote);
    engine.register_adapter(PropertyAdapter::new(Arc::clone(store)).with_retry(fast_retry()));
    engine.register_adapter(ScopeItemAdapter::new(Arc::clone(store)).with_retry(fast_retry()));
    engine.register_adapter(MediaAdapter::new(Arc::clone(store)).with_retry(fast_retry()));
    engine
}

fn memory_store() -> Arc<LocalStore> {
    Arc::new(LocalStore::open_in_memory().unwrap())
}

#[test]
fn field_capture_round_trip_over_http() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.seed(
        "/api/properties",
        [json!({"_id": "P-99", "name": "Elm House", "address": "12 Elm St", "city": "Leeds"})],
    );
    let client = RestClient::new(
        format!("{BASE_URL}/"),
        EnvelopeServer {
            remote: remote.clone(),
        },
    )
    .with_token("field-token");
    let engine = engine_for(&store, client);

    // First sync mirrors the property.
    engine.sync_all(SyncAllOptions::new()).unwrap();
    let property: Property = store.find_by_remote_id("P-99").unwrap();
    assert_eq!(property.city, "Leeds");

    // Capture in the field, then sync again.
    let item = store
        .insert(
            ScopeItem::new(property.local_id(), "Kitchen", "Flooring", 120.0)
                .with_component("Hardwood refinish", "sqft"),
        )
        .unwrap();
    let photo = store
        .insert(Media::new(item.local_id(), "file:///dcim/0001.jpg", "image/jpeg", 48_213))
        .unwrap();
    let batches = engine.sync_all(SyncAllOptions::new()).unwrap();
    assert!(batches.iter().all(|b| b.success), "{batches:?}");

    let server_item = remote.object("/api/scope-items", "S-1").unwrap();
    assert_eq!(server_item["property"], json!("P-99"));
    assert_eq!(server_item["component"], json!("Hardwood refinish"));
    let server_photo = remote.object("/api/media", "M-1").unwrap();
    assert_eq!(server_photo["scopeItem"], json!("S-1"));

    let item: ScopeItem = store.get(item.local_id()).unwrap();
    assert_eq!(item.remote_id(), Some("S-1"));
    assert_eq!(item.sync_status(), SyncStatus::Synced);
    let photo: Media = store.get(photo.local_id()).unwrap();
    assert_eq!(photo.remote_id(), Some("M-1"));

    // The pull half of the same run did not duplicate the pushed rows.
    assert_eq!(store.get_all::<ScopeItem>(true).len(), 1);
    assert_eq!(store.get_all::<Media>(true).len(), 1);
    assert_eq!(engine.remote().token().as_deref(), Some("field-token"));
}

#[test]
fn unsynced_property_is_omitted_from_the_body() {
    let store = memory_store();
    let remote = MockRemote::new();
    let engine = engine_for(&store, remote.clone());

    // A property the server has not confirmed yet.
    let local_only = store.insert(Property::new("Draft", "1 Draft Ln")).unwrap();
    let item = store
        .insert(ScopeItem::new(local_only.local_id(), "Bath", "Tile", 40.0))
        .unwrap();
    engine
        .sync_model("scopeItems", &SyncOptions::push_only())
        .unwrap();

    let body = remote.requests()[0].body.clone().unwrap();
    assert!(body.get("property").is_none());

    // The server echo carried no property; the local link survives.
    let row: ScopeItem = store.get(item.local_id()).unwrap();
    assert_eq!(row.property_id, Some(local_only.local_id()));
    assert_eq!(row.sync_status(), SyncStatus::Synced);
}

#[test]
fn children_pulled_before_parents_are_linked() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.seed(
        "/api/scope-items",
        [json!({"_id": "S-40", "property": "P-7", "roomName": "Attic", "quantity": 2})],
    );
    remote.seed("/api/properties", [json!({"_id": "P-7", "name": "Late Arrival"})]);
    let engine = engine_for(&store, remote.clone());

    let batches = engine
        .sync_all(
            SyncAllOptions::new()
                .with_models(["scopeItems", "properties"])
                .with_sync_options(SyncOptions::pull_only()),
        )
        .unwrap();
    assert!(batches.iter().all(|b| b.success));

    let property: Property = store.find_by_remote_id("P-7").unwrap();
    let item: ScopeItem = store.find_by_remote_id("S-40").unwrap();
    assert_eq!(item.property_id, Some(property.local_id()));
    assert!(item.property_ref.is_none());
    assert_eq!(item.sync_status(), SyncStatus::Synced);
    assert_eq!(store.scope_items_for_property(property.local_id()).len(), 1);
}

#[test]
fn pull_accepts_every_collection_shape() {
    for shape in [
        CollectionShape::Array,
        CollectionShape::Keyed("properties".into()),
        CollectionShape::Keyed("items".into()),
        CollectionShape::Single,
    ] {
        let store = memory_store();
        let remote = MockRemote::new();
        remote.seed("/api/properties", [json!({"id": 501, "name": "Numeric id"})]);
        remote.set_collection_shape("/api/properties", shape.clone());
        let engine = engine_for(&store, remote);

        let batch = engine
            .sync_model("properties", &SyncOptions::pull_only())
            .unwrap();
        assert_eq!(batch.total, 1, "{shape:?}");
        assert_eq!(batch.results[0].operation, SyncOperation::Create);
        assert!(store.find_by_remote_id::<Property>("501").is_some());
    }
}

#[test]
fn server_wins_over_unpushed_edits_on_pull() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.seed("/api/properties", [json!({"_id": "P-1", "name": "Elm"})]);
    remote.seed(
        "/api/scope-items",
        [json!({"_id": "S-1", "property": "P-1", "roomName": "Kitchen", "notes": "server"})],
    );
    let engine = engine_for(&store, remote.clone());
    engine
        .sync_all(SyncAllOptions::new().with_sync_options(SyncOptions::pull_only()))
        .unwrap();

    let item: ScopeItem = store.find_by_remote_id("S-1").unwrap();
    store
        .update::<ScopeItem, _>(item.local_id(), |row| row.notes = "device".into())
        .unwrap();
    let batch = engine
        .sync_model("scopeItems", &SyncOptions::pull_only())
        .unwrap();
    assert_eq!(batch.results[0].operation, SyncOperation::Update);

    let item: ScopeItem = store.get(item.local_id()).unwrap();
    assert_eq!(item.notes, "server");
    assert_eq!(item.sync_status(), SyncStatus::Synced);
}

#[test]
fn one_failing_model_does_not_stop_the_others() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.seed("/api/properties", [json!({"_id": "P-1", "name": "Elm"})]);
    remote.fail_always(Method::Get, "/api/scope-items", MockFailure::transport("connection reset"));
    remote.seed("/api/media", [json!({"_id": "M-9", "uri": "https://cdn/9.jpg"})]);
    let engine = engine_for(&store, remote);

    let batches = engine.sync_all(SyncAllOptions::new()).unwrap();
    let outcome: Vec<_> = batches.iter().map(|b| (b.entity_name.as_str(), b.success)).collect();
    assert_eq!(outcome, vec![("properties", true), ("scopeItems", false), ("media", true)]);
    assert!(batches[1].errors[0].contains("connection reset"));
    assert!(store.find_by_remote_id::<Media>("M-9").is_some());
}

#[test]
fn expired_token_fails_rows_and_is_cleared() {
    struct Unauthorized;

    impl HttpClient for Unauthorized {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, String> {
            Ok(HttpResponse {
                status: 401,
                body: br#"{"success": false, "message": "token expired"}"#.to_vec(),
            })
        }
    }

    let store = memory_store();
    let property = store
        .insert_remote(
            &Property {
                meta: SyncMeta::remote("P-1", false),
                ..Property::default()
            },
            "P-1",
        )
        .unwrap();
    let item = store
        .insert(ScopeItem::new(property.local_id(), "Bath", "Tile", 40.0))
        .unwrap();
    let engine = engine_for(&store, RestClient::new(BASE_URL, Unauthorized).with_token("stale"));

    let batch = engine
        .sync_model("scopeItems", &SyncOptions::push_only())
        .unwrap();
    assert!(!batch.success);
    assert!(batch.errors[0].contains("token expired"));
    assert!(engine.remote().token().is_none());

    let row: ScopeItem = store.get(item.local_id()).unwrap();
    assert_eq!(row.sync_status(), SyncStatus::Failed);
}

#[test]
fn synced_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let remote = MockRemote::new();
    let property_remote = remote.seed("/api/properties", [json!({"name": "Elm"})]);
    let item_id = {
        let store = Arc::new(LocalStore::open(dir.path(), StoreConfig::default()).unwrap());
        let engine = engine_for(&store, remote.clone());
        engine
            .sync_model("properties", &SyncOptions::pull_only())
            .unwrap();
        let property: Property = store.find_by_remote_id(&property_remote[0]).unwrap();
        let item = store
            .insert(ScopeItem::new(property.local_id(), "Porch", "Decking", 80.0))
            .unwrap();
        engine
            .sync_model("scopeItems", &SyncOptions::push_only())
            .unwrap();
        item.local_id()
    };

    let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
    let item: ScopeItem = store.get(item_id).unwrap();
    assert_eq!(item.remote_id(), Some("S-1"));
    assert_eq!(item.sync_status(), SyncStatus::Synced);
    assert!(store.get_pending::<ScopeItem>().is_empty());
}
