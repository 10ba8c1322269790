//! In-memory REST server for tests and offline demos.

use crate::error::{SyncError, SyncResult};
use crate::remote::{ApiResponse, Method, RemoteClient};
use crate::wire;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A failure injected into [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// The server answers with this status.
    Status {
        /// HTTP status.
        status: u16,
        /// Response message.
        message: String,
    },
    /// No response arrives.
    Transport {
        /// Error message.
        message: String,
        /// Whether the error is retryable.
        retryable: bool,
    },
}

impl MockFailure {
    /// A failed response.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// A retryable transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }
}

/// How GET responses of a collection are shaped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionShape {
    /// A bare JSON array.
    #[default]
    Array,
    /// `{ "<key>": [...] }`.
    Keyed(String),
    /// The first object alone.
    Single,
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Method.
    pub method: Method,
    /// Path.
    pub path: String,
    /// JSON body.
    pub body: Option<Value>,
}

#[derive(Debug)]
struct FailureRule {
    method: Method,
    path: String,
    remaining: Option<usize>,
    failure: MockFailure,
}

#[derive(Debug, Default)]
struct Collection {
    objects: Vec<Value>,
    next_id: u64,
    shape: CollectionShape,
}

#[derive(Debug, Default)]
struct MockState {
    collections: HashMap<String, Collection>,
    requests: Vec<RecordedRequest>,
    failures: Vec<FailureRule>,
}

/// In-memory REST server implementing [`RemoteClient`].
///
/// Collections are created on first use. POST assigns ids of the form
/// `<initial>-<n>` where the initial is the upper-cased first letter of the
/// endpoint's last segment (`/api/scope-items` gives `S-1`, `S-2`, ...).
/// DELETE marks the object `isDeleted` instead of dropping it, so later GETs
/// carry the deletion. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    /// Creates an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores objects in a collection, assigning ids to those without one.
    ///
    /// Returns the ids of the stored objects.
    pub fn seed(&self, endpoint: &str, objects: impl IntoIterator<Item = Value>) -> Vec<String> {
        let mut state = self.state.lock();
        let collection = state.collections.entry(endpoint.to_string()).or_default();
        objects
            .into_iter()
            .map(|object| collection.store(endpoint, object))
            .collect()
    }

    /// Returns every object of a collection.
    pub fn objects(&self, endpoint: &str) -> Vec<Value> {
        self.state
            .lock()
            .collections
            .get(endpoint)
            .map(|c| c.objects.clone())
            .unwrap_or_default()
    }

    /// Returns one object by id.
    pub fn object(&self, endpoint: &str, id: &str) -> Option<Value> {
        self.state
            .lock()
            .collections
            .get(endpoint)
            .and_then(|c| c.find(id).map(|index| c.objects[index].clone()))
    }

    /// Sets the GET response shape of a collection.
    pub fn set_collection_shape(&self, endpoint: &str, shape: CollectionShape) {
        self.state
            .lock()
            .collections
            .entry(endpoint.to_string())
            .or_default()
            .shape = shape;
    }

    /// Fails every request matching `method` and `path`.
    pub fn fail_always(&self, method: Method, path: &str, failure: MockFailure) {
        self.add_failure(method, path, None, failure);
    }

    /// Fails the next `times` requests matching `method` and `path`.
    pub fn fail_times(&self, method: Method, path: &str, times: usize, failure: MockFailure) {
        self.add_failure(method, path, Some(times), failure);
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    fn add_failure(&self, method: Method, path: &str, remaining: Option<usize>, failure: MockFailure) {
        self.state.lock().failures.push(FailureRule {
            method,
            path: path.to_string(),
            remaining,
            failure,
        });
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Forgets the recorded requests.
    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }
}

impl MockState {
    fn take_failure(&mut self, method: Method, path: &str) -> Option<MockFailure> {
        let index = self
            .failures
            .iter()
            .position(|rule| rule.method == method && rule.path == path)?;
        let rule = &mut self.failures[index];
        let failure = rule.failure.clone();
        if let Some(remaining) = rule.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.failures.remove(index);
            }
        }
        Some(failure)
    }

    /// Splits a path into its collection endpoint and optional item id.
    fn route(&self, method: Method, path: &str) -> (String, Option<String>) {
        if self.collections.contains_key(path) || matches!(method, Method::Get | Method::Post) {
            return (path.to_string(), None);
        }
        match path.rsplit_once('/') {
            Some((endpoint, id)) if !endpoint.is_empty() => {
                (endpoint.to_string(), Some(id.to_string()))
            }
            _ => (path.to_string(), None),
        }
    }
}

impl Collection {
    fn find(&self, id: &str) -> Option<usize> {
        self.objects
            .iter()
            .position(|object| wire::extract_remote_id(object).as_deref() == Some(id))
    }

    fn store(&mut self, endpoint: &str, object: Value) -> String {
        let mut object = wire::normalize_object(object);
        let id = match wire::extract_remote_id(&object) {
            Some(id) => id,
            None => {
                self.next_id += 1;
                let id = format!("{}-{}", id_initial(endpoint), self.next_id);
                if let Value::Object(map) = &mut object {
                    map.insert("_id".to_string(), Value::String(id.clone()));
                }
                id
            }
        };
        match self.find(&id) {
            Some(index) => self.objects[index] = object,
            None => self.objects.push(object),
        }
        id
    }

    fn listing(&self) -> Value {
        match &self.shape {
            CollectionShape::Array => Value::Array(self.objects.clone()),
            CollectionShape::Keyed(key) => {
                let mut map = Map::new();
                map.insert(key.clone(), Value::Array(self.objects.clone()));
                Value::Object(map)
            }
            CollectionShape::Single => self.objects.first().cloned().unwrap_or(Value::Null),
        }
    }
}

fn id_initial(endpoint: &str) -> char {
    endpoint
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .and_then(|segment| segment.chars().next())
        .map_or('R', |c| c.to_ascii_uppercase())
}

impl RemoteClient for MockRemote {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> SyncResult<ApiResponse> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        if let Some(failure) = state.take_failure(method, path) {
            return match failure {
                MockFailure::Status { status, message } => Ok(ApiResponse::error(status, message)),
                MockFailure::Transport { message, retryable } => {
                    Err(SyncError::Transport { message, retryable })
                }
            };
        }

        let (endpoint, id) = state.route(method, path);
        let collection = state.collections.entry(endpoint.clone()).or_default();

        let response = match (method, id) {
            (Method::Get, _) => ApiResponse::ok(200, Some(collection.listing())),
            (Method::Post, _) => match body {
                Some(object @ Value::Object(_)) => {
                    let mut object = object.clone();
                    if let Value::Object(map) = &mut object {
                        for field in wire::ID_FIELDS {
                            map.remove(field);
                        }
                    }
                    let id = collection.store(&endpoint, object);
                    ApiResponse::ok(201, collection.find(&id).map(|i| collection.objects[i].clone()))
                }
                _ => ApiResponse::error(400, "body must be a JSON object"),
            },
            (Method::Put, Some(id)) => match (collection.find(&id), body) {
                (Some(index), Some(Value::Object(fields))) => {
                    if let Value::Object(existing) = &mut collection.objects[index] {
                        for (key, value) in fields {
                            if !wire::ID_FIELDS.contains(&key.as_str()) {
                                existing.insert(key.clone(), value.clone());
                            }
                        }
                    }
                    ApiResponse::ok(200, Some(collection.objects[index].clone()))
                }
                (Some(_), _) => ApiResponse::error(400, "body must be a JSON object"),
                (None, _) => ApiResponse::error(404, format!("{id} not found")),
            },
            (Method::Delete, Some(id)) => match collection.find(&id) {
                Some(index) => {
                    if let Value::Object(existing) = &mut collection.objects[index] {
                        existing.insert("isDeleted".to_string(), json!(true));
                    }
                    ApiResponse::ok(200, Some(collection.objects[index].clone()))
                }
                None => ApiResponse::error(404, format!("{id} not found")),
            },
            (_, None) => ApiResponse::error(405, format!("{method} needs a resource id")),
        };
        Ok(response)
    }
}
