//! Wire-format helpers shared by the adapters.
//!
//! Remote objects identify themselves with `_id` or `id` (string or number)
//! and flag soft deletes with `isDeleted`. Collection responses arrive as a
//! bare array, wrapped under a collection key, or as a single object.

use crate::error::SyncResult;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Field names accepted as a remote identifier, in order of preference.
pub const ID_FIELDS: [&str; 2] = ["_id", "id"];

/// Extracts the remote id of a wire object.
pub fn extract_remote_id(object: &Value) -> Option<String> {
    ID_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(id_to_string))
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Rewrites the identifier of a wire object into a single string `_id` field.
pub fn normalize_object(object: Value) -> Value {
    match object {
        Value::Object(mut map) => {
            let id = ID_FIELDS
                .iter()
                .find_map(|field| map.get(*field).and_then(id_to_string));
            for field in ID_FIELDS {
                map.remove(field);
            }
            if let Some(id) = id {
                map.insert("_id".to_string(), Value::String(id));
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Decodes a wire object into an adapter's wire type.
///
/// # Errors
///
/// Returns a serialization error if the object does not match `W`.
pub fn decode<W: DeserializeOwned>(object: Value) -> SyncResult<W> {
    Ok(serde_json::from_value(normalize_object(object))?)
}

/// Flattens a GET payload into the list of wire objects it carries.
pub fn normalize_collection(data: Option<Value>, collection_key: &str) -> Vec<Value> {
    match data {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => unwrap_collection(map, collection_key),
        Some(_) => Vec::new(),
    }
}

fn unwrap_collection(mut map: Map<String, Value>, collection_key: &str) -> Vec<Value> {
    for key in [collection_key, "data", "items"] {
        match map.remove(key) {
            Some(Value::Array(items)) => return items,
            // A lone record under the collection key
            Some(Value::Object(inner)) if key == collection_key => {
                return vec![Value::Object(inner)];
            }
            Some(Value::Object(inner)) => return unwrap_collection(inner, collection_key),
            Some(other) => {
                map.insert(key.to_string(), other);
            }
            None => {}
        }
    }
    // Single-object envelope
    vec![Value::Object(map)]
}
