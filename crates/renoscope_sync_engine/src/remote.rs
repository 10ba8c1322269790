//! Remote resource client abstraction.
//!
//! The engine talks to the server through [`RemoteClient`]. Implementations
//! decide how requests travel: [`crate::RestClient`] over an [`crate::HttpClient`],
//! [`crate::MockRemote`] entirely in memory.

use crate::error::{SyncError, SyncResult};
use serde_json::Value;
use std::fmt;

/// HTTP method of a remote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Fetch a collection.
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Delete a resource.
    Delete,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server response, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// True for a 2xx status whose envelope (if any) did not report failure.
    pub success: bool,
    /// HTTP status code.
    pub status: u16,
    /// Message from the envelope, or the status line.
    pub message: String,
    /// Payload.
    pub data: Option<Value>,
    /// Validation errors reported by the server.
    pub errors: Vec<String>,
}

impl ApiResponse {
    /// A successful response carrying `data`.
    pub fn ok(status: u16, data: Option<Value>) -> Self {
        Self {
            success: true,
            status,
            message: String::from("OK"),
            data,
            errors: Vec::new(),
        }
    }

    /// An unsuccessful response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            message: message.into(),
            data: None,
            errors: Vec::new(),
        }
    }

    /// Builds a response from a raw HTTP status and body.
    ///
    /// A JSON object with a boolean `success` field is treated as an envelope
    /// `{success, message, data, errors}` and unwrapped; any other JSON body is
    /// the payload itself.
    pub fn from_http(status: u16, body: &[u8]) -> Self {
        let status_ok = (200..300).contains(&status);
        let trimmed = body.iter().all(u8::is_ascii_whitespace);

        let parsed = if trimmed {
            None
        } else {
            match serde_json::from_slice::<Value>(body) {
                Ok(value) => Some(value),
                Err(err) => {
                    let message = if status_ok {
                        format!("malformed response body: {err}")
                    } else {
                        format!("HTTP {status}")
                    };
                    return Self::error(status, message);
                }
            }
        };

        let Some(value) = parsed else {
            return if status_ok {
                Self::ok(status, None)
            } else {
                Self::error(status, format!("HTTP {status}"))
            };
        };

        let envelope_success = value.get("success").and_then(Value::as_bool);
        match (envelope_success, value) {
            (Some(success), Value::Object(mut map)) => {
                let message = map
                    .remove("message")
                    .and_then(|m| m.as_str().map(str::to_string))
                    .unwrap_or_else(|| default_message(status));
                Self {
                    success: success && status_ok,
                    status,
                    message,
                    data: map.remove("data").filter(|d| !d.is_null()),
                    errors: map.remove("errors").map(collect_errors).unwrap_or_default(),
                }
            }
            (_, value) if status_ok => Self::ok(status, Some(value)),
            (_, value) => {
                let message = value
                    .get("message")
                    .or_else(|| value.get("error"))
                    .and_then(Value::as_str)
                    .map_or_else(|| default_message(status), str::to_string);
                Self::error(status, message)
            }
        }
    }

    /// Returns the payload of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Api`] for an unsuccessful response.
    pub fn into_data(self) -> SyncResult<Option<Value>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(SyncError::Api {
                status: self.status,
                message: self.message,
            })
        }
    }
}

fn default_message(status: u16) -> String {
    if (200..300).contains(&status) {
        String::from("OK")
    } else {
        format!("HTTP {status}")
    }
}

fn collect_errors(errors: Value) -> Vec<String> {
    match errors {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other
                    .get("message")
                    .and_then(Value::as_str)
                    .map_or_else(|| other.to_string(), str::to_string),
            })
            .collect(),
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        other => vec![other.to_string()],
    }
}

/// Client for the remote REST resources.
///
/// Transport failures are `Err`; a response that arrived but reports failure
/// is `Ok` with `success == false`.
pub trait RemoteClient: Send + Sync {
    /// Sends one request to `path` (relative to the server base URL).
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> SyncResult<ApiResponse>;

    /// Sends a GET request.
    fn get(&self, path: &str) -> SyncResult<ApiResponse> {
        self.send(Method::Get, path, None)
    }

    /// Sends a POST request.
    fn post(&self, path: &str, body: &Value) -> SyncResult<ApiResponse> {
        self.send(Method::Post, path, Some(body))
    }

    /// Sends a PUT request.
    fn put(&self, path: &str, body: &Value) -> SyncResult<ApiResponse> {
        self.send(Method::Put, path, Some(body))
    }

    /// Sends a DELETE request.
    fn delete(&self, path: &str) -> SyncResult<ApiResponse> {
        self.send(Method::Delete, path, None)
    }
}

impl<T: RemoteClient + ?Sized> RemoteClient for std::sync::Arc<T> {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> SyncResult<ApiResponse> {
        (**self).send(method, path, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_payload() {
        let response = ApiResponse::from_http(200, br#"[{"_id":"P-1"}]"#);
        assert!(response.success);
        assert_eq!(response.data, Some(json!([{"_id": "P-1"}])));
    }

    #[test]
    fn envelope_is_unwrapped() {
        let body = br#"{"success":true,"message":"created","data":{"_id":"S-1"}}"#;
        let response = ApiResponse::from_http(201, body);
        assert!(response.success);
        assert_eq!(response.message, "created");
        assert_eq!(response.data, Some(json!({"_id": "S-1"})));
    }

    #[test]
    fn envelope_failure_on_2xx() {
        let body = br#"{"success":false,"message":"validation failed","errors":[{"message":"quantity required"},"unit required"]}"#;
        let response = ApiResponse::from_http(200, body);
        assert!(!response.success);
        assert_eq!(response.errors, vec!["quantity required", "unit required"]);

        let err = response.into_data().unwrap_err();
        assert!(matches!(err, SyncError::Api { status: 200, .. }));
    }

    #[test]
    fn non_2xx_without_envelope() {
        let response = ApiResponse::from_http(404, br#"{"error":"no such scope item"}"#);
        assert!(!response.success);
        assert_eq!(response.message, "no such scope item");

        let response = ApiResponse::from_http(502, b"<html>bad gateway</html>");
        assert!(!response.success);
        assert_eq!(response.message, "HTTP 502");
    }

    #[test]
    fn empty_body() {
        let response = ApiResponse::from_http(204, b"");
        assert!(response.success);
        assert!(response.data.is_none());
    }

    #[test]
    fn malformed_success_body() {
        let response = ApiResponse::from_http(200, b"{not json");
        assert!(!response.success);
        assert!(response.message.starts_with("malformed response body"));
    }
}
