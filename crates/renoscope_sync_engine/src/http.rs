//! HTTP remote client implementation.
//!
//! This module provides a REST client for the sync engine.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, ureq, a test double, etc.).

use crate::error::{SyncError, SyncResult};
use crate::remote::{ApiResponse, Method, RemoteClient};
use parking_lot::RwLock;
use serde_json::Value;

/// One outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Returns the value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body bytes.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
pub trait HttpClient: Send + Sync {
    /// Executes a request; `Err` means no response arrived.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// REST client sending JSON requests to a base URL.
///
/// Adds a bearer token when one is set. A `401` response clears the token so
/// that the caller can re-authenticate; the engine only sees a failed response.
pub struct RestClient<C: HttpClient> {
    /// Base URL of the server (e.g., "https://api.example.com").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Bearer token.
    token: RwLock<Option<String>>,
    /// Last transport error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> RestClient<C> {
    /// Creates a new REST client.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    /// Replaces the bearer token.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Drops the bearer token.
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Returns the current bearer token.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns the wrapped HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl<C: HttpClient> RemoteClient for RestClient<C> {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> SyncResult<ApiResponse> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        let body = match body {
            Some(value) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(serde_json::to_vec(value)?)
            }
            None => None,
        };
        if let Some(token) = self.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let request = HttpRequest {
            method,
            url: self.url(path),
            headers,
            body,
        };

        tracing::debug!(%method, url = %request.url, "sending request");
        let response = self.client.execute(&request).map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            SyncError::transport_retryable(e)
        })?;
        *self.last_error.write() = None;

        if response.status == 401 {
            tracing::warn!(url = %request.url, "unauthorized, clearing token");
            self.clear_token();
        }

        Ok(ApiResponse::from_http(response.status, &response.body))
    }
}
