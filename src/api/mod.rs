//! REST API access
//!
//! Requests go through a [`Transport`]:
//! - `HttpTransport`: the real API over HTTP (reqwest)
//! - `MockTransport`: an in-memory backend seeded with demo data
//!
//! [`ApiClient`] sits on top, attaching the bearer token and handling
//! authorization failures.

mod client;
mod http;
mod mock;

pub use client::{error_message, ApiClient};
pub use http::HttpTransport;
pub use mock::MockTransport;

use crate::core::{Query, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call, relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path with leading and trailing slash, e.g. `/readings/`
    pub path: String,
    pub query: Query,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code and body bytes
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can carry a request to the API and return its answer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the call. Non-2xx statuses are returned, not raised.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Name of this transport, for logs
    fn name(&self) -> &str;
}

/// Shared transports, so a caller can keep a handle on the backend
#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
