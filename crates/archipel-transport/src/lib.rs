//! Transport abstraction layer for Archipel.
//!
//! Provides the [`HttpTransport`] trait that abstracts over how a request
//! actually reaches the backend. The auth layer above only ever sees
//! [`HttpRequest`] and [`HttpResponse`], so it can be driven by a real HTTP
//! client in production and by a scripted fake in tests.
//!
//! # Feature Flags
//!
//! - `reqwest` (default): HTTP transport via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "reqwest")]
mod http;

pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque identifier for a single request, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header names are stored lower-cased so lookups are case-insensitive.
pub type Headers = BTreeMap<String, String>;

/// An outgoing request.
///
/// `path` is either relative to the transport's base URL (`/auth/login`)
/// or an absolute `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Sets a header, replacing any previous value for the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Builder form of [`set_header`](Self::set_header).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Attaches a JSON body and the matching content type.
    pub fn with_json(mut self, body: Vec<u8>) -> Self {
        self.set_header("content-type", "application/json");
        self.body = Some(body);
        self
    }

    /// Looks up a header value by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A response as seen by the auth layer. Any status code is a valid
/// response; only failures to reach the server are transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `true` for 401 Unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Sends requests to the backend.
pub trait HttpTransport: Send + Sync + 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends a request and waits for the response.
    ///
    /// Returns `Ok` for every status code the server answers with,
    /// including 4xx and 5xx.
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, Self::Error>;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    type Error = T::Error;

    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, Self::Error> {
        (**self).send(request).await
    }
}
