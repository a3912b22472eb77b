//! The HTTP transport port.
//!
//! [`HttpTransport`] performs exactly one request/response exchange. Base URL,
//! per-call timeout and the authentication header are transport configuration;
//! the dispatcher only supplies method, relative URL and body.
//!
//! ## Architectural Layer
//!
//! **Port definition.** Concrete transports (e.g. the `reqwest`-backed one in
//! the `http-transport` crate) implement this trait; test code substitutes
//! scripted stubs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{HttpMethod, PaginationLink, TransportError};

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Response headers with case-insensitive lookup.
///
/// Repeated headers are folded into one comma-separated value, which is the
/// form both `Link` and `Retry-After` are defined to accept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, returning the updated set.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// Appends a header value, folding repeats with `", "`.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.0
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Returns the value of `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Parses the `Link` header, if present.
    pub fn pagination_link(&self) -> Option<PaginationLink> {
        self.get("link").map(PaginationLink::parse)
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One outgoing exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path plus encoded query, relative to the transport's base URL.
    pub url: String,
    /// JSON body, sent verbatim. Always `None` for GET.
    pub body: Option<Value>,
}

/// A successful (2xx) exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// Response status code.
    pub status: u16,
    /// Response headers.
    pub headers: ResponseHeaders,
    /// Decoded JSON body; `Value::Null` for an empty body.
    pub data: Value,
}

impl TransportResponse {
    /// Creates a response without headers.
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            headers: ResponseHeaders::new(),
            data,
        }
    }

    /// Adds a header, returning the updated response.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Performs a single HTTP exchange.
///
/// Implementations must:
/// - resolve `request.url` against their configured base URL,
/// - attach the configured authentication header,
/// - bound the exchange by their configured timeout (fresh for every call),
/// - report 2xx responses as `Ok` and everything else as
///   [`TransportError::Status`] carrying the headers and decoded body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and waits for the complete response.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = ResponseHeaders::new().with("Retry-After", "3");
        assert_eq!(headers.get("retry-after"), Some("3"));
        assert_eq!(headers.get("RETRY-AFTER"), Some("3"));
        assert_eq!(headers.get("link"), None);
    }

    #[test]
    fn repeated_link_headers_are_folded() {
        let headers = ResponseHeaders::new()
            .with("Link", r#"<https://h/1>; rel="prev""#)
            .with("link", r#"<https://h/3>; rel="next""#);
        let link = headers.pagination_link().unwrap();
        assert_eq!(link.next(), Some("https://h/3"));
        assert_eq!(link.get("prev"), Some("https://h/1"));
    }
}
