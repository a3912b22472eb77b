//! Request and response value types.
//!
//! [`RequestOptions`] is what endpoint wrappers hand to the dispatcher;
//! [`RequestSpec`] is the dispatcher's per-hop state; [`ApiResponse`] and
//! [`ResponseEnvelope`] are the two shapes a result can be consumed in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{encode_query, QueryParams};
use crate::transport::TransportRequest;
use crate::DispatchError;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The HTTP verbs the management API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read a resource or collection.
    Get,
    /// Replace or update a resource.
    Put,
    /// Create a resource or trigger an action.
    Post,
    /// Remove a resource.
    Delete,
}

impl HttpMethod {
    /// Returns the upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if a request body is attached for this verb.
    pub fn sends_body(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl FromStr for HttpMethod {
    type Err = DispatchError;

    /// Parses a verb case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Get, Self::Put, Self::Post, Self::Delete]
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DispatchError::InvalidMethod {
                method: s.to_string(),
            })
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Optional query and body supplied by an endpoint wrapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Query parameters, encoded onto the first request only.
    pub query: Option<QueryParams>,
    /// Request payload, attached verbatim for non-GET verbs.
    pub data: Option<Value>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets the request payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// State of one hop of a dispatch.
///
/// A `RequestSpec` is created once per caller invocation and then either consumed
/// terminally or reborn: [`RequestSpec::retry`] keeps the path and bumps
/// `attempt`; [`RequestSpec::continuation`] moves to a new path, drops the
/// query (the server already encoded it into the continuation URL), and resets
/// `attempt` to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP verb, fixed for the whole chain.
    pub method: HttpMethod,
    /// Path relative to the base URL.
    pub path: String,
    /// Query parameters; `None` on continuations.
    pub query: Option<QueryParams>,
    /// Request payload, carried unchanged across hops.
    pub body: Option<Value>,
    /// Number of rate-limit retries already spent on this hop.
    pub attempt: u32,
}

impl RequestSpec {
    /// Creates the first hop of a dispatch.
    pub fn new(method: HttpMethod, path: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method,
            path: path.into(),
            query: options.query,
            body: options.data,
            attempt: 0,
        }
    }

    /// Returns the same hop with the retry counter incremented.
    #[must_use]
    pub fn retry(mut self) -> Self {
        self.attempt += 1;
        self
    }

    /// Returns a fresh hop targeting a pagination continuation.
    #[must_use]
    pub fn continuation(self, path: impl Into<String>) -> Self {
        Self {
            method: self.method,
            path: path.into(),
            query: None,
            body: self.body,
            attempt: 0,
        }
    }

    /// Path with the encoded query appended.
    pub fn url(&self) -> String {
        format!("{}{}", self.path, encode_query(self.query.as_ref()))
    }

    /// Builds the transport request for this hop.
    pub fn to_transport_request(&self) -> TransportRequest {
        TransportRequest {
            method: self.method,
            url: self.url(),
            body: if self.method.sends_body() {
                self.body.clone()
            } else {
                None
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Successful outcome of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Status code of the last page fetched.
    pub status: u16,
    /// The response data. For a single page this is the body unmodified; when
    /// pages were merged it is an array of every page's items in order.
    pub data: Value,
    /// Number of pages fetched.
    pub pages: u32,
}

/// Normalised success/failure result handed to callers that want a uniform
/// shape (e.g. for printing or forwarding as JSON).
///
/// A successful envelope never carries `errors`; a failed one never carries
/// `data`. The fields are private so that invariant cannot be broken.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    success: bool,
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl ResponseEnvelope {
    /// Creates a success envelope.
    pub fn succeeded(status_code: u16, data: Value) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            data: Some(data),
            errors: None,
        }
    }

    /// Creates a failure envelope. `status_code` is `None` when unknown.
    pub fn failed(status_code: Option<u16>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            status_code,
            data: None,
            errors: Some(errors),
        }
    }

    /// Whether the dispatch succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Status code, when known.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Response data (success only).
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Error messages (failure only).
    pub fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }
}

impl From<Result<ApiResponse, DispatchError>> for ResponseEnvelope {
    fn from(result: Result<ApiResponse, DispatchError>) -> Self {
        match result {
            Ok(response) => Self::succeeded(response.status, response.data),
            Err(err) => Self::failed(err.status_code(), err.errors()),
        }
    }
}
