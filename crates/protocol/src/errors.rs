//! Error and retry-policy types for the management API client.
//!
//! [`TransportError`] is what an [`crate::HttpTransport`] reports for one failed
//! exchange. [`DispatchError`] is what the dispatcher surfaces to callers once
//! a logical request has reached a terminal failure. [`ConfigError`] covers
//! invalid client configuration detected at construction time.
//!
//! [`RetryPolicy`] is the bridge between the two: a transport failure decides
//! whether it is safe to retry and after what delay; the dispatcher only
//! enforces the retry budget.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::rate_limit::{parse_retry_after, RATE_LIMIT_STATUS};
use crate::transport::ResponseHeaders;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Only rate-limit responses are retryable. Every other transport failure
/// (network errors, timeouts, non-429 statuses) is surfaced as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt, derived from the
        /// `Retry-After` response header. `None` means the caller applies its
        /// own default back-off.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failure reported by an [`crate::HttpTransport`] for a single exchange.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response headers (used for `Retry-After`).
        headers: ResponseHeaders,
        /// Response body, when it could be decoded as JSON.
        body: Option<Value>,
    },

    /// The exchange did not complete within the configured per-call timeout.
    #[error("Request timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The request could not be sent or the response could not be read.
    #[error("Transport failure: {message}")]
    Network {
        /// Description of the underlying failure.
        message: String,
    },
}

impl TransportError {
    /// Returns the HTTP status carried by this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Timeout { .. } | Self::Network { .. } => None,
        }
    }

    /// Decides whether this failure may be retried.
    ///
    /// A 429 response is retryable after the delay given by its `Retry-After`
    /// header (or after the caller's default when the header is absent or
    /// unparseable). Everything else is non-retryable.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Status {
                status, headers, ..
            } if *status == RATE_LIMIT_STATUS => RetryPolicy::Retryable {
                after: headers
                    .get("retry-after")
                    .and_then(|value| parse_retry_after(value, Utc::now())),
            },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Terminal failure of one logical dispatch.
///
/// Intermediate retries and pagination hops are invisible to callers; only
/// the final outcome of the whole chain is reported here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// The caller passed a verb other than GET, PUT, POST or DELETE.
    ///
    /// Produced before any network call; never retried.
    #[error("Invalid method")]
    InvalidMethod {
        /// The rejected verb, as supplied.
        method: String,
    },

    /// The server kept answering 429 after the maximum number of retries.
    #[error("Rate limit retries exhausted after {retries} retries")]
    RetriesExhausted {
        /// Number of retries performed beyond the initial attempt.
        retries: u32,
    },

    /// Any other transport failure (non-429 status, timeout, network error).
    #[error("{message}")]
    Transport {
        /// HTTP status, when the failure carried one.
        status: Option<u16>,
        /// Structured error messages from the response body, when present.
        errors: Option<Vec<String>>,
        /// Description of the failure.
        message: String,
    },

    /// A pagination continuation failed. Data already fetched from earlier
    /// pages is discarded.
    #[error("Page {page} failed: {source}")]
    Pagination {
        /// One-based number of the page that failed.
        page: u32,
        /// Failure of that page.
        #[source]
        source: Box<DispatchError>,
    },

    /// The server supplied a `next` link that cannot be resolved, or that
    /// points at a host the dispatch policy does not allow.
    #[error("Continuation link '{url}' is not allowed")]
    UnexpectedContinuation {
        /// The rejected continuation URL.
        url: String,
    },

    /// More pages were linked than the configured page ceiling allows.
    #[error("Pagination exceeded the limit of {limit} pages")]
    PageLimitExceeded {
        /// The configured ceiling.
        limit: u32,
    },
}

impl DispatchError {
    /// HTTP status associated with this failure, when one is known.
    ///
    /// `None` means the status is unknown; it must not be read as "not found".
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RetriesExhausted { .. } => Some(RATE_LIMIT_STATUS),
            Self::Transport { status, .. } => *status,
            Self::Pagination { source, .. } => source.status_code(),
            Self::InvalidMethod { .. }
            | Self::UnexpectedContinuation { .. }
            | Self::PageLimitExceeded { .. } => None,
        }
    }

    /// Error messages to report to the caller.
    ///
    /// Structured errors from the server are returned unchanged; otherwise the
    /// failure's own description is used.
    pub fn errors(&self) -> Vec<String> {
        match self {
            Self::Transport {
                errors: Some(errors),
                ..
            } => errors.clone(),
            Self::Pagination { source, .. } => source.errors(),
            other => vec![other.to_string()],
        }
    }

    /// Whether the caller may reasonably issue the same request again later.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RetriesExhausted { .. } => RetryPolicy::Retryable { after: None },
            Self::Pagination { source, .. } => source.retry_policy(),
            _ => RetryPolicy::NonRetryable,
        }
    }
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        let message = err.to_string();
        match err {
            TransportError::Status { status, body, .. } => Self::Transport {
                status: Some(status),
                errors: body.as_ref().and_then(extract_errors),
                message,
            },
            TransportError::Timeout { .. } | TransportError::Network { .. } => Self::Transport {
                status: None,
                errors: None,
                message,
            },
        }
    }
}

/// Pulls the `errors` list out of an error response body.
///
/// Entries may be plain strings or objects with a `message` field; any other
/// entry is rendered as its JSON text. A bare string `errors` value becomes a
/// one-element list.
pub fn extract_errors(body: &Value) -> Option<Vec<String>> {
    match body.get("errors")? {
        Value::Array(entries) => Some(
            entries
                .iter()
                .map(|entry| match entry {
                    Value::String(text) => text.clone(),
                    Value::Object(fields) => match fields.get("message") {
                        Some(Value::String(text)) => text.clone(),
                        _ => entry.to_string(),
                    },
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(text) => Some(vec![text.clone()]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// The client configuration is invalid.
///
/// Produced at construction time; a client never starts with an invalid config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No base URL was configured.
    #[error("Base URL must not be empty")]
    EmptyBaseUrl,

    /// The base URL could not be parsed.
    #[error("Base URL '{url}' is invalid: {reason}")]
    InvalidBaseUrl {
        /// The rejected base URL.
        url: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The base URL does not use http or https.
    #[error("Base URL '{url}' must start with http:// or https://")]
    UnsupportedScheme {
        /// The rejected base URL.
        url: String,
    },

    /// The per-call timeout is zero.
    #[error("Timeout must be greater than zero")]
    ZeroTimeout,

    /// The auth header name is empty.
    #[error("Auth header name must not be empty")]
    EmptyAuthHeaderName,
}
