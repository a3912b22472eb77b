//! Domain types and ports for the management API client.
//!
//! This crate contains every value type, wire convention and error type the
//! request dispatcher works with, plus the [`HttpTransport`] port it calls.
//! Endpoint wrappers and transports depend on this crate; they never add
//! dispatch rules of their own.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a transport must do; the `http-transport` crate defines
//! *how* over `reqwest`.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | [`RequestId`] correlation newtype |
//! | [`types`] | `HttpMethod`, `RequestOptions`, `RequestSpec`, `ApiResponse`, `ResponseEnvelope` |
//! | [`query`] | Query-string encoding |
//! | [`base_url`] | [`BaseUrl`] parsing and path resolution |
//! | [`pagination`] | `Link` header parsing |
//! | [`rate_limit`] | 429 status and `Retry-After` parsing |
//! | [`transport`] | The [`HttpTransport`] port and its request/response types |
//! | [`config`] | `ClientConfig`, `DispatchPolicy`, `AuthHeader` |
//! | [`errors`] | `DispatchError`, `TransportError`, `ConfigError`, `RetryPolicy` |

pub mod base_url;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod pagination;
pub mod query;
pub mod rate_limit;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use base_url::BaseUrl;
pub use config::{AuthHeader, ClientConfig, DispatchPolicy};
pub use errors::{extract_errors, ConfigError, DispatchError, RetryPolicy, TransportError};
pub use identifiers::RequestId;
pub use pagination::PaginationLink;
pub use query::{encode_query, QueryParams, QueryValue};
pub use rate_limit::{parse_retry_after, RATE_LIMIT_STATUS};
pub use transport::{HttpTransport, ResponseHeaders, TransportRequest, TransportResponse};
pub use types::{ApiResponse, HttpMethod, RequestOptions, RequestSpec, ResponseEnvelope};
