//! `reqwest`-backed HTTP transport for the management API client.
//!
//! Implements the [`protocol::HttpTransport`] port over a single pooled
//! [`reqwest::Client`]. Everything the dispatcher treats as fixed
//! configuration lives here: the base URL, the per-call timeout, the
//! `User-Agent`, and the authentication header.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection pooling, TLS, header encoding and body
//! decoding all live here. The `dispatcher` crate sees only
//! [`protocol::HttpTransport`].

mod transport;

pub use transport::{BuildError, ReqwestTransport};
