//! Management API request dispatcher.
//!
//! This crate provides [`RequestDispatcher`], the single routine every
//! endpoint wrapper funnels through, and [`ApiClient`], the facade those
//! wrappers call.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The dispatcher sequences calls to the
//! [`protocol::HttpTransport`] port: it follows pagination links, waits out
//! rate limits, and normalises failures. It performs no I/O itself and holds
//! no endpoint knowledge.

mod client;
mod dispatch;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use dispatch::RequestDispatcher;
