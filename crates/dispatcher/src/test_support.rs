//! Scripted in-memory transport for dispatcher tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use protocol::{
    HttpTransport, ResponseHeaders, TransportError, TransportRequest, TransportResponse,
};
use tokio::time::Instant;

pub const BASE_URL: &str = "https://api.example.com/v2";

type Outcome = Result<TransportResponse, TransportError>;

/// Replays a fixed sequence of outcomes and records every request it sees.
///
/// Once the script is exhausted the `fallback` outcome (if any) is repeated;
/// without one, further calls fail with a network error.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Option<Outcome>,
    seen: Mutex<Vec<(Instant, TransportRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn repeating(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(outcome),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Time elapsed between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let seen = self.seen.lock().unwrap();
        seen.windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].0))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen.lock().unwrap().push((Instant::now(), request));
        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(outcome) => outcome,
            None => Err(TransportError::Network {
                message: "script exhausted".into(),
            }),
        }
    }
}

/// A `Link` header value pointing at `path` under [`BASE_URL`].
pub fn link_next(path: &str) -> String {
    format!("<{BASE_URL}{path}>; rel=\"next\"")
}

/// A 429 failure, optionally carrying `Retry-After`.
pub fn rate_limited(retry_after: Option<&str>) -> TransportError {
    let mut headers = ResponseHeaders::new();
    if let Some(value) = retry_after {
        headers.append("Retry-After", value);
    }
    TransportError::Status {
        status: 429,
        headers,
        body: Some(serde_json::json!({ "errors": ["Too many requests"] })),
    }
}
