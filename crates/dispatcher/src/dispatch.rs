//! The request dispatcher.
//!
//! Every endpoint wrapper funnels through [`RequestDispatcher::dispatch`],
//! which turns one logical "fetch a resource" call into a chain of transport
//! hops:
//!
//! - **Pagination** — while a response carries a `Link: <...>; rel="next"`
//!   header, the continuation is fetched and its items are appended after the
//!   current page's. Pages are fetched strictly one after another.
//! - **Rate limiting** — a 429 response is retried after the `Retry-After`
//!   delay (or the default back-off), at most `max_retries` times per hop.
//!
//! Both are driven by one explicit loop; stack depth does not grow with the
//! number of pages or retries.

use std::sync::Arc;

use protocol::{
    ApiResponse, BaseUrl, ClientConfig, DispatchError, DispatchPolicy, HttpMethod, HttpTransport,
    RequestId, RequestOptions, RequestSpec, RetryPolicy, TransportResponse,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Orchestrates one logical request at a time over a shared transport.
///
/// Holds only read-only configuration, so a single dispatcher can serve any
/// number of concurrent top-level calls.
pub struct RequestDispatcher {
    transport: Arc<dyn HttpTransport>,
    base_url: BaseUrl,
    policy: DispatchPolicy,
}

impl RequestDispatcher {
    /// Creates a dispatcher over `transport`.
    ///
    /// `config.base_url` must be the same base the transport resolves paths
    /// against; `next` links are resolved against it and turned back into
    /// paths when they live under it.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            policy: config.policy.clone(),
        }
    }

    /// Retry and pagination limits in effect.
    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Issues `method path` and follows pagination and rate-limit retries to a
    /// terminal result.
    ///
    /// `method` is matched case-insensitively against GET, PUT, POST and
    /// DELETE; anything else fails with [`DispatchError::InvalidMethod`]
    /// before any network call.
    ///
    /// On success, a single-page response is returned unmodified. When pages
    /// were followed, the data is an array of every page's items in request
    /// order (an array page contributes its elements, any other value
    /// contributes itself), and the status is that of the last page. If any
    /// continuation fails, the whole call fails with
    /// [`DispatchError::Pagination`] and earlier pages are discarded.
    #[tracing::instrument(
        name = "dispatch",
        skip(self, options),
        fields(request_id = %RequestId::new_random())
    )]
    pub async fn dispatch(
        &self,
        method: &str,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, DispatchError> {
        let method: HttpMethod = method.parse()?;
        let mut spec = RequestSpec::new(method, path, options);
        let mut merged: Option<Vec<Value>> = None;
        let mut page: u32 = 1;

        loop {
            let response = match self.send(spec.clone()).await {
                Ok(response) => response,
                Err(err) if page > 1 => {
                    return Err(DispatchError::Pagination {
                        page,
                        source: Box::new(err),
                    })
                }
                Err(err) => return Err(err),
            };

            let next_url = response
                .headers
                .pagination_link()
                .and_then(|link| link.next().map(str::to_owned));

            let Some(next_url) = next_url else {
                let data = match merged {
                    Some(mut items) => {
                        append_page(&mut items, response.data);
                        Value::Array(items)
                    }
                    None => response.data,
                };
                debug!(status = response.status, pages = page, "Dispatch complete");
                return Ok(ApiResponse {
                    status: response.status,
                    data,
                    pages: page,
                });
            };

            let next_path = self.continuation(&spec, &next_url)?;

            if let Some(limit) = self.policy.max_pages {
                if page >= limit {
                    warn!(limit, "Page limit reached with more pages available");
                    return Err(DispatchError::PageLimitExceeded { limit });
                }
            }

            append_page(merged.get_or_insert_with(Vec::new), response.data);
            page += 1;
            debug!(page, path = %next_path, "Following pagination link");
            spec = spec.continuation(next_path);
        }
    }

    /// Resolves a `next` link against the page that carried it.
    ///
    /// Links under the base URL become base-relative paths; links elsewhere
    /// on an allowed host are followed as absolute URLs.
    fn continuation(&self, current: &RequestSpec, link: &str) -> Result<String, DispatchError> {
        let rejected = || DispatchError::UnexpectedContinuation {
            url: link.to_string(),
        };

        let next = self
            .base_url
            .join(&current.url())
            .and_then(|page| page.join(link))
            .map_err(|e| {
                warn!(url = %link, error = %e, "Rejecting unparseable continuation link");
                rejected()
            })?;

        if !self.policy.allows_continuation(&self.base_url, &next) {
            warn!(url = %next, "Rejecting continuation link on a host that is not allowed");
            return Err(rejected());
        }

        Ok(self
            .base_url
            .relative_path(&next)
            .unwrap_or_else(|| next.to_string()))
    }

    /// Performs one hop, retrying rate-limited responses.
    async fn send(&self, mut hop: RequestSpec) -> Result<TransportResponse, DispatchError> {
        loop {
            let request = hop.to_transport_request();
            debug!(
                method = %request.method,
                url = %request.url,
                attempt = hop.attempt,
                "Sending request"
            );

            let err = match self.transport.execute(request).await {
                Ok(response) => {
                    debug!(status = response.status, "Received response");
                    return Ok(response);
                }
                Err(err) => err,
            };

            let RetryPolicy::Retryable { after } = err.retry_policy() else {
                debug!(error = %err, status = ?err.status(), "Request failed");
                return Err(err.into());
            };

            hop = hop.retry();
            if hop.attempt > self.policy.max_retries {
                warn!(
                    path = %hop.path,
                    retries = self.policy.max_retries,
                    "Rate limit retries exhausted"
                );
                return Err(DispatchError::RetriesExhausted {
                    retries: self.policy.max_retries,
                });
            }

            let wait = after.unwrap_or_else(|| self.policy.default_backoff());
            warn!(
                path = %hop.path,
                attempt = hop.attempt,
                wait_ms = wait.as_millis(),
                "Rate limited (429), waiting before retry"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Appends one page's data to the merged result.
fn append_page(items: &mut Vec<Value>, data: Value) {
    match data {
        Value::Array(page) => items.extend(page),
        other => items.push(other),
    }
}
