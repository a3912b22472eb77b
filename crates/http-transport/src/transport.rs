//! The [`ReqwestTransport`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use protocol::{
    BaseUrl, ClientConfig, ConfigError, HttpMethod, HttpTransport, ResponseHeaders,
    TransportError, TransportRequest, TransportResponse,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Failure to construct a [`ReqwestTransport`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// The client configuration did not validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The auth header name or value cannot be sent over HTTP.
    #[error("Auth header '{name}' is not a valid HTTP header")]
    InvalidHeader {
        /// The configured header name.
        name: String,
    },

    /// `reqwest` rejected the client settings (e.g. TLS backend failure).
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP transport over a pooled [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: BaseUrl,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Builds a transport from `config`.
    ///
    /// The auth header value is marked sensitive so it is redacted from
    /// `reqwest`'s own debug output.
    pub fn new(config: &ClientConfig) -> Result<Self, BuildError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(auth) = &config.auth {
            let invalid = || BuildError::InvalidHeader {
                name: auth.name.clone(),
            };
            let name = HeaderName::from_bytes(auth.name.as_bytes()).map_err(|_| invalid())?;
            let mut value = HeaderValue::from_str(&auth.value).map_err(|_| invalid())?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        })
    }

    /// Resolves a dispatcher URL (path plus query) against the base URL.
    /// Absolute URLs from pagination links are used as they are.
    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(url)
            .map_err(|e| TransportError::Network {
                message: format!("invalid request URL '{url}': {e}"),
            })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout: self.timeout,
            }
        } else {
            TransportError::Network {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(&request.url)?;
        trace!(method = %request.method, url = %url, "HTTP request");
        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let body = decode_body(&bytes);
        trace!(status = status.as_u16(), bytes = bytes.len(), "HTTP response");

        if status.is_success() {
            Ok(TransportResponse {
                status: status.as_u16(),
                headers,
                data: body.unwrap_or(Value::Null),
            })
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                headers,
                body,
            })
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn collect_headers(map: &HeaderMap) -> ResponseHeaders {
    let mut headers = ResponseHeaders::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value);
        }
    }
    headers
}

/// Decodes a response body: JSON when possible, otherwise the raw text.
/// An empty body decodes to `None`.
fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use protocol::AuthHeader;
    use serde_json::json;

    use super::*;

    fn transport(base_url: &str) -> ReqwestTransport {
        ReqwestTransport::new(&ClientConfig::parse(base_url).unwrap()).unwrap()
    }

    #[test]
    fn resolve_joins_paths_and_queries() {
        let transport = transport("https://api.example.com/v2/");
        let resolve = |url: &str| transport.resolve(url).unwrap().to_string();
        assert_eq!(resolve("/items"), "https://api.example.com/v2/items");
        assert_eq!(resolve("items"), "https://api.example.com/v2/items");
        assert_eq!(resolve("/items?ids[]=1&ids[]=2"), "https://api.example.com/v2/items?ids[]=1&ids[]=2");
        assert_eq!(resolve("?cursor=a"), "https://api.example.com/v2/?cursor=a");
    }

    #[test]
    fn resolve_keeps_absolute_urls() {
        let transport = transport(" https://api.example.com/v2 ");
        assert_eq!(
            transport
                .resolve("https://n143.example.com/v2/items?cursor=2")
                .unwrap()
                .to_string(),
            "https://n143.example.com/v2/items?cursor=2"
        );
    }

    #[test]
    fn invalid_auth_header_is_rejected() {
        let config = ClientConfig::parse("https://api.example.com")
            .unwrap()
            .with_auth(AuthHeader::custom("bad header", "x"));
        assert!(matches!(
            ReqwestTransport::new(&config),
            Err(BuildError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            ReqwestTransport::new(
                &ClientConfig::parse("https://api.example.com")
                    .unwrap()
                    .with_timeout(Duration::ZERO)
            ),
            Err(BuildError::Config(ConfigError::ZeroTimeout))
        ));
    }

    #[test]
    fn decode_body_variants() {
        assert_eq!(decode_body(b""), None);
        assert_eq!(decode_body(b"  \n"), None);
        assert_eq!(decode_body(br#"{"a":1}"#), Some(json!({ "a": 1 })));
        assert_eq!(decode_body(b"Too Many Requests"), Some(json!("Too Many Requests")));
    }
}
