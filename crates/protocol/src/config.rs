//! Client configuration.
//!
//! A client is constructed once with a fixed base URL, timeout and
//! authentication header; these are read-only for the client's lifetime.
//! All fields except `base_url` have defaults so a minimal TOML document such
//! as `base_url = "https://api.example.com/v2"` is a complete configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{BaseUrl, ConfigError};

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    concat!("mgmt-client/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_retries() -> u32 {
    10
}

fn default_backoff_ms() -> u64 {
    5_000
}

fn default_auth_header_name() -> String {
    "Authorization".to_string()
}

// ---------------------------------------------------------------------------
// Dispatch policy
// ---------------------------------------------------------------------------

/// Retry and pagination limits applied by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPolicy {
    /// Maximum number of rate-limit retries per hop (default: 10).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Back-off used when a 429 carries no usable `Retry-After` (default: 5000).
    #[serde(default = "default_backoff_ms")]
    pub default_backoff_ms: u64,

    /// Maximum number of pages followed for one dispatch. `None` (the default)
    /// follows `next` links until the server stops sending them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    /// Extra hosts, besides the base URL's host, that pagination links may
    /// point at. Subdomains of every listed host are allowed too.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_hosts: Vec<String>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            default_backoff_ms: default_backoff_ms(),
            max_pages: None,
            allowed_hosts: Vec::new(),
        }
    }
}

impl DispatchPolicy {
    /// Default back-off as a [`Duration`].
    pub fn default_backoff(&self) -> Duration {
        Duration::from_millis(self.default_backoff_ms)
    }

    /// Sets the retry cap.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the page ceiling.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Allows pagination links on `host` and its subdomains.
    #[must_use]
    pub fn with_allowed_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into());
        self
    }

    /// Whether a pagination link may be followed from `base`.
    ///
    /// The link must use the base URL's scheme, and its host must be the
    /// base host, an allowed host, or a subdomain of either. The auth header
    /// is sent to every followed link.
    pub fn allows_continuation(&self, base: &BaseUrl, url: &Url) -> bool {
        if url.scheme() != base.as_url().scheme() {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        std::iter::once(base.host())
            .chain(self.allowed_hosts.iter().map(String::as_str))
            .any(|allowed| host_matches(host, allowed))
    }
}

fn host_matches(host: &str, allowed: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let allowed = allowed.trim().trim_end_matches('.').to_ascii_lowercase();
    !allowed.is_empty() && (host == allowed || host.ends_with(&format!(".{allowed}")))
}

// ---------------------------------------------------------------------------
// Authentication header
// ---------------------------------------------------------------------------

/// Fixed header attached to every outgoing request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHeader {
    /// Header name (default: `Authorization`).
    #[serde(default = "default_auth_header_name")]
    pub name: String,
    /// Header value, sent verbatim.
    pub value: String,
}

impl AuthHeader {
    /// `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        Self {
            name: default_auth_header_name(),
            value: format!("Bearer {token}"),
        }
    }

    /// A custom header such as `X-Api-Key`.
    pub fn custom(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &self.name)
            .field("value", &mask_credential(&self.value))
            .finish()
    }
}

/// Mask sensitive credential values for logging
fn mask_credential(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 12 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Everything needed to construct a transport and dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against
    /// (e.g. `https://api.example.com/v2`).
    pub base_url: BaseUrl,

    /// Per-call timeout in milliseconds (default: 30000). Each pagination or
    /// retry hop gets a fresh budget.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Authentication header, if the API requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthHeader>,

    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retry and pagination limits.
    #[serde(default)]
    pub policy: DispatchPolicy,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the base URL.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout_ms: default_timeout_ms(),
            auth: None,
            user_agent: default_user_agent(),
            policy: DispatchPolicy::default(),
        }
    }

    /// Parses `base_url` and creates a configuration with defaults.
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(BaseUrl::parse(base_url)?))
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the authentication header.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthHeader) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets the dispatch policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the configuration before any client is built from it.
    ///
    /// The base URL is already validated when it is parsed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(auth) = &self.auth {
            if auth.name.trim().is_empty() {
                return Err(ConfigError::EmptyAuthHeaderName);
            }
        }
        Ok(())
    }
}
