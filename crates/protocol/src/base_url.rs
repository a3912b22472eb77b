//! The API base URL and request-path resolution against it.
//!
//! Request paths are written relative to the base (`/users/7` under
//! `https://api.example.com/v2` is `https://api.example.com/v2/users/7`), while
//! pagination links may be absolute, root-relative or relative to the page
//! that carried them. [`BaseUrl`] handles all three with [`url::Url`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// A parsed, validated `http`/`https` base URL.
///
/// The stored path always ends with `/` so that joining a request path
/// appends to it rather than replacing its last segment. [`fmt::Display`]
/// prints it without that trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parses a base URL. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let mut url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                url: trimmed.to_string(),
            });
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: "missing host".to_string(),
            });
        }

        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self(url))
    }

    /// The underlying URL (path ends with `/`).
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Host name of the base URL.
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Resolves a dispatcher path against the base.
    ///
    /// An absolute `http`/`https` URL is returned unchanged. Anything else is
    /// taken relative to the base path, with or without a leading `/`.
    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }
        self.0.join(&format!("./{}", path.trim_start_matches('/')))
    }

    /// Rewrites `url` as a path relative to the base when it lives under it.
    ///
    /// Returns `None` for a different scheme, host or port, or a path outside
    /// the base path.
    pub fn relative_path(&self, url: &Url) -> Option<String> {
        if url.scheme() != self.0.scheme()
            || url.host_str() != self.0.host_str()
            || url.port_or_known_default() != self.0.port_or_known_default()
        {
            return None;
        }

        let base_path = self.0.path().trim_end_matches('/');
        let rest = url.path().strip_prefix(base_path)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }

        let mut path = rest.to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        Some(path)
    }
}

impl FromStr for BaseUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BaseUrl> for String {
    fn from(value: BaseUrl) -> Self {
        value.to_string()
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}
