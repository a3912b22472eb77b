//! Command-line arguments and configuration assembly.
//!
//! Configuration is layered: an optional TOML file provides the base, then
//! flags (or their environment variables) override individual fields.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use protocol::{AuthHeader, BaseUrl, ClientConfig, QueryParams, QueryValue, RequestOptions};

/// Issue one request against the management API and print the response
/// envelope as JSON.
#[derive(Debug, Parser)]
#[command(name = "mgmt-client", version, about, long_about = None)]
pub struct Cli {
    /// HTTP verb: GET, PUT, POST or DELETE (case-insensitive)
    pub method: String,

    /// Resource path relative to the base URL (e.g. /users)
    pub path: String,

    /// Query parameter as NAME=VALUE; repeat a name, or suffix it with [], for a list
    #[arg(short, long = "query", value_name = "NAME=VALUE")]
    pub query: Vec<String>,

    /// JSON request body (ignored for GET)
    #[arg(short, long, value_name = "JSON")]
    pub data: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "MGMT_API_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the API, overriding the configuration file
    #[arg(long, env = "MGMT_API_BASE_URL")]
    pub base_url: Option<BaseUrl>,

    /// Bearer token sent in the Authorization header
    #[arg(long, env = "MGMT_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-call timeout in milliseconds
    #[arg(long, env = "MGMT_API_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Builds and validates the client configuration.
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match (&self.config, &self.base_url) {
            (Some(path), _) => load_config_file(path)?,
            (None, Some(base_url)) => ClientConfig::new(base_url.clone()),
            (None, None) => {
                bail!("no base URL configured: pass --base-url, set MGMT_API_BASE_URL, or use --config")
            }
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.auth = Some(AuthHeader::bearer(token));
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the query and body for the request.
    pub fn request_options(&self) -> anyhow::Result<RequestOptions> {
        let data: Option<serde_json::Value> = self
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("--data is not valid JSON")?;
        Ok(RequestOptions {
            query: parse_query(&self.query)?,
            data,
        })
    }
}

fn load_config_file(path: &Path) -> anyhow::Result<ClientConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse_config(text: &str) -> anyhow::Result<ClientConfig> {
    Ok(toml::from_str(text)?)
}

/// Turns `NAME=VALUE` arguments into query parameters.
///
/// A name given more than once, or written as `NAME[]`, becomes a list in the
/// order the values were given.
pub fn parse_query(pairs: &[String]) -> anyhow::Result<Option<QueryParams>> {
    let mut grouped: Vec<(String, Vec<String>, bool)> = Vec::new();

    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("query parameter '{pair}' must be NAME=VALUE");
        };
        let (name, forced_list) = match name.strip_suffix("[]") {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };
        if name.is_empty() {
            bail!("query parameter '{pair}' has an empty name");
        }

        match grouped.iter_mut().find(|(existing, _, _)| existing == name) {
            Some((_, values, list)) => {
                values.push(value.to_string());
                *list |= forced_list;
            }
            None => grouped.push((name.to_string(), vec![value.to_string()], forced_list)),
        }
    }

    if grouped.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        grouped
            .into_iter()
            .map(|(name, mut values, forced_list)| {
                let value = if forced_list || values.len() > 1 {
                    QueryValue::List(values)
                } else {
                    QueryValue::Scalar(values.remove(0))
                };
                (name, value)
            })
            .collect(),
    ))
}
