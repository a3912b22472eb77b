//! Management API CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — flags and environment variables, layered over
//!    an optional TOML file (see [`config::Cli`]).
//! 2. **Wire observability** — `tracing-subscriber` on stderr plus an optional
//!    OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure** — a [`http_transport::ReqwestTransport`]
//!    injected into a [`dispatcher::ApiClient`].
//! 4. **Issue one request** and print its [`protocol::ResponseEnvelope`] as
//!    JSON on stdout.
//!
//! Exit status: 0 on success, 1 when the API call failed, 2 when the CLI
//! could not run (bad arguments or configuration).

mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dispatcher::ApiClient;
use http_transport::ReqwestTransport;
use tracing::info;

use crate::config::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the API call succeeded.
///
/// The telemetry guard flushes spans when it is dropped, including on early
/// error returns.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let telemetry = telemetry::init(cli.json_logs)?;

    let config = cli.client_config()?;
    let options = cli.request_options()?;
    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let client = ApiClient::new(transport, &config)?;

    info!(
        base_url = %config.base_url,
        method = %cli.method,
        path = %cli.path,
        "Issuing request"
    );
    let envelope = client.envelope(&cli.method, &cli.path, options).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    telemetry.shutdown();
    Ok(envelope.success())
}
