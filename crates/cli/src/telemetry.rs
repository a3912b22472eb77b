//! Tracing subscriber and OpenTelemetry wiring.
//!
//! Logs go to stderr (human-readable or JSON lines) so stdout carries only the
//! response envelope. When `OTEL_EXPORTER_OTLP_ENDPOINT` is set, spans are also
//! exported over OTLP/gRPC; otherwise export is disabled and nothing else
//! changes. The filter is taken from `RUST_LOG` (default `warn`).

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const SERVICE_NAME: &str = "mgmt-client";

/// Holds the tracer provider so pending spans can be flushed on exit.
///
/// Dropping the guard shuts the provider down, so early returns flush too.
pub struct TelemetryGuard {
    tracer_provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    /// Flushes and shuts down the exporter, if one was started.
    pub fn shutdown(mut self) {
        self.shutdown_providers();
    }

    fn shutdown_providers(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        self.shutdown_providers();
    }
}

/// Installs the global subscriber.
pub fn init(json_logs: bool) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let tracer_provider = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => Some(build_tracer_provider(&endpoint)?),
        _ => None,
    };
    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    let fmt_layer = if json_logs {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if tracer_provider.is_some() {
        tracing::info!("OpenTelemetry tracing initialized");
    }

    Ok(TelemetryGuard { tracer_provider })
}

fn build_tracer_provider(endpoint: &str) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to create OTLP span exporter")?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            SERVICE_NAME,
        )]))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_without_provider_is_a_no_op() {
        TelemetryGuard {
            tracer_provider: None,
        }
        .shutdown();
    }

    #[test]
    fn dropping_the_guard_shuts_the_provider_down() {
        let provider = TracerProvider::builder().build();
        drop(TelemetryGuard {
            tracer_provider: Some(provider.clone()),
        });
        assert!(provider.shutdown().is_err());
    }
}
