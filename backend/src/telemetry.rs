//! Log output for the loyalty server, plus span export to an OTLP collector
//! when `OTEL_EXPORTER_OTLP_ENDPOINT` is configured.
//!
//! Ledger and directory services log through `tracing` only; this module is
//! the single place a subscriber is installed.

use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::{AppError, Result};

/// `service.name` reported to the collector and the exported tracer name
pub const SERVICE_NAME: &str = "loyalty-backend";

const DEFAULT_FILTER: &str = "loyalty_backend=debug,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until shutdown; dropping it flushes
/// buffered ledger spans to the collector.
pub fn init_tracing(config: &Config) -> Result<Option<OtelGuard>> {
    let provider = config
        .otel_endpoint
        .as_deref()
        .map(|endpoint| tracer_provider(endpoint, config))
        .transpose()?;

    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    if let Some(endpoint) = &config.otel_endpoint {
        tracing::info!(otel_endpoint = %endpoint, "Exporting spans over OTLP");
    }

    Ok(provider.map(|provider| OtelGuard { provider }))
}

fn tracer_provider(endpoint: &str, config: &Config) -> Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| AppError::Config(format!("OTLP exporter for {}: {}", endpoint, e)))?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("loyalty.store_backend", config.store_backend.as_str()),
        ])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .build())
}

/// Flushes and stops span export when dropped.
pub struct OtelGuard {
    provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("OTLP span export did not shut down cleanly: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER).unwrap();
        assert!(filter.to_string().contains("loyalty_backend=debug"));
    }
}
