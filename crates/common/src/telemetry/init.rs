use anyhow::{Context, Result};
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    logs::LoggerProvider, propagation::TraceContextPropagator, runtime, trace::TracerProvider,
    Resource,
};
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::{TelemetryConfig, TelemetryProviders};

/// Install the global tracing subscriber.
///
/// Events are written to stdout as JSON, filtered by `RUST_LOG` when set and
/// by `config.log_filter` otherwise. With an OTLP endpoint configured, spans
/// and events are also exported, and the returned providers must later be
/// passed to [`shutdown_telemetry`].
pub fn init_telemetry(config: &TelemetryConfig) -> Result<Option<TelemetryProviders>> {
    let providers = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| otlp_providers(&config.service_name, endpoint))
        .transpose()?;

    telemetry_subscriber(config, providers.as_ref())
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(providers)
}

/// Build the layered subscriber without installing it.
///
/// The OpenTelemetry layers are present only when `providers` is given.
pub fn telemetry_subscriber(
    config: &TelemetryConfig,
    providers: Option<&TelemetryProviders>,
) -> impl Subscriber + Send + Sync + 'static {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false);

    // the trace layer goes first so exported log records carry the span context
    let trace_layer = providers.map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer_provider.tracer("ais_bridge"))
    });
    let log_layer = providers.map(|p| OpenTelemetryTracingBridge::new(&p.logger_provider));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(trace_layer)
        .with(log_layer)
        .with(fmt_layer)
}

fn otlp_providers(service_name: &str, endpoint: &str) -> Result<TelemetryProviders> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new([KeyValue::new(SERVICE_NAME, service_name.to_string())]);

    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to build OTLP span exporter")?;
    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(span_exporter, runtime::Tokio)
        .with_resource(resource.clone())
        .build();

    let log_exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to build OTLP log exporter")?;
    let logger_provider = LoggerProvider::builder()
        .with_batch_exporter(log_exporter, runtime::Tokio)
        .with_resource(resource)
        .build();

    Ok(TelemetryProviders {
        tracer_provider,
        logger_provider,
    })
}

/// Flush and stop the OTLP pipelines, if any were started
pub fn shutdown_telemetry(providers: Option<TelemetryProviders>) {
    if let Some(providers) = providers {
        providers.shutdown();
    }
}
