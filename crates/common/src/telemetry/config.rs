use opentelemetry_sdk::{logs::LoggerProvider, trace::TracerProvider};

/// Where logs and traces go
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `ais_ingester=debug`
    pub log_filter: String,
    /// OTLP/gRPC collector endpoint. `None` keeps telemetry on stdout only.
    pub otlp_endpoint: Option<String>,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>, log_filter: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_filter: log_filter.into(),
            otlp_endpoint: None,
        }
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new("ais-bridge", "info")
    }
}

/// OTLP pipelines started by [`crate::telemetry::init_telemetry`].
///
/// Batches still buffered are lost unless [`TelemetryProviders::shutdown`] runs.
pub struct TelemetryProviders {
    pub tracer_provider: TracerProvider,
    pub logger_provider: LoggerProvider,
}

impl TelemetryProviders {
    pub fn shutdown(self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Error shutting down tracer provider: {:?}", e);
        }
        if let Err(e) = self.logger_provider.shutdown() {
            eprintln!("Error shutting down logger provider: {:?}", e);
        }
    }
}
