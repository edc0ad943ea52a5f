mod cli;
mod config;

use crate::cli::Cli;
use crate::config::ServiceConfig;
use ais_ingester::http::{BarentsWatchClient, BarentsWatchConfig};
use ais_ingester::{AisIngester, AisIngesterConfig};
use ais_runner::Runner;
use clap::Parser;
use common::nats::NatsClient;
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A missing token must stop us before any connection is attempted
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry (tracing + OpenTelemetry for traces and logs)
    let mut telemetry_config =
        TelemetryConfig::new(config.otel_service_name.clone(), config.log_filter());
    if config.otel_enabled {
        telemetry_config = telemetry_config.with_otlp_endpoint(config.otel_endpoint.clone());
    }
    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&telemetry_config) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        nats_url = %config.nats_url,
        base_subject = %config.nats_subject,
        since = ?cli.since,
        "Starting ais-bridge"
    );
    debug!("Configuration: {:?}", config);

    let nats_client = match NatsClient::connect(&config.nats_url, config.nats_connect_timeout()).await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to NATS: {:#}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };
    let publisher = nats_client.create_publisher_client();

    let feed = match BarentsWatchClient::new(BarentsWatchConfig {
        base_url: config.api_base_url.clone(),
        token: config.barentswatch_ais_token.clone(),
        timeout: config.http_timeout(),
    }) {
        Ok(feed) => feed,
        Err(e) => {
            error!("Failed to create BarentsWatch client: {}", e);
            if let Err(e) = publisher.drain().await {
                error!("Failed to drain NATS connection: {:#}", e);
            }
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let ingester = AisIngester::new(
        Arc::new(feed),
        publisher.clone(),
        AisIngesterConfig {
            base_subject: config.nats_subject.clone(),
            flush_interval: config.flush_interval(),
            backfill_since: cli.since,
        },
    );

    let mut runner = Runner::new();
    for (name, process) in ingester.into_runner_processes() {
        runner = runner.with_named_process(name, process);
    }

    // Closers run in order: drain first so buffered reports reach NATS,
    // then flush telemetry
    let result = runner
        .with_closer(move || async move {
            info!("Draining NATS connection");
            publisher.drain().await
        })
        .with_closer(move || async move {
            shutdown_telemetry(telemetry_providers);
            Ok(())
        })
        .with_closer_timeout(config.closer_timeout())
        .run()
        .await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("ais-bridge failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
