use anyhow::{bail, Context};
use common::garde::format_validation_errors;
use config::{Config, Environment};
use garde::Validate;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Validate)]
pub struct ServiceConfig {
    /// BarentsWatch API bearer token (required)
    #[serde(default)]
    #[garde(length(min = 1))]
    pub barentswatch_ais_token: String,

    /// BarentsWatch live API base URL
    #[serde(default = "default_api_base_url")]
    #[garde(length(min = 1))]
    pub api_base_url: String,

    /// Timeout in seconds for connecting and for the backfill request
    #[serde(default = "default_http_timeout_secs")]
    #[garde(range(min = 1))]
    pub http_timeout_secs: u64,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    #[garde(length(min = 1))]
    pub nats_url: String,

    /// Base subject; reports are published to `{nats_subject}.{mmsi}`
    #[serde(default = "default_nats_subject")]
    #[garde(custom(validate_base_subject))]
    pub nats_subject: String,

    /// Seconds between periodic flushes of the NATS connection
    #[serde(default = "default_flush_interval")]
    #[garde(custom(validate_flush_interval))]
    pub flush_interval: f64,

    /// NATS connection timeout in seconds
    #[serde(default = "default_nats_connect_timeout_secs")]
    #[garde(range(min = 1))]
    pub nats_connect_timeout_secs: u64,

    /// Upper bound in seconds for all shutdown closers together
    #[serde(default = "default_closer_timeout_secs")]
    #[garde(range(min = 1))]
    pub closer_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    #[garde(skip)]
    pub log_level: String,

    // OpenTelemetry configuration
    #[serde(default)]
    #[garde(skip)]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_endpoint")]
    #[garde(skip)]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_service_name")]
    #[garde(skip)]
    pub otel_service_name: String,
}

impl ServiceConfig {
    /// Load from the process environment and validate.
    ///
    /// Fails before anything touches the network if the token is absent.
    pub fn from_env() -> anyhow::Result<Self> {
        let config: ServiceConfig = Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
            .context("Failed to read configuration from environment")?;

        if config.barentswatch_ais_token.trim().is_empty() {
            bail!("Missing env var BARENTSWATCH_AIS_TOKEN");
        }

        config
            .validate()
            .map_err(|report| anyhow::anyhow!("Invalid configuration: {}", format_validation_errors(&report)))?;

        Ok(config)
    }

    /// Tracing filter for `log_level`; `WARNING` and `CRITICAL` are accepted
    /// as aliases for `warn` and `error`.
    pub fn log_filter(&self) -> String {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn nats_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.nats_connect_timeout_secs)
    }

    pub fn closer_timeout(&self) -> Duration {
        Duration::from_secs(self.closer_timeout_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs_f64(self.flush_interval)
    }
}

// Keeps the token out of logs
impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("barentswatch_ais_token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("nats_url", &self.nats_url)
            .field("nats_subject", &self.nats_subject)
            .field("flush_interval", &self.flush_interval)
            .field("nats_connect_timeout_secs", &self.nats_connect_timeout_secs)
            .field("closer_timeout_secs", &self.closer_timeout_secs)
            .field("log_level", &self.log_level)
            .field("otel_enabled", &self.otel_enabled)
            .field("otel_endpoint", &self.otel_endpoint)
            .field("otel_service_name", &self.otel_service_name)
            .finish()
    }
}

fn validate_base_subject(value: &str, _ctx: &()) -> garde::Result {
    if value.is_empty() {
        return Err(garde::Error::new("must not be empty"));
    }
    if value.chars().any(|c| c.is_whitespace() || c == '*' || c == '>') {
        return Err(garde::Error::new(
            "must be a literal subject without wildcards or whitespace",
        ));
    }
    if value.starts_with('.') || value.ends_with('.') || value.contains("..") {
        return Err(garde::Error::new("must not contain empty tokens"));
    }
    Ok(())
}

fn validate_flush_interval(value: &f64, _ctx: &()) -> garde::Result {
    // Duration::from_secs_f64 panics outside this range
    if value.is_finite() && *value > 0.0 && *value < u64::MAX as f64 {
        Ok(())
    } else {
        Err(garde::Error::new("must be a positive number of seconds"))
    }
}

fn default_api_base_url() -> String {
    ais_ingester::http::DEFAULT_API_BASE_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_nats_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_nats_subject() -> String {
    "raw_ais".to_string()
}

fn default_flush_interval() -> f64 {
    5.0
}

fn default_nats_connect_timeout_secs() -> u64 {
    30
}

fn default_closer_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "ais-bridge".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "BARENTSWATCH_AIS_TOKEN",
        "NATS_URL",
        "NATS_SUBJECT",
        "FLUSH_INTERVAL",
        "LOG_LEVEL",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        let err = ServiceConfig::from_env().unwrap_err();

        assert!(err.to_string().contains("BARENTSWATCH_AIS_TOKEN"));
    }

    #[test]
    fn test_defaults_with_token() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BARENTSWATCH_AIS_TOKEN", "secret-token");

        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.barentswatch_ais_token, "secret-token");
        assert_eq!(config.nats_url, "nats://127.0.0.1:4222");
        assert_eq!(config.nats_subject, "raw_ais");
        assert_eq!(config.flush_interval(), Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));

        clear_env();
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BARENTSWATCH_AIS_TOKEN", "secret-token");
        std::env::set_var("NATS_URL", "nats://nats.internal:4222");
        std::env::set_var("NATS_SUBJECT", "ais.norway");
        std::env::set_var("FLUSH_INTERVAL", "0.5");
        std::env::set_var("LOG_LEVEL", "debug");

        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.nats_url, "nats://nats.internal:4222");
        assert_eq!(config.nats_subject, "ais.norway");
        assert_eq!(config.flush_interval(), Duration::from_millis(500));
        assert_eq!(config.log_level, "debug");

        clear_env();
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let _lock = TEST_LOCK.lock().unwrap();

        for (var, value) in [
            ("FLUSH_INTERVAL", "0"),
            ("FLUSH_INTERVAL", "-1.5"),
            ("NATS_SUBJECT", "raw_ais.>"),
            ("NATS_SUBJECT", "raw ais"),
        ] {
            clear_env();
            std::env::set_var("BARENTSWATCH_AIS_TOKEN", "secret-token");
            std::env::set_var(var, value);

            let result = ServiceConfig::from_env();

            assert!(result.is_err(), "{}={} should be rejected", var, value);
        }

        clear_env();
    }

    #[test]
    fn test_log_level_aliases() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BARENTSWATCH_AIS_TOKEN", "secret-token");

        for (level, filter) in [("WARNING", "warn"), ("CRITICAL", "error"), ("Debug", "debug")] {
            std::env::set_var("LOG_LEVEL", level);
            let config = ServiceConfig::from_env().unwrap();
            assert_eq!(config.log_filter(), filter);
        }

        clear_env();
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BARENTSWATCH_AIS_TOKEN", "secret-token");

        let config = ServiceConfig::from_env().unwrap();

        assert!(!format!("{:?}", config).contains("secret-token"));

        clear_env();
    }
}
