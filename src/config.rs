//! Layered configuration: built-in defaults, an optional YAML file, then
//! `PIZZA__*` environment variables (e.g. `PIZZA__METRICS__API_KEY`).

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TelemetryError};

/// File consulted when `PIZZA_METRICS_CONFIG` is unset. The extension is
/// resolved by the `config` crate, so `pizza-metrics.yaml` is picked up.
pub const DEFAULT_CONFIG_FILE: &str = "pizza-metrics";

const ENV_PREFIX: &str = "PIZZA";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where and how often the aggregated batch is pushed.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Metrics backend endpoint that accepts line-protocol batches.
    pub url: String,
    /// Value of the `source` tag stamped on every sample.
    pub source: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_flush_interval_ms", alias = "flushIntervalMs")]
    pub flush_interval_ms: u64,
    /// Upper bound on a single send, so overlapping flushes cannot pile up.
    #[serde(default = "default_send_timeout_ms", alias = "sendTimeoutMs")]
    pub send_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_flush_interval_ms() -> u64 {
    10_000
}
fn default_send_timeout_ms() -> u64 {
    5_000
}
fn default_listen() -> String {
    "0.0.0.0:3000".into()
}

impl AppConfig {
    /// Load from the config file (if present) and the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var("PIZZA_METRICS_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let cfg = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| TelemetryError::Config(e.to_string()))?;

        Self::finish(cfg)
    }

    /// Parse a YAML document directly; environment variables are ignored.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Yaml))
            .build()
            .map_err(|e| TelemetryError::Config(e.to_string()))?;

        Self::finish(cfg)
    }

    fn finish(cfg: config::Config) -> Result<Self> {
        let parsed: Self = cfg
            .try_deserialize()
            .map_err(|e| TelemetryError::Config(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.metrics.url).map_err(|e| {
            TelemetryError::Config(format!("metrics.url \"{}\": {e}", self.metrics.url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TelemetryError::Config(format!(
                "metrics.url must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.metrics.source.trim().is_empty() {
            return Err(TelemetryError::Config("metrics.source must not be empty".into()));
        }
        if self.metrics.flush_interval_ms == 0 {
            return Err(TelemetryError::Config(
                "metrics.flush_interval_ms must be positive".into(),
            ));
        }
        if self.metrics.send_timeout_ms == 0 {
            return Err(TelemetryError::Config(
                "metrics.send_timeout_ms must be positive".into(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen.parse().map_err(|e| {
            TelemetryError::Config(format!("server.listen \"{}\": {e}", self.server.listen))
        })
    }
}

impl MetricsConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}
