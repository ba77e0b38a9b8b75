// crates/server/src/config.rs
//! Server configuration from command-line flags and environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::jobs::RunSettings;
use crate::log_sink::DEFAULT_LOG_CAPACITY;

/// optimizer-hub: run the cost optimizer in the background and follow it over HTTP.
///
/// | Flag                     | Env var                          | Default                 |
/// |--------------------------|----------------------------------|-------------------------|
/// | `--host`                 | `OPTIMIZER_HUB_HOST`             | `0.0.0.0`               |
/// | `--port`                 | `OPTIMIZER_HUB_PORT`             | `5000`                  |
/// | `--analyzer`             | `OPTIMIZER_HUB_ANALYZER`         | `azure-cost-optimizer`  |
/// | `--analyzer-arg`         |                                  | none                    |
/// | `--default-timeout-secs` | `OPTIMIZER_HUB_TIMEOUT_SECS`     | `3600`                  |
/// | `--poll-interval-secs`   | `OPTIMIZER_HUB_POLL_SECS`        | `5`                     |
/// | `--log-capacity`         | `OPTIMIZER_HUB_LOG_CAPACITY`     | `10000`                 |
/// | `--stream-interval-ms`   | `OPTIMIZER_HUB_STREAM_INTERVAL_MS` | `1000`                |
#[derive(Debug, Clone, Parser)]
#[command(name = "optimizer-hub", version)]
pub struct ServerConfig {
    /// Bind address.
    #[arg(long, env = "OPTIMIZER_HUB_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port.
    #[arg(long, env = "OPTIMIZER_HUB_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Program that performs the analysis.
    #[arg(long, env = "OPTIMIZER_HUB_ANALYZER", default_value = "azure-cost-optimizer")]
    pub analyzer: String,

    /// Extra argument passed to the analyzer before `--mode` (repeatable).
    #[arg(long = "analyzer-arg", allow_hyphen_values = true)]
    pub analyzer_args: Vec<String>,

    /// Run deadline when a request does not specify `timeout`.
    #[arg(long, env = "OPTIMIZER_HUB_TIMEOUT_SECS", default_value_t = 3600)]
    pub default_timeout_secs: u64,

    /// Pause between re-invocations while the analyzer reports a pending result.
    #[arg(long, env = "OPTIMIZER_HUB_POLL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Log lines held for the log stream before the oldest is dropped.
    #[arg(long, env = "OPTIMIZER_HUB_LOG_CAPACITY", default_value_t = DEFAULT_LOG_CAPACITY)]
    pub log_capacity: usize,

    /// How often the log stream drains one line.
    #[arg(long, env = "OPTIMIZER_HUB_STREAM_INTERVAL_MS", default_value_t = 1000)]
    pub stream_interval_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid bind address {0}")]
    InvalidAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("analyzer program must not be empty")]
    EmptyAnalyzer,
}

impl ServerConfig {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyzer.trim().is_empty() {
            return Err(ConfigError::EmptyAnalyzer);
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Zero("poll-interval-secs"));
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::Zero("log-capacity"));
        }
        if self.stream_interval_ms == 0 {
            return Err(ConfigError::Zero("stream-interval-ms"));
        }
        self.bind_addr().map(|_| ())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidAddress(raw))
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            default_timeout: Duration::from_secs(self.default_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        ServerConfig::try_parse_from(std::iter::once("optimizer-hub").chain(args.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.default_timeout_secs, 3600);
        assert_eq!(config.log_capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(config.stream_interval(), Duration::from_secs(1));
        assert_eq!(config.run_settings().poll_interval, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analyzer_args_are_repeatable() {
        let config = parse(&[
            "--analyzer",
            "python3",
            "--analyzer-arg",
            "-m",
            "--analyzer-arg",
            "azure_cost_optimizer",
        ]);
        assert_eq!(config.analyzer, "python3");
        assert_eq!(config.analyzer_args, vec!["-m", "azure_cost_optimizer"]);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = parse(&["--log-capacity", "0"]);
        assert_eq!(config.validate(), Err(ConfigError::Zero("log-capacity")));

        let config = parse(&["--stream-interval-ms", "0"]);
        assert_eq!(config.validate(), Err(ConfigError::Zero("stream-interval-ms")));

        let config = parse(&["--poll-interval-secs", "0"]);
        assert_eq!(config.validate(), Err(ConfigError::Zero("poll-interval-secs")));
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let config = parse(&["--host", "not a host"]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAddress(_))));
    }

    #[test]
    fn test_bind_addr() {
        let config = parse(&["--host", "127.0.0.1", "--port", "8080"]);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
    }
}
