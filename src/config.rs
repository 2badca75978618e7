//! Runtime configuration for the `metered-kv` binary.
//!
//! Loaded from environment variables; anything missing or unparsable falls
//! back to its default. Library types take these values as constructor
//! parameters and never read the environment themselves.

use std::time::Duration;

use tracing::warn;

use crate::metrics::AggregatorConfig;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Key-value store address (default: redis://127.0.0.1:6379/)
    pub redis_url: String,
    /// HTTP listen address (default: 0.0.0.0:3000)
    pub bind_addr: String,
    pub aggregator: AggregatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables:
    /// `REDIS_URL`, `BIND_ADDR`, `METRICS_FLUSH_INTERVAL_MS`,
    /// `METRICS_DELIVERY_TIMEOUT_MS`, `METRICS_SEND_EMPTY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let aggregator = AggregatorConfig {
            flush_interval: millis(&lookup, "METRICS_FLUSH_INTERVAL_MS")
                .unwrap_or(defaults.aggregator.flush_interval),
            delivery_timeout: millis(&lookup, "METRICS_DELIVERY_TIMEOUT_MS")
                .unwrap_or(defaults.aggregator.delivery_timeout),
            send_empty_batches: flag(&lookup, "METRICS_SEND_EMPTY")
                .unwrap_or(defaults.aggregator.send_empty_batches),
        };

        Self {
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            aggregator,
        }
    }
}

fn millis<F>(lookup: &F, name: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => {
            warn!(
                var = name,
                value = %raw,
                "expected a positive number of milliseconds, using default"
            );
            None
        }
    }
}

fn flag<F>(lookup: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            warn!(var = name, value = %raw, "expected true/false, using default");
            None
        }
    }
}
