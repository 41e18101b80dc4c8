//! Layered configuration: YAML file merged with `MEDIA_PERF_` env vars.

use std::path::Path;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config file, read when present and no path is given.
const DEFAULT_CONFIG_FILE: &str = "media-perf.yaml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub thresholds: Thresholds,
    pub workers: WorkersConfig,
    pub simulator: SimulatorConfig,
}

impl Config {
    /// Load config from an optional YAML file plus `MEDIA_PERF_*` env
    /// vars (nested keys split on `__`, e.g.
    /// `MEDIA_PERF_THRESHOLDS__P95_WARNING_MS=250`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                figment = figment.merge(Yaml::file(p));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    figment = figment.merge(Yaml::file(DEFAULT_CONFIG_FILE));
                }
            }
        }

        figment = figment.merge(Env::prefixed("MEDIA_PERF_").split("__"));
        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Directory served for the dashboard UI
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

/// Sample retention and snapshot caching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Ring capacity per `(route, method)` history
    pub max_samples_per_route: usize,
    /// Ring capacity of the global history
    pub max_samples_global: usize,
    /// How long a composed snapshot is served from cache
    pub snapshot_ttl_seconds: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            max_samples_per_route: 500,
            max_samples_global: 5_000,
            snapshot_ttl_seconds: 3,
        }
    }
}

/// Bounds the status evaluator applies, worst breach wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub p95_warning_ms: f64,
    pub p95_critical_ms: f64,
    /// 0.0-1.0
    pub error_rate_warning: f64,
    /// 0.0-1.0
    pub error_rate_critical: f64,
    /// Pending jobs on any single queue
    pub queue_backlog_warning: u64,
    pub queue_backlog_critical: u64,
    /// Hit rate below this warns, once the cache has real traffic
    pub cache_hit_rate_warning: f64,
    /// Lookups required before the hit-rate rule applies
    pub cache_min_lookups: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p95_warning_ms: 500.0,
            p95_critical_ms: 2_000.0,
            error_rate_warning: 0.01,
            error_rate_critical: 0.05,
            queue_backlog_warning: 100,
            queue_backlog_critical: 1_000,
            cache_hit_rate_warning: 0.50,
            cache_min_lookups: 50,
        }
    }
}

/// Redis-backed job subsystem. `redis_url = None` disables worker
/// metrics entirely — a valid state, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub redis_url: Option<String>,
    /// Queue names to report depth for
    pub queues: Vec<String>,
    /// Deadline for one collection round trip
    pub poll_timeout_ms: u64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            queues: vec!["default".to_string(), "thumbnails".to_string()],
            poll_timeout_ms: 250,
        }
    }
}

/// Synthetic traffic for local development. Off by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Fixed seed for reproducible traffic; None seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 200,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.metrics.max_samples_per_route, 500);
        assert_eq!(config.metrics.snapshot_ttl_seconds, 3);
        assert!(config.workers.redis_url.is_none());
        assert!(!config.simulator.enabled);
        assert!(config.thresholds.p95_warning_ms < config.thresholds.p95_critical_ms);
        assert!(config.thresholds.error_rate_warning < config.thresholds.error_rate_critical);
    }

    #[test]
    fn yaml_overrides_merge_over_defaults() {
        let figment = Figment::new().merge(Yaml::string(
            r"
thresholds:
  p95_warning_ms: 250
workers:
  redis_url: redis://127.0.0.1:6379/
  queues: [default]
",
        ));
        let config: Config = figment.extract().unwrap();

        assert_eq!(config.thresholds.p95_warning_ms, 250.0);
        // Untouched section keeps its default
        assert_eq!(config.thresholds.p95_critical_ms, 2_000.0);
        assert_eq!(
            config.workers.redis_url.as_deref(),
            Some("redis://127.0.0.1:6379/")
        );
        assert_eq!(config.workers.queues, vec!["default"]);
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/media-perf.yaml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
