use crate::error::ConfigError;
use resilience::BreakerConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub worker: WorkerConfig,
    pub breaker: BreakerConfig,
    pub push: PushConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the PostgreSQL data store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/lineup".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Which cache backend to run against. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheProvider {
    Redis { url: String },
    /// An in-process map; useful for single-node runs and tests.
    Memory,
    /// Every read misses; nothing is stored.
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub provider: CacheProvider,
    pub key_prefix: String,
    /// TTL applied when a write does not name one.
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
    /// Deadline for each individual cache call.
    #[serde(with = "humantime_serde")]
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: CacheProvider::Redis {
                url: "redis://127.0.0.1:6379".to_string(),
            },
            key_prefix: "lineup:analytics:".to_string(),
            default_ttl: Duration::from_secs(2 * HOUR),
            op_timeout: Duration::from_secs(2),
        }
    }
}

/// Schedules and windows for the background worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    #[serde(with = "humantime_serde")]
    pub performance_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub portfolio_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub model_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
    /// Length of the return history each computation looks at.
    #[serde(with = "humantime_serde")]
    pub lookback: Duration,
    /// How recently a user must have played to be refreshed by the performance task.
    #[serde(with = "humantime_serde")]
    pub active_window: Duration,
    /// Derived rows older than this are deleted by the cleanup task.
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
    /// Deadline for every data-store call.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Distinct lineups a user needs before portfolio analysis applies.
    pub min_portfolio_lineups: u32,
    /// Per-period risk-free rate used by the calculator.
    pub risk_free_rate: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            performance_interval: Duration::from_secs(HOUR),
            portfolio_interval: Duration::from_secs(4 * HOUR),
            model_interval: Duration::from_secs(12 * HOUR),
            cleanup_interval: Duration::from_secs(DAY),
            lookback: Duration::from_secs(30 * DAY),
            active_window: Duration::from_secs(DAY),
            retention: Duration::from_secs(90 * DAY),
            call_timeout: Duration::from_secs(10),
            min_portfolio_lineups: 3,
            risk_free_rate: 0.0,
        }
    }
}

/// Where real-time events are pushed. Resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PushConfig {
    #[default]
    None,
    /// In-process fan-out to subscribers.
    Broadcast { capacity: usize },
    /// HTTP POST of each event.
    Webhook {
        url: String,
        #[serde(with = "humantime_serde")]
        timeout: Duration,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `worker=debug,info`. `RUST_LOG` wins when set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "lineup-analytics.log".to_string(),
        }
    }
}

impl Config {
    /// Rejects settings that would make the worker spin, never trip, or never persist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.worker;
        let intervals = [
            ("worker.performance_interval", w.performance_interval),
            ("worker.portfolio_interval", w.portfolio_interval),
            ("worker.model_interval", w.model_interval),
            ("worker.cleanup_interval", w.cleanup_interval),
            ("worker.lookback", w.lookback),
            ("worker.call_timeout", w.call_timeout),
            ("cache.default_ttl", self.cache.default_ttl),
            ("cache.op_timeout", self.cache.op_timeout),
            ("breaker.window", self.breaker.window),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::ValidationError(format!("{name} must be non-zero")));
        }

        let ratio = self.breaker.failure_ratio;
        if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "breaker.failure_ratio must be in (0, 1], got {ratio}"
            )));
        }
        if !w.risk_free_rate.is_finite() {
            return Err(ConfigError::ValidationError(
                "worker.risk_free_rate must be finite".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if let PushConfig::Broadcast { capacity: 0 } = self.push {
            return Err(ConfigError::ValidationError(
                "push.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
