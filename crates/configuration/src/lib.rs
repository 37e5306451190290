//! # Configuration
//!
//! Loads, validates and exposes the settings for the analytics service, and
//! installs the logging subscriber those settings describe.
//!
//! Sources are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `LINEUP_`. Nested keys are separated by a
//! double underscore, e.g. `LINEUP_WORKER__PERFORMANCE_INTERVAL=30m` or
//! `LINEUP_CACHE__PROVIDER__KIND=memory`.

use crate::error::ConfigError;
use std::path::Path;

pub mod error;
pub mod logging;
pub mod settings;

pub use logging::init_logging;
pub use settings::{
    CacheConfig, CacheProvider, Config, DatabaseConfig, LoggingConfig, PushConfig, WorkerConfig,
};

/// The file read by [`load_config`] when it exists.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const ENV_PREFIX: &str = "LINEUP";

/// Loads the configuration from `config.toml` (if present) and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false));
    finish(builder)
}

/// Loads the configuration from an explicit file, which must exist, plus the environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder().add_source(config::File::from(path).required(true));
    finish(builder)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config, ConfigError> {
    let config = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Config>()?;

    config.validate()?;
    tracing::debug!(
        cache = ?config.cache.provider,
        push = ?config.push,
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::time::Duration;

    fn parse(toml: &str) -> Result<Config, ConfigError> {
        let builder =
            config::Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml));
        let config = builder.build()?.try_deserialize::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.worker, WorkerConfig::default());
        assert_eq!(config.worker.performance_interval, Duration::from_secs(3600));
        assert_eq!(config.worker.cleanup_interval, Duration::from_secs(86_400));
        assert_eq!(config.push, PushConfig::None);
        assert!(matches!(config.cache.provider, CacheProvider::Redis { .. }));
        assert_eq!(config.breaker.min_calls, 10);
    }

    #[test]
    fn parses_humantime_durations_and_tagged_providers() {
        let config = parse(
            r#"
            [worker]
            performance_interval = "15m"
            retention = "30days"
            min_portfolio_lineups = 5

            [cache]
            key_prefix = "test:"
            default_ttl = "10m"
            [cache.provider]
            kind = "memory"

            [push]
            kind = "webhook"
            url = "http://localhost:9000/events"
            timeout = "3s"

            [breaker]
            failure_ratio = 0.25
            cooldown = "1m"
            "#,
        )
        .unwrap();

        assert_eq!(config.worker.performance_interval, Duration::from_secs(900));
        assert_eq!(config.worker.retention, Duration::from_secs(30 * 86_400));
        assert_eq!(config.worker.min_portfolio_lineups, 5);
        assert_eq!(config.worker.portfolio_interval, Duration::from_secs(4 * 3600));
        assert_eq!(config.cache.provider, CacheProvider::Memory);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(600));
        assert_eq!(
            config.push,
            PushConfig::Webhook {
                url: "http://localhost:9000/events".to_string(),
                timeout: Duration::from_secs(3),
            }
        );
        assert_eq!(config.breaker.failure_ratio, 0.25);
        assert_eq!(config.breaker.cooldown, Duration::from_secs(60));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = parse("[worker]\nmodel_interval = \"0s\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("model_interval")));
    }

    #[test]
    fn failure_ratio_outside_unit_interval_is_rejected() {
        assert!(parse("[breaker]\nfailure_ratio = 0.0\n").is_err());
        assert!(parse("[breaker]\nfailure_ratio = 1.5\n").is_err());
        assert!(parse("[breaker]\nfailure_ratio = 1.0\n").is_ok());
    }

    #[test]
    fn unknown_provider_kind_fails_to_load() {
        let err = parse("[cache.provider]\nkind = \"memcached\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_from(Path::new("/nonexistent/lineup.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
