use resilience::BreakerError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Failed to (de)serialize cache value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache is unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn category(&self) -> &'static str {
        match self {
            CacheError::Backend(_) => "backend",
            CacheError::Serialization(_) => "serialization",
            CacheError::Timeout(_) => "timeout",
            CacheError::Unavailable(_) => "unavailable",
        }
    }
}

impl From<BreakerError<CacheError>> for CacheError {
    fn from(err: BreakerError<CacheError>) -> Self {
        match err {
            BreakerError::Open(name) => CacheError::Unavailable(format!("circuit '{name}' is open")),
            BreakerError::Timeout(after) => CacheError::Timeout(after),
            BreakerError::Inner(inner) => inner,
        }
    }
}
