use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// One key/value pair to write, with its lifespan.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub ttl: Duration,
}

/// What a backend reports about a key's remaining lifespan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist.
    Missing,
    /// The key exists without an expiry.
    Persistent,
    /// The key's expiry has passed but it has not been evicted yet.
    Expired,
    Remaining(Duration),
}

/// The primitives the analytics cache needs from a remote key-value store.
///
/// Values are opaque bytes. Implementations must be safe to share across tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// A short name for logs and the circuit breaker.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Overwrites `key` with `value`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Reads many keys in one round trip. The result is positionally aligned with `keys`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, CacheError>;

    /// Writes many entries in one round trip.
    async fn mset(&self, entries: Vec<CacheEntry>) -> Result<(), CacheError>;

    /// Deletes keys and returns how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError>;

    async fn ttl(&self, key: &str) -> Result<KeyTtl, CacheError>;

    /// Lists keys matching a glob pattern (`*` wildcards).
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}
