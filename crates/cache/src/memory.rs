use crate::backend::{CacheBackend, CacheEntry, KeyTtl};
use crate::error::CacheError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

/// Expiry used when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An in-process [`CacheBackend`].
///
/// Reads skip expired entries, but the entries stay in the map until they are
/// deleted, which is how a store without eager eviction behaves.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Stores a value with no expiry. Only useful for exercising the expiry sweep.
    pub fn insert_persistent(&self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.lock().insert(
            key.into(),
            StoredValue {
                bytes: value,
                expires_at: None,
            },
        );
    }

    fn live_value(&self, key: &str, now: Instant) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .get(key)
            .filter(|v| !v.is_expired(now))
            .map(|v| v.bytes.clone())
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.live_value(key, Instant::now()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().insert(
            key.to_string(),
            StoredValue {
                bytes: value,
                expires_at: Some(expiry(Instant::now(), ttl)),
            },
        );
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, CacheError> {
        let now = Instant::now();
        Ok(keys.iter().map(|k| self.live_value(k, now)).collect())
    }

    async fn mset(&self, entries: Vec<CacheEntry>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut map = self.entries.lock();
        for entry in entries {
            map.insert(
                entry.key,
                StoredValue {
                    bytes: entry.value,
                    expires_at: Some(expiry(now, entry.ttl)),
                },
            );
        }
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut map = self.entries.lock();
        Ok(keys.iter().filter(|k| map.remove(k.as_str()).is_some()).count() as u64)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, CacheError> {
        let now = Instant::now();
        Ok(match self.entries.lock().get(key) {
            None => KeyTtl::Missing,
            Some(StoredValue {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(StoredValue {
                expires_at: Some(at),
                ..
            }) if *at <= now => KeyTtl::Expired,
            Some(StoredValue {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Remaining(at.duration_since(now)),
        })
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

/// Matches `key` against a pattern where `*` stands for any run of characters.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob_match("a:*", "a:b:c"));
        assert!(glob_match("a:*:date:*", "a:u1:date:2026-01-01"));
        assert!(!glob_match("a:*:date:*", "a:u1:2026-01-01"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("b:*", "a:b"));
        assert!(glob_match("*", ""));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_linger_until_deleted() {
        let backend = MemoryBackend::new();
        backend
            .set("k", b"v".to_vec(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert_eq!(backend.ttl("k").await.unwrap(), KeyTtl::Expired);
        assert_eq!(backend.len(), 1);

        assert_eq!(backend.del(&["k".to_string(), "x".to_string()]).await.unwrap(), 1);
        assert_eq!(backend.ttl("k").await.unwrap(), KeyTtl::Missing);
    }

    #[tokio::test]
    async fn mget_is_positional() {
        let backend = MemoryBackend::new();
        backend
            .mset(vec![CacheEntry {
                key: "b".into(),
                value: b"2".to_vec(),
                ttl: Duration::from_secs(60),
            }])
            .await
            .unwrap();
        let values = backend
            .mget(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![None, Some(b"2".to_vec())]);
    }

    #[tokio::test]
    async fn unrepresentable_ttl_means_far_future() {
        let backend = MemoryBackend::new();
        backend.set("k", b"v".to_vec(), Duration::MAX).await.unwrap();
        backend
            .mset(vec![CacheEntry {
                key: "m".into(),
                value: b"w".to_vec(),
                ttl: Duration::MAX,
            }])
            .await
            .unwrap();

        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(backend.get("m").await.unwrap(), Some(b"w".to_vec()));
        match backend.ttl("k").await.unwrap() {
            KeyTtl::Remaining(left) => assert!(left > Duration::from_secs(365 * 24 * 60 * 60)),
            other => panic!("expected a remaining ttl, got {other:?}"),
        }
    }
}
