use crate::backend::{CacheBackend, CacheEntry, KeyTtl};
use crate::error::CacheError;
use crate::keys::{KeyBuilder, OptimizerFingerprint};
use crate::metric::{CachedMetric, METRIC_KINDS};
use analytics::MetricsCalculator;
use chrono::NaiveDate;
use core_types::ReturnSeries;
use resilience::{BreakerConfig, BreakerSnapshot, CircuitBreaker};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::Span;

/// Key layout and timing for an [`AnalyticsCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub key_prefix: String,
    /// Lifespan used when a write does not name one. Must be non-zero.
    pub default_ttl: Duration,
    /// Deadline for every single backend call.
    pub op_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            key_prefix: "lineup:analytics:".to_string(),
            default_ttl: Duration::from_secs(2 * 60 * 60),
            op_timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkWrite {
    pub written: usize,
    /// Entries dropped because they could not be serialized.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    pub entities: usize,
    pub warmed: usize,
    pub skipped_empty: usize,
    pub skipped_marshal: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: u64,
}

/// Cumulative cache counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub writes: u64,
    pub skipped_writes: u64,
    pub breaker: BreakerSnapshot,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    writes: AtomicU64,
    skipped_writes: AtomicU64,
}

impl Counters {
    fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// A read-through TTL cache for analytics values.
///
/// The cache is an optimization, never a system of record: reads that fail for
/// any reason (backend down, breaker open, timeout, undecodable value) are
/// reported as misses so the caller recomputes. Writes return their error so
/// callers can count it, but nothing here retries.
pub struct AnalyticsCache {
    backend: Option<Arc<dyn CacheBackend>>,
    keys: KeyBuilder,
    default_ttl: Duration,
    op_timeout: Duration,
    breaker: CircuitBreaker,
    calculator: MetricsCalculator,
    counters: Counters,
    span: Span,
}

impl AnalyticsCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        settings: CacheSettings,
        breaker: BreakerConfig,
    ) -> Self {
        let name = format!("cache:{}", backend.name());
        Self::build(Some(backend), settings, CircuitBreaker::new(name, breaker))
    }

    /// A cache that stores nothing: every read misses and every write succeeds.
    pub fn disabled(settings: CacheSettings) -> Self {
        Self::build(
            None,
            settings,
            CircuitBreaker::new("cache:disabled", BreakerConfig::default()),
        )
    }

    fn build(
        backend: Option<Arc<dyn CacheBackend>>,
        settings: CacheSettings,
        breaker: CircuitBreaker,
    ) -> Self {
        Self {
            backend,
            keys: KeyBuilder::new(settings.key_prefix),
            default_ttl: settings.default_ttl,
            op_timeout: settings.op_timeout,
            breaker,
            calculator: MetricsCalculator::default(),
            counters: Counters::default(),
            span: tracing::info_span!("analytics_cache"),
        }
    }

    /// Sets the calculator used by [`AnalyticsCache::warm_cache`].
    pub fn with_calculator(mut self, calculator: MetricsCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Attaches all of this cache's log events to `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    // ==========================================================================
    // Single-key operations
    // ==========================================================================

    /// Reads one metric. `None` is a miss, including when the backend failed.
    pub async fn get<M: CachedMetric>(&self, entity: &str, date: NaiveDate) -> Option<M> {
        let key = self.keys.metric(M::KIND, entity, date);
        self.get_value(&key).await
    }

    /// Overwrites one metric. A `None` or zero `ttl` uses the default lifespan.
    pub async fn set<M: CachedMetric>(
        &self,
        entity: &str,
        date: NaiveDate,
        value: &M,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = self.keys.metric(M::KIND, entity, date);
        self.set_value(&key, value, ttl).await
    }

    pub async fn get_optimization<T: DeserializeOwned>(
        &self,
        fingerprint: &OptimizerFingerprint,
    ) -> Option<T> {
        let key = self.keys.optimization(fingerprint);
        self.get_value(&key).await
    }

    pub async fn set_optimization<T: Serialize + Sync>(
        &self,
        fingerprint: &OptimizerFingerprint,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = self.keys.optimization(fingerprint);
        self.set_value(&key, value, ttl).await
    }

    async fn get_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(backend) = &self.backend else {
            Counters::add(&self.counters.misses, 1);
            return None;
        };

        let bytes = match self.guarded("get", backend.get(key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) | Err(_) => {
                Counters::add(&self.counters.misses, 1);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                Counters::add(&self.counters.hits, 1);
                Some(value)
            }
            Err(e) => {
                Counters::add(&self.counters.errors, 1);
                Counters::add(&self.counters.misses, 1);
                tracing::warn!(parent: &self.span, key, error = %e, "Discarding undecodable cache value");
                None
            }
        }
    }

    async fn set_value<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(value)?;
        self.guarded("set", backend.set(key, bytes, self.ttl_or_default(ttl)))
            .await?;
        Counters::add(&self.counters.writes, 1);
        Ok(())
    }

    // ==========================================================================
    // Bulk operations
    // ==========================================================================

    /// Reads one metric kind for many entities in a single round trip.
    ///
    /// Missing or undecodable entries are simply absent from the result; the map
    /// never holds a key for a miss.
    pub async fn bulk_get<M: CachedMetric>(
        &self,
        entities: &[String],
        date: NaiveDate,
    ) -> HashMap<String, M> {
        let mut found = HashMap::new();
        let requested = entities.len();
        if requested == 0 {
            return found;
        }
        let Some(backend) = &self.backend else {
            Counters::add(&self.counters.misses, requested);
            return found;
        };

        let keys: Vec<String> = entities
            .iter()
            .map(|entity| self.keys.metric(M::KIND, entity, date))
            .collect();
        let values = match self.guarded("mget", backend.mget(&keys)).await {
            Ok(values) => values,
            Err(_) => {
                Counters::add(&self.counters.misses, requested);
                return found;
            }
        };

        let mut hits = 0;
        for (entity, value) in entities.iter().zip(values) {
            let Some(bytes) = value else { continue };
            match serde_json::from_slice::<M>(&bytes) {
                Ok(metric) => {
                    hits += 1;
                    found.insert(entity.clone(), metric);
                }
                Err(e) => {
                    Counters::add(&self.counters.errors, 1);
                    tracing::warn!(parent: &self.span, entity = %entity, kind = M::KIND, error = %e, "Discarding undecodable cache value");
                }
            }
        }

        Counters::add(&self.counters.hits, hits);
        Counters::add(&self.counters.misses, requested - hits);
        tracing::debug!(
            parent: &self.span,
            kind = M::KIND,
            requested,
            hits,
            hit_rate = hits as f64 / requested as f64,
            "Bulk cache read"
        );
        found
    }

    /// Writes one metric kind for many entities in a single pipelined round trip.
    ///
    /// Entries that fail to serialize are skipped and counted; the rest are written.
    pub async fn bulk_set<M: CachedMetric>(
        &self,
        entries: &[(String, M)],
        date: NaiveDate,
        ttl: Option<Duration>,
    ) -> Result<BulkWrite, CacheError> {
        let mut report = BulkWrite::default();
        let Some(backend) = &self.backend else {
            return Ok(report);
        };

        let ttl = self.ttl_or_default(ttl);
        let mut batch = Vec::with_capacity(entries.len());
        for (entity, value) in entries {
            match serde_json::to_vec(value) {
                Ok(bytes) => batch.push(CacheEntry {
                    key: self.keys.metric(M::KIND, entity, date),
                    value: bytes,
                    ttl,
                }),
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(parent: &self.span, entity = %entity, kind = M::KIND, error = %e, "Skipping unserializable cache entry");
                }
            }
        }
        Counters::add(&self.counters.skipped_writes, report.skipped);

        if batch.is_empty() {
            return Ok(report);
        }
        let count = batch.len();
        self.guarded("mset", backend.mset(batch)).await?;
        report.written = count;
        Counters::add(&self.counters.writes, count);
        Ok(report)
    }

    /// Computes performance and risk metrics for every history and bulk-writes them.
    ///
    /// Meant to run ahead of read traffic, e.g. after a data refresh. Histories
    /// without a single valid sample are skipped.
    pub async fn warm_cache(
        &self,
        histories: &[ReturnSeries],
        date: NaiveDate,
    ) -> Result<WarmReport, CacheError> {
        let mut performance = Vec::with_capacity(histories.len());
        let mut risk = Vec::with_capacity(histories.len());
        let mut skipped_empty = 0;

        for series in histories {
            if series.is_empty() {
                skipped_empty += 1;
                continue;
            }
            let entity = series.entity().to_string();
            performance.push((entity.clone(), self.calculator.performance_for(series, None)));
            risk.push((entity, self.calculator.risk_for(series)));
        }

        let perf_written = self.bulk_set(&performance, date, None).await?;
        let risk_written = self.bulk_set(&risk, date, None).await?;

        let report = WarmReport {
            entities: histories.len(),
            warmed: perf_written.written,
            skipped_empty,
            skipped_marshal: perf_written.skipped + risk_written.skipped,
        };
        tracing::info!(
            parent: &self.span,
            %date,
            entities = report.entities,
            warmed = report.warmed,
            skipped_empty = report.skipped_empty,
            "Cache warmed"
        );
        Ok(report)
    }

    // ==========================================================================
    // Maintenance
    // ==========================================================================

    /// Deletes every metric kind stored for `entity` on each of `dates`.
    pub async fn invalidate(&self, entity: &str, dates: &[NaiveDate]) -> Result<u64, CacheError> {
        let Some(backend) = &self.backend else {
            return Ok(0);
        };
        let keys: Vec<String> = dates
            .iter()
            .flat_map(|date| {
                METRIC_KINDS
                    .iter()
                    .map(move |kind| self.keys.metric(kind, entity, *date))
            })
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }

        let removed = self.guarded("del", backend.del(&keys)).await?;
        tracing::info!(parent: &self.span, entity, dates = dates.len(), removed, "Cache invalidated");
        Ok(removed)
    }

    /// Deletes keys under this cache's prefix whose expiry has fired but which
    /// are still present, and keys that somehow carry no expiry at all.
    pub async fn clear_expired_keys(&self) -> Result<SweepReport, CacheError> {
        let Some(backend) = &self.backend else {
            return Ok(SweepReport::default());
        };

        let keys = self.guarded("scan", backend.scan(&self.keys.all())).await?;
        let mut stale = Vec::new();
        for key in &keys {
            match self.guarded("ttl", backend.ttl(key)).await {
                Ok(KeyTtl::Expired) | Ok(KeyTtl::Persistent) => stale.push(key.clone()),
                Ok(KeyTtl::Missing) | Ok(KeyTtl::Remaining(_)) => {}
                // Already logged and counted; leave the key for the next sweep.
                Err(_) => {}
            }
        }

        let removed = if stale.is_empty() {
            0
        } else {
            self.guarded("del", backend.del(&stale)).await?
        };
        tracing::info!(parent: &self.span, scanned = keys.len(), removed, "Expired cache keys cleared");
        Ok(SweepReport {
            scanned: keys.len(),
            removed,
        })
    }

    pub fn stats(&self) -> CacheStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CacheStats {
            backend: self
                .backend
                .as_ref()
                .map_or("disabled", |b| b.name())
                .to_string(),
            hits: load(&self.counters.hits),
            misses: load(&self.counters.misses),
            errors: load(&self.counters.errors),
            writes: load(&self.counters.writes),
            skipped_writes: load(&self.counters.skipped_writes),
            breaker: self.breaker.snapshot(),
        }
    }

    fn ttl_or_default(&self, ttl: Option<Duration>) -> Duration {
        match ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => self.default_ttl,
        }
    }

    /// Runs one backend call under the breaker and the per-call timeout,
    /// logging and counting any failure.
    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        let result = self
            .breaker
            .call(self.op_timeout, fut)
            .await
            .map_err(CacheError::from);
        if let Err(e) = &result {
            Counters::add(&self.counters.errors, 1);
            tracing::warn!(parent: &self.span, op, category = e.category(), error = %e, "Cache operation failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::OptimizerSettings;
    use crate::memory::MemoryBackend;
    use analytics::{PerformanceMetrics, RiskMetrics};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use core_types::{LineupId, UserId};
    use serde::Deserialize;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 2).unwrap()
    }

    fn memory_cache() -> (Arc<MemoryBackend>, AnalyticsCache) {
        let backend = Arc::new(MemoryBackend::new());
        let cache = AnalyticsCache::new(
            backend.clone(),
            CacheSettings::default(),
            BreakerConfig::default(),
        );
        (backend, cache)
    }

    fn history(user: &str, returns: &[f64]) -> ReturnSeries {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        ReturnSeries::from_returns(UserId::from(user), LineupId::from("l1"), start, returns)
    }

    fn metrics(roi: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            roi,
            sample_count: 3,
            ..PerformanceMetrics::default()
        }
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let (_, cache) = memory_cache();
        let value = metrics(0.12);
        cache.set("u1", date(), &value, None).await.unwrap();

        assert_eq!(cache.get::<PerformanceMetrics>("u1", date()).await, Some(value));
        // A different kind or date is a separate key.
        assert_eq!(cache.get::<RiskMetrics>("u1", date()).await, None);
        assert_eq!(cache.get::<PerformanceMetrics>("u1", date().succ_opt().unwrap()).await, None);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.writes), (1, 2, 1));
    }

    #[tokio::test]
    async fn bulk_get_returns_only_hits() {
        let (_, cache) = memory_cache();
        let entries: Vec<(String, PerformanceMetrics)> = ["a", "c"]
            .iter()
            .map(|id| (id.to_string(), metrics(0.01)))
            .collect();
        let written = cache.bulk_set(&entries, date(), None).await.unwrap();
        assert_eq!(written, BulkWrite { written: 2, skipped: 0 });

        let requested: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let found = cache.bulk_get::<PerformanceMetrics>(&requested, date()).await;
        assert_eq!(found.len(), 2);
        assert!(found.contains_key("a") && found.contains_key("c"));
        assert!(!found.contains_key("b"));
    }

    #[derive(Debug, Deserialize)]
    struct Flaky {
        fail: bool,
    }

    impl Serialize for Flaky {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if self.fail {
                Err(serde::ser::Error::custom("refusing to serialize"))
            } else {
                serializer.serialize_bool(self.fail)
            }
        }
    }

    impl CachedMetric for Flaky {
        const KIND: &'static str = "flaky";
    }

    #[tokio::test]
    async fn bulk_set_skips_unserializable_entries() {
        let (backend, cache) = memory_cache();
        let entries = vec![
            ("a".to_string(), Flaky { fail: false }),
            ("b".to_string(), Flaky { fail: true }),
            ("c".to_string(), Flaky { fail: false }),
        ];
        let report = cache.bulk_set(&entries, date(), None).await.unwrap();
        assert_eq!(report, BulkWrite { written: 2, skipped: 1 });
        assert_eq!(backend.len(), 2);
        assert_eq!(cache.stats().skipped_writes, 1);
    }

    #[tokio::test]
    async fn warm_cache_covers_every_non_empty_history() {
        let (_, cache) = memory_cache();
        let histories = vec![
            history("u1", &[0.05, -0.02, 0.03]),
            history("u2", &[0.01]),
            history("u3", &[]),
        ];
        let report = cache.warm_cache(&histories, date()).await.unwrap();
        assert_eq!(report.warmed, 2);
        assert_eq!(report.skipped_empty, 1);

        let ids: Vec<String> = ["u1", "u2", "u3"].iter().map(|s| s.to_string()).collect();
        let perf = cache.bulk_get::<PerformanceMetrics>(&ids, date()).await;
        let risk = cache.bulk_get::<RiskMetrics>(&ids, date()).await;
        assert_eq!(perf.len(), 2);
        assert_eq!(risk.len(), 2);
        assert_eq!(perf["u1"].sample_count, 3);
    }

    #[tokio::test]
    async fn invalidate_removes_all_kinds_for_each_date() {
        let (backend, cache) = memory_cache();
        let d1 = date();
        let d2 = d1.succ_opt().unwrap();
        for d in [d1, d2] {
            cache.set("u1", d, &metrics(0.1), None).await.unwrap();
            cache.set("u1", d, &RiskMetrics::default(), None).await.unwrap();
        }
        cache.set("u2", d1, &metrics(0.1), None).await.unwrap();

        let removed = cache.invalidate("u1", &[d1, d2]).await.unwrap();
        assert_eq!(removed, 4);
        assert_eq!(backend.len(), 1);
        assert_eq!(cache.invalidate("u1", &[]).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_expired_and_persistent_keys() {
        let (backend, cache) = memory_cache();
        cache
            .set("short", date(), &metrics(0.1), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        cache.set("long", date(), &metrics(0.1), None).await.unwrap();
        backend.insert_persistent("lineup:analytics:performance:forever:date:2026-04-02", vec![]);
        backend.insert_persistent("someone-else:key", vec![]);

        tokio::time::advance(Duration::from_secs(5)).await;
        let report = cache.clear_expired_keys().await.unwrap();
        assert_eq!(report.scanned, 3);
        assert_eq!(report.removed, 2);
        assert!(cache.get::<PerformanceMetrics>("long", date()).await.is_some());
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn zero_ttl_falls_back_to_default() {
        let (backend, cache) = memory_cache();
        cache
            .set("u1", date(), &metrics(0.1), Some(Duration::ZERO))
            .await
            .unwrap();
        let key = cache.keys().metric("performance", "u1", date());
        assert!(matches!(backend.ttl(&key).await.unwrap(), KeyTtl::Remaining(_)));
    }

    #[tokio::test]
    async fn optimization_results_round_trip() {
        let (_, cache) = memory_cache();
        let settings = OptimizerSettings {
            salary_cap: 50_000,
            lineup_count: 10,
            min_diversity: 1,
            use_correlation: false,
            correlation_weight: 0.0,
            stacking_rules: 0,
        };
        let fp = OptimizerFingerprint::new(&settings, &["p1", "p2"]);
        let lineups = vec![vec!["p1".to_string(), "p2".to_string()]];
        cache.set_optimization(&fp, &lineups, None).await.unwrap();
        assert_eq!(cache.get_optimization::<Vec<Vec<String>>>(&fp).await, Some(lineups));
    }

    struct DownBackend;

    #[async_trait]
    impl CacheBackend for DownBackend {
        fn name(&self) -> &'static str {
            "down"
        }
        async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _: &str, _: Vec<u8>, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn mget(&self, _: &[String]) -> Result<Vec<Option<Vec<u8>>>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn mset(&self, _: Vec<CacheEntry>) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn del(&self, _: &[String]) -> Result<u64, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn ttl(&self, _: &str) -> Result<KeyTtl, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn scan(&self, _: &str) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn unavailable_backend_degrades_to_misses() {
        let cache = AnalyticsCache::new(
            Arc::new(DownBackend),
            CacheSettings::default(),
            BreakerConfig {
                min_calls: 2,
                ..BreakerConfig::default()
            },
        );
        assert_eq!(cache.get::<PerformanceMetrics>("u1", date()).await, None);
        let ids = vec!["u1".to_string()];
        assert!(cache.bulk_get::<PerformanceMetrics>(&ids, date()).await.is_empty());
        assert!(cache.set("u1", date(), &metrics(0.1), None).await.is_err());

        // The breaker has tripped; further reads are rejected without touching the backend.
        assert_eq!(cache.get::<PerformanceMetrics>("u1", date()).await, None);
        let stats = cache.stats();
        assert_eq!(stats.errors, 4);
        assert!(stats.breaker.rejected >= 1);
    }

    /// A backend whose calls never complete.
    struct HungBackend;

    #[async_trait]
    impl CacheBackend for HungBackend {
        fn name(&self) -> &'static str {
            "hung"
        }
        async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
            std::future::pending().await
        }
        async fn set(&self, _: &str, _: Vec<u8>, _: Duration) -> Result<(), CacheError> {
            std::future::pending().await
        }
        async fn mget(&self, _: &[String]) -> Result<Vec<Option<Vec<u8>>>, CacheError> {
            std::future::pending().await
        }
        async fn mset(&self, _: Vec<CacheEntry>) -> Result<(), CacheError> {
            std::future::pending().await
        }
        async fn del(&self, _: &[String]) -> Result<u64, CacheError> {
            std::future::pending().await
        }
        async fn ttl(&self, _: &str) -> Result<KeyTtl, CacheError> {
            std::future::pending().await
        }
        async fn scan(&self, _: &str) -> Result<Vec<String>, CacheError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_backend_reads_miss_within_the_deadline() {
        let settings = CacheSettings {
            op_timeout: Duration::from_millis(200),
            ..CacheSettings::default()
        };
        let cache = AnalyticsCache::new(Arc::new(HungBackend), settings, BreakerConfig::default());

        let started = tokio::time::Instant::now();
        assert_eq!(cache.get::<PerformanceMetrics>("u1", date()).await, None);
        let ids = vec!["u1".to_string(), "u2".to_string()];
        assert!(cache.bulk_get::<PerformanceMetrics>(&ids, date()).await.is_empty());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_secs(1));

        let err = cache.set("u1", date(), &metrics(0.1), None).await.unwrap_err();
        assert_eq!(err.category(), "timeout");

        let stats = cache.stats();
        assert_eq!(stats.errors, 3);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let cache = AnalyticsCache::disabled(CacheSettings::default());
        cache.set("u1", date(), &metrics(0.1), None).await.unwrap();
        assert_eq!(cache.get::<PerformanceMetrics>("u1", date()).await, None);
        assert_eq!(cache.clear_expired_keys().await.unwrap(), SweepReport::default());
        assert_eq!(cache.stats().backend, "disabled");
    }
}
