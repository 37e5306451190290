//! # Analytics Cache
//!
//! A TTL cache that makes calculator output nearly free to re-read. Values are
//! stored as JSON under deterministic keys derived from the entity, the
//! evaluation date, and for optimizer results a settings fingerprint.
//!
//! ## Architectural Principles
//!
//! - **Degrade, don't fail:** The cache is never a system of record. Backend
//!   failures turn reads into misses and are counted, never surfaced as hard
//!   errors on the read path.
//! - **Pluggable backend:** `AnalyticsCache` talks to a `CacheBackend` trait
//!   object. `RedisBackend` is the production store; `MemoryBackend` serves tests
//!   and single-process runs.
//! - **Bounded staleness:** Every write carries a finite TTL.
//!
//! ## Public API
//!
//! - `AnalyticsCache`: get/set, bulk get/set, warming, invalidation and the expiry sweep.
//! - `CachedMetric`: Implemented by every value kind that can be cached per entity and date.
//! - `KeyBuilder` / `OptimizerFingerprint`: Key construction.
//! - `CacheError`: The specific error types that can be returned from this crate.

pub mod backend;
pub mod cache;
pub mod error;
pub mod keys;
pub mod memory;
pub mod metric;
pub mod redis_backend;

pub use backend::{CacheBackend, CacheEntry, KeyTtl};
pub use cache::{AnalyticsCache, BulkWrite, CacheSettings, CacheStats, SweepReport, WarmReport};
pub use error::CacheError;
pub use keys::{KeyBuilder, OptimizerFingerprint, OptimizerSettings};
pub use memory::MemoryBackend;
pub use metric::{CachedMetric, METRIC_KINDS};
pub use redis_backend::RedisBackend;
