use chrono::NaiveDate;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hasher;

/// Builds every key the analytics cache reads or writes.
///
/// Layouts:
/// - metrics: `{prefix}{kind}:{entity}:date:{YYYY-MM-DD}`
/// - optimizer results: `{prefix}optimization:{fingerprint}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn metric(&self, kind: &str, entity: &str, date: NaiveDate) -> String {
        format!("{}{}:{}:date:{}", self.prefix, kind, entity, date.format("%Y-%m-%d"))
    }

    pub fn optimization(&self, fingerprint: &OptimizerFingerprint) -> String {
        format!("{}optimization:{}", self.prefix, fingerprint)
    }

    /// Pattern matching every key under this prefix.
    pub fn all(&self) -> String {
        format!("{}*", self.prefix)
    }
}

/// The optimizer settings that determine whether a cached optimization result can be reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub salary_cap: u32,
    pub lineup_count: u32,
    /// Minimum number of differing players between any two generated lineups.
    pub min_diversity: u32,
    pub use_correlation: bool,
    pub correlation_weight: f64,
    pub stacking_rules: usize,
}

/// A cheap, collision-tolerant identifier for an optimization run.
///
/// It combines the optimizer settings with a short hash over the boundaries of
/// the sorted entity set (first id, last id, count). It is not a content hash:
/// two sets sharing those boundaries map to the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptimizerFingerprint(String);

impl OptimizerFingerprint {
    pub fn new<S: AsRef<str>>(settings: &OptimizerSettings, entity_ids: &[S]) -> Self {
        let mut ids: Vec<&str> = entity_ids.iter().map(AsRef::as_ref).collect();
        ids.sort_unstable();

        let mut hasher = FxHasher::default();
        hasher.write(ids.first().copied().unwrap_or_default().as_bytes());
        hasher.write_u8(b'|');
        hasher.write(ids.last().copied().unwrap_or_default().as_bytes());
        hasher.write_u8(b'|');
        hasher.write_usize(ids.len());
        let short = hasher.finish() as u32;

        Self(format!(
            "cap{}_n{}_div{}_corr{}w{:.2}_stack{}_{:08x}",
            settings.salary_cap,
            settings.lineup_count,
            settings.min_diversity,
            u8::from(settings.use_correlation),
            settings.correlation_weight,
            settings.stacking_rules,
            short
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptimizerFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
