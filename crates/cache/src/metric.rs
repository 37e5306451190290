use analytics::{
    CorrelationMatrix, PerformanceMetrics, PortfolioAnalysis, Prediction, RiskMetrics,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A value that can be stored under a per-entity, per-date metric key.
pub trait CachedMetric: Serialize + DeserializeOwned + Send + Sync {
    /// The key segment naming this value kind.
    const KIND: &'static str;
}

impl CachedMetric for PerformanceMetrics {
    const KIND: &'static str = "performance";
}

impl CachedMetric for RiskMetrics {
    const KIND: &'static str = "risk";
}

impl CachedMetric for CorrelationMatrix {
    const KIND: &'static str = "correlation";
}

impl CachedMetric for PortfolioAnalysis {
    const KIND: &'static str = "portfolio";
}

impl CachedMetric for Prediction {
    const KIND: &'static str = "prediction";
}

/// Every kind stored per entity and date; invalidation removes all of them.
pub const METRIC_KINDS: [&str; 5] = [
    PerformanceMetrics::KIND,
    RiskMetrics::KIND,
    CorrelationMatrix::KIND,
    PortfolioAnalysis::KIND,
    Prediction::KIND,
];
