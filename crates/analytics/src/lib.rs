//! # Lineup Analytics Calculator
//!
//! This crate turns lineup return series into performance, risk and correlation
//! statistics. It is the numerical core of the system: every cached or persisted
//! metric originates here.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of caches,
//!   databases or schedulers. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `MetricsCalculator` holds only scalar parameters.
//!   It takes return series as input and produces value objects as output, so it
//!   can be called from any number of tasks concurrently.
//! - **Zero-value fallbacks:** Empty, mismatched or zero-variance input never
//!   produces an error or a panic. Each formula documents what it returns instead.
//!
//! ## Public API
//!
//! - `formulas`: The individual formula functions (Sharpe, Sortino, VaR, Kelly, ...).
//! - `MetricsCalculator`: Bundles the formulas into `PerformanceMetrics` and `RiskMetrics`.
//! - `CorrelationMatrix`: A symmetric, unit-diagonal correlation matrix.
//! - `PortfolioAnalyzer`: Risk-parity weighting and portfolio risk across a user's lineups.
//! - `ShrinkageModel`: A refreshable return-prediction model.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

pub mod engine;
pub mod error;
pub mod formulas;
pub mod portfolio;
pub mod prediction;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsCalculator;
pub use error::AnalyticsError;
pub use portfolio::{LineupWeight, PortfolioAnalysis, PortfolioAnalyzer};
pub use prediction::{Prediction, ShrinkageModel, TrainedModel};
pub use report::{CorrelationMatrix, PerformanceMetrics, RiskMetrics};
