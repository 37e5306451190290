use crate::engine::MetricsCalculator;
use crate::error::AnalyticsError;
use crate::formulas;
use crate::report::{CorrelationMatrix, RiskMetrics};
use chrono::{DateTime, Utc};
use core_types::{LineupId, ReturnSeries, UserId};
use serde::{Deserialize, Serialize};

/// The allocation assigned to one lineup by the risk-parity pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupWeight {
    pub lineup_id: LineupId,
    pub weight: f64,
    pub volatility: f64,
    pub mean_return: f64,
    pub samples: usize,
}

/// Portfolio-level view of a user's lineups: risk-parity weights, cross-lineup
/// correlation, and the risk profile of the weighted portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub user_id: UserId,
    pub as_of: DateTime<Utc>,
    pub weights: Vec<LineupWeight>,
    pub correlation: CorrelationMatrix,
    pub risk: RiskMetrics,
    pub expected_return: f64,
    pub portfolio_volatility: f64,
    /// Weighted average lineup volatility over portfolio volatility; 0 when the
    /// portfolio has no variance.
    pub diversification_ratio: f64,
}

/// Runs an inverse-volatility (naive risk-parity) allocation over a user's lineups.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioAnalyzer {
    calculator: MetricsCalculator,
}

impl PortfolioAnalyzer {
    pub fn new(calculator: MetricsCalculator) -> Self {
        Self { calculator }
    }

    /// Analyzes the lineup history contained in `series`.
    ///
    /// Lineups are aligned on their most recent common tail (the length of the
    /// shortest lineup) for correlation and the weighted portfolio series; weights
    /// and expected return use each lineup's full history.
    pub fn analyze(
        &self,
        series: &ReturnSeries,
        as_of: DateTime<Utc>,
    ) -> Result<PortfolioAnalysis, AnalyticsError> {
        let groups = series.group_by_lineup();
        if groups.is_empty() {
            return Err(AnalyticsError::NotEnoughData(format!(
                "user {} has no lineup history",
                series.entity()
            )));
        }

        let lineups: Vec<(LineupId, Vec<f64>)> = groups.into_iter().collect();
        let vols: Vec<f64> = lineups.iter().map(|(_, r)| formulas::std_dev(r)).collect();
        let weights = inverse_volatility_weights(&vols);

        let common = lineups.iter().map(|(_, r)| r.len()).min().unwrap_or(0);
        let aligned: Vec<(String, Vec<f64>)> = lineups
            .iter()
            .map(|(id, r)| (id.to_string(), r[r.len() - common..].to_vec()))
            .collect();

        let portfolio_returns: Vec<f64> = (0..common)
            .map(|t| {
                aligned
                    .iter()
                    .zip(&weights)
                    .map(|((_, r), w)| w * r[t])
                    .sum()
            })
            .collect();

        let portfolio_volatility = formulas::std_dev(&portfolio_returns);
        let weighted_vol: f64 = weights.iter().zip(&vols).map(|(w, v)| w * v).sum();
        let diversification_ratio = if portfolio_volatility > 0.0 {
            weighted_vol / portfolio_volatility
        } else {
            0.0
        };

        let lineup_weights: Vec<LineupWeight> = lineups
            .iter()
            .zip(&weights)
            .zip(&vols)
            .map(|(((lineup_id, r), weight), volatility)| LineupWeight {
                lineup_id: lineup_id.clone(),
                weight: *weight,
                volatility: *volatility,
                mean_return: formulas::mean(r),
                samples: r.len(),
            })
            .collect();
        let expected_return = lineup_weights
            .iter()
            .map(|w| w.weight * w.mean_return)
            .sum();

        Ok(PortfolioAnalysis {
            user_id: series.entity().clone(),
            as_of,
            weights: lineup_weights,
            correlation: self.calculator.correlation(&aligned),
            risk: self.calculator.risk(&portfolio_returns),
            expected_return,
            portfolio_volatility,
            diversification_ratio,
        })
    }
}

/// Weights proportional to `1 / vol`, summing to 1.
///
/// Lineups without measurable volatility borrow the mean of the positive
/// volatilities; if none is positive the allocation is equal-weight.
fn inverse_volatility_weights(vols: &[f64]) -> Vec<f64> {
    if vols.is_empty() {
        return Vec::new();
    }
    let positive: Vec<f64> = vols.iter().copied().filter(|v| *v > 0.0).collect();
    if positive.is_empty() {
        return vec![1.0 / vols.len() as f64; vols.len()];
    }
    let fallback = formulas::mean(&positive);
    let inverse: Vec<f64> = vols
        .iter()
        .map(|v| 1.0 / if *v > 0.0 { *v } else { fallback })
        .collect();
    let total: f64 = inverse.iter().sum();
    inverse.iter().map(|i| i / total).collect()
}
