use crate::formulas::{self, Drawdown};
use crate::report::{CorrelationMatrix, PerformanceMetrics, RiskMetrics};
use core_types::ReturnSeries;
use serde::{Deserialize, Serialize};

/// A stateless calculator that turns return series into metric records.
///
/// It holds only the scalar parameters shared by several formulas, so it is
/// `Copy` and can be handed to any number of tasks without synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsCalculator {
    /// Per-period risk-free rate subtracted in Sharpe, alpha and Treynor.
    pub risk_free_rate: f64,
    /// Minimum acceptable return for the Sortino ratio and downside deviation.
    pub sortino_target: f64,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            sortino_target: 0.0,
        }
    }
}

impl MetricsCalculator {
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            ..Self::default()
        }
    }

    /// The main entry point for performance metrics.
    ///
    /// # Arguments
    ///
    /// * `returns` - Chronologically ordered per-period returns.
    /// * `benchmark` - An optional benchmark series of the same length. When it is
    ///   absent or mismatched, every benchmark-relative field stays at zero.
    ///
    /// An empty series yields the zeroed record.
    pub fn performance(&self, returns: &[f64], benchmark: Option<&[f64]>) -> PerformanceMetrics {
        if returns.is_empty() {
            return PerformanceMetrics::default();
        }

        let Drawdown {
            max_drawdown,
            duration,
        } = formulas::max_drawdown_with_duration(returns);
        let rf = self.risk_free_rate;

        let mut metrics = PerformanceMetrics {
            roi: formulas::roi(returns),
            expected_value: formulas::expected_value(returns),
            win_rate: formulas::win_rate(returns),
            profit_factor: formulas::profit_factor(returns),
            volatility: formulas::volatility(returns),
            downside_deviation: formulas::downside_deviation(returns, self.sortino_target),
            max_drawdown,
            max_drawdown_duration: duration,
            sharpe_ratio: formulas::sharpe_ratio(returns, rf),
            sortino_ratio: formulas::sortino_ratio(returns, self.sortino_target),
            calmar_ratio: formulas::calmar_ratio(returns),
            risk_adjusted_return: formulas::risk_adjusted_return(returns),
            consistency_score: formulas::consistency_score(returns),
            kelly_fraction: formulas::kelly_fraction(returns),
            sample_count: returns.len(),
            ..PerformanceMetrics::default()
        };

        if let Some(bench) = benchmark {
            metrics.information_ratio = formulas::information_ratio(returns, bench);
            metrics.upside_capture = formulas::upside_capture(returns, bench);
            metrics.downside_capture = formulas::downside_capture(returns, bench);
            metrics.beta = formulas::beta(returns, bench);
            metrics.alpha = formulas::alpha(returns, bench, rf);
            metrics.treynor_ratio = formulas::treynor_ratio(returns, bench, rf);
        }

        metrics
    }

    /// Convenience wrapper over [`MetricsCalculator::performance`] for a [`ReturnSeries`].
    pub fn performance_for(
        &self,
        series: &ReturnSeries,
        benchmark: Option<&[f64]>,
    ) -> PerformanceMetrics {
        self.performance(&series.returns(), benchmark)
    }

    /// Tail-risk and distribution-shape metrics. An empty series yields the zeroed record.
    pub fn risk(&self, returns: &[f64]) -> RiskMetrics {
        if returns.is_empty() {
            return RiskMetrics::default();
        }

        let min_return = returns.iter().copied().fold(f64::INFINITY, f64::min);
        let max_return = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        RiskMetrics {
            var_95: formulas::value_at_risk(returns, 0.95),
            var_99: formulas::value_at_risk(returns, 0.99),
            cvar_95: formulas::conditional_var(returns, 0.95),
            cvar_99: formulas::conditional_var(returns, 0.99),
            std_dev: formulas::std_dev(returns),
            variance: formulas::variance(returns),
            skewness: formulas::skewness(returns),
            kurtosis: formulas::kurtosis(returns),
            min_return,
            max_return,
            max_loss: if min_return < 0.0 { -min_return } else { 0.0 },
            sample_count: returns.len(),
        }
    }

    pub fn risk_for(&self, series: &ReturnSeries) -> RiskMetrics {
        self.risk(&series.returns())
    }

    /// Pairwise correlations across named return series.
    pub fn correlation(&self, series: &[(String, Vec<f64>)]) -> CorrelationMatrix {
        formulas::correlation_matrix(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 5] = [0.05, -0.02, 0.03, -0.01, 0.04];

    #[test]
    fn performance_of_reference_series() {
        let m = MetricsCalculator::new(0.0).performance(&SAMPLE, None);
        assert!((m.roi - 0.091_242_152).abs() < 1e-6);
        assert!((m.win_rate - 0.6).abs() < 1e-12);
        assert!((m.max_drawdown - 0.02).abs() < 1e-9);
        assert_eq!(m.sample_count, 5);
        assert!(m.sharpe_ratio > 0.0);
        assert_eq!(m.beta, 0.0);
    }

    #[test]
    fn benchmark_fields_populate_only_with_matching_benchmark() {
        let calc = MetricsCalculator::default();
        let bench = [0.02, -0.01, 0.01, -0.02, 0.03];
        let with = calc.performance(&SAMPLE, Some(&bench));
        assert!(with.beta != 0.0);
        assert!(with.upside_capture != 0.0);

        let mismatched = calc.performance(&SAMPLE, Some(&bench[..3]));
        assert_eq!(mismatched.beta, 0.0);
        assert_eq!(mismatched.information_ratio, 0.0);
    }

    #[test]
    fn empty_series_returns_zeroed_records() {
        let calc = MetricsCalculator::default();
        assert_eq!(calc.performance(&[], None), PerformanceMetrics::default());
        assert_eq!(calc.risk(&[]), RiskMetrics::default());
    }

    #[test]
    fn risk_reports_extremes_and_max_loss() {
        let r = MetricsCalculator::default().risk(&SAMPLE);
        assert_eq!(r.min_return, -0.02);
        assert_eq!(r.max_return, 0.05);
        assert_eq!(r.max_loss, 0.02);
        assert_eq!(r.var_95, -0.02);

        let gains_only = MetricsCalculator::default().risk(&[0.01, 0.02]);
        assert_eq!(gains_only.max_loss, 0.0);
    }
}
