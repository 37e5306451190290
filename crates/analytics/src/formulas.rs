//! Pure statistical and financial formulas over return series.
//!
//! Every function in this module takes its inputs by reference, never mutates
//! them, and never panics on empty or degenerate input. Each one documents the
//! zero value it falls back to, so callers do not need length checks first.
//! Summation is plain left-to-right accumulation, which keeps results
//! bit-for-bit reproducible for identical inputs.

/// Annualization factor applied to mean returns (trading-day convention).
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Upper bound on the recommended Kelly fraction. A business rule, not a numerical limit.
pub const KELLY_CAP: f64 = 0.25;

/// Denominators smaller than this are treated as zero.
const EPSILON: f64 = 1e-12;

fn is_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// Returns `Some(n)` when both series are non-empty and of equal length.
fn paired_len(returns: &[f64], benchmark: &[f64]) -> Option<usize> {
    if returns.is_empty() || returns.len() != benchmark.len() {
        None
    } else {
        Some(returns.len())
    }
}

/// Arithmetic mean. 0 for an empty series.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with Bessel's correction. 0 when `n <= 1`.
pub fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation. 0 when `n <= 1`.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Compounded return over the whole series: `prod(1 + r) - 1`. 0 when empty.
pub fn roi(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Annualized volatility: sample standard deviation scaled by `sqrt(252)`.
pub fn volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Mean excess return over its standard deviation. 0 when the deviation is 0.
pub fn sharpe_ratio(returns: &[f64], risk_free: f64) -> f64 {
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free).collect();
    let sd = std_dev(&excess);
    if is_zero(sd) {
        return 0.0;
    }
    mean(&excess) / sd
}

/// Root-mean-square shortfall below `target`, averaged over the samples that
/// fall below it (not over `n`). 0 when no sample is below target.
pub fn downside_deviation(returns: &[f64], target: f64) -> f64 {
    let (sum_sq, count) = returns
        .iter()
        .filter(|r| **r < target)
        .fold((0.0, 0usize), |(sum, count), r| {
            (sum + (r - target) * (r - target), count + 1)
        });
    if count == 0 {
        return 0.0;
    }
    (sum_sq / count as f64).sqrt()
}

/// `(mean - target) / downside_deviation`. 0 when nothing falls below target.
pub fn sortino_ratio(returns: &[f64], target: f64) -> f64 {
    let dd = downside_deviation(returns, target);
    if is_zero(dd) {
        return 0.0;
    }
    (mean(returns) - target) / dd
}

/// Result of a drawdown scan over the compounded wealth curve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Drawdown {
    /// Largest peak-to-trough decline as a fraction of the peak, in `[0, 1]`.
    pub max_drawdown: f64,
    /// Longest run of consecutive periods spent below a prior peak.
    pub duration: usize,
}

/// Scans the wealth curve `cum[i] = cum[i-1] * (1 + r[i])` (seeded with the
/// first sample) tracking the running peak.
pub fn max_drawdown_with_duration(returns: &[f64]) -> Drawdown {
    let mut result = Drawdown::default();
    let mut wealth = 1.0;
    let mut peak = f64::NAN;
    let mut underwater = 0usize;

    for (i, r) in returns.iter().enumerate() {
        wealth *= 1.0 + r;
        if i == 0 || wealth >= peak {
            peak = wealth;
            underwater = 0;
            continue;
        }

        underwater += 1;
        result.duration = result.duration.max(underwater);
        if peak > 0.0 {
            let drawdown = ((peak - wealth) / peak).clamp(0.0, 1.0);
            result.max_drawdown = result.max_drawdown.max(drawdown);
        }
    }

    result
}

/// Largest peak-to-trough decline of the compounded wealth curve, in `[0, 1]`.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    max_drawdown_with_duration(returns).max_drawdown
}

/// Annualized mean return (`mean * 252`) over max drawdown. 0 when there is no drawdown.
pub fn calmar_ratio(returns: &[f64]) -> f64 {
    let mdd = max_drawdown(returns);
    if is_zero(mdd) {
        return 0.0;
    }
    mean(returns) * TRADING_DAYS_PER_YEAR / mdd
}

/// Fraction of samples with a strictly positive return. 0 when empty.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Gross profit over gross loss. 0 when there are no losing samples.
pub fn profit_factor(returns: &[f64]) -> f64 {
    let gross_profit: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let gross_loss: f64 = -returns.iter().filter(|r| **r < 0.0).sum::<f64>();
    if is_zero(gross_loss) {
        return 0.0;
    }
    gross_profit / gross_loss
}

struct WinLoss {
    wins: usize,
    losses: usize,
    avg_win: f64,
    avg_loss: f64,
}

fn win_loss(returns: &[f64]) -> WinLoss {
    let (win_sum, wins, loss_sum, losses) =
        returns
            .iter()
            .fold((0.0, 0usize, 0.0, 0usize), |(ws, w, ls, l), &r| {
                if r > 0.0 {
                    (ws + r, w + 1, ls, l)
                } else if r < 0.0 {
                    (ws, w, ls - r, l + 1)
                } else {
                    (ws, w, ls, l)
                }
            });
    WinLoss {
        wins,
        losses,
        avg_win: if wins > 0 { win_sum / wins as f64 } else { 0.0 },
        avg_loss: if losses > 0 { loss_sum / losses as f64 } else { 0.0 },
    }
}

/// `p(win) * avg_win - p(loss) * avg_loss`. 0 when empty.
pub fn expected_value(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let wl = win_loss(returns);
    (wl.wins as f64 / n) * wl.avg_win - (wl.losses as f64 / n) * wl.avg_loss
}

/// Kelly bet fraction `p - (1 - p) / b`, clamped to `[0, KELLY_CAP]`.
///
/// Degenerate inputs (no wins, no losses, empty series) return 0.
pub fn kelly_fraction(returns: &[f64]) -> f64 {
    let wl = win_loss(returns);
    if wl.wins == 0 || wl.losses == 0 || is_zero(wl.avg_loss) {
        return 0.0;
    }
    let p = wl.wins as f64 / returns.len() as f64;
    let payoff = wl.avg_win / wl.avg_loss;
    if is_zero(payoff) {
        return 0.0;
    }
    let kelly = p - (1.0 - p) / payoff;
    if !kelly.is_finite() {
        return 0.0;
    }
    kelly.clamp(0.0, KELLY_CAP)
}

/// `1 / (1 + cv)` where `cv = std_dev / |mean|`, in `(0, 1]`.
///
/// 0 with fewer than two samples or a zero mean.
pub fn consistency_score(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(returns);
    if is_zero(m) {
        return 0.0;
    }
    1.0 / (1.0 + std_dev(returns) / m.abs())
}

/// Compounded return per unit of standard deviation. 0 when the deviation is 0.
pub fn risk_adjusted_return(returns: &[f64]) -> f64 {
    let sd = std_dev(returns);
    if is_zero(sd) {
        return 0.0;
    }
    roi(returns) / sd
}

/// Mean active return over tracking error. 0 on mismatch or zero tracking error.
pub fn information_ratio(returns: &[f64], benchmark: &[f64]) -> f64 {
    if paired_len(returns, benchmark).is_none() {
        return 0.0;
    }
    let active: Vec<f64> = returns
        .iter()
        .zip(benchmark)
        .map(|(r, b)| r - b)
        .collect();
    let tracking_error = std_dev(&active);
    if is_zero(tracking_error) {
        return 0.0;
    }
    mean(&active) / tracking_error
}

fn capture(returns: &[f64], benchmark: &[f64], keep: impl Fn(f64) -> bool) -> f64 {
    if paired_len(returns, benchmark).is_none() {
        return 0.0;
    }
    let (own, bench): (Vec<f64>, Vec<f64>) = returns
        .iter()
        .zip(benchmark)
        .filter(|(_, b)| keep(**b))
        .map(|(r, b)| (*r, *b))
        .unzip();
    if bench.is_empty() {
        return 0.0;
    }
    let bench_mean = mean(&bench);
    if is_zero(bench_mean) {
        return 0.0;
    }
    mean(&own) / bench_mean
}

/// Mean return over mean benchmark return, restricted to periods where the benchmark rose.
pub fn upside_capture(returns: &[f64], benchmark: &[f64]) -> f64 {
    capture(returns, benchmark, |b| b > 0.0)
}

/// Mean return over mean benchmark return, restricted to periods where the benchmark fell.
pub fn downside_capture(returns: &[f64], benchmark: &[f64]) -> f64 {
    capture(returns, benchmark, |b| b < 0.0)
}

/// Sample covariance. 0 on mismatch or fewer than two pairs.
pub fn covariance(returns: &[f64], benchmark: &[f64]) -> f64 {
    match paired_len(returns, benchmark) {
        Some(n) if n > 1 => {
            let mx = mean(returns);
            let my = mean(benchmark);
            returns
                .iter()
                .zip(benchmark)
                .map(|(x, y)| (x - mx) * (y - my))
                .sum::<f64>()
                / (n - 1) as f64
        }
        _ => 0.0,
    }
}

/// `Cov(r, b) / Var(b)`. 0 on mismatch or zero benchmark variance.
pub fn beta(returns: &[f64], benchmark: &[f64]) -> f64 {
    if paired_len(returns, benchmark).is_none() {
        return 0.0;
    }
    let bench_var = variance(benchmark);
    if is_zero(bench_var) {
        return 0.0;
    }
    covariance(returns, benchmark) / bench_var
}

/// CAPM residual `mean(r) - (rf + beta * (mean(b) - rf))`.
/// 0 on mismatch or zero benchmark variance.
pub fn alpha(returns: &[f64], benchmark: &[f64], risk_free: f64) -> f64 {
    if paired_len(returns, benchmark).is_none() || is_zero(variance(benchmark)) {
        return 0.0;
    }
    let b = beta(returns, benchmark);
    mean(returns) - (risk_free + b * (mean(benchmark) - risk_free))
}

/// Excess return per unit of systematic risk. 0 when beta is 0.
pub fn treynor_ratio(returns: &[f64], benchmark: &[f64], risk_free: f64) -> f64 {
    let b = beta(returns, benchmark);
    if is_zero(b) {
        return 0.0;
    }
    (mean(returns) - risk_free) / b
}

fn sorted_ascending(returns: &[f64]) -> Vec<f64> {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn tail_index(n: usize, confidence: f64) -> usize {
    let tail = (1.0 - confidence).clamp(0.0, 1.0);
    ((tail * n as f64).floor() as usize).min(n - 1)
}

/// Historical VaR: the ascending-sorted return at index `floor((1 - confidence) * n)`.
/// 0 when empty.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sorted = sorted_ascending(returns);
    sorted[tail_index(sorted.len(), confidence)]
}

/// Historical CVaR: mean of every sorted return at or below the VaR index. 0 when empty.
pub fn conditional_var(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sorted = sorted_ascending(returns);
    let idx = tail_index(sorted.len(), confidence);
    mean(&sorted[..=idx])
}

/// Bias-corrected sample skewness. 0 when `n < 3` or the deviation is 0.
pub fn skewness(returns: &[f64]) -> f64 {
    let n = returns.len();
    if n < 3 {
        return 0.0;
    }
    let sd = std_dev(returns);
    if is_zero(sd) {
        return 0.0;
    }
    let m = mean(returns);
    let nf = n as f64;
    let sum_cubed: f64 = returns.iter().map(|r| ((r - m) / sd).powi(3)).sum();
    nf / ((nf - 1.0) * (nf - 2.0)) * sum_cubed
}

/// Bias-corrected sample excess kurtosis. 0 when `n < 4` or the deviation is 0.
pub fn kurtosis(returns: &[f64]) -> f64 {
    let n = returns.len();
    if n < 4 {
        return 0.0;
    }
    let sd = std_dev(returns);
    if is_zero(sd) {
        return 0.0;
    }
    let m = mean(returns);
    let nf = n as f64;
    let sum_fourth: f64 = returns.iter().map(|r| ((r - m) / sd).powi(4)).sum();
    let scale = nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let correction = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
    scale * sum_fourth - correction
}

/// Pearson correlation in `[-1, 1]`. 0 on mismatch or when either side has zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if paired_len(x, y).is_none() {
        return 0.0;
    }
    let sx = std_dev(x);
    let sy = std_dev(y);
    if is_zero(sx) || is_zero(sy) {
        return 0.0;
    }
    (covariance(x, y) / (sx * sy)).clamp(-1.0, 1.0)
}

/// Pairwise Pearson correlations over named series.
pub fn correlation_matrix(series: &[(String, Vec<f64>)]) -> crate::report::CorrelationMatrix {
    crate::report::CorrelationMatrix::from_series(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: [f64; 5] = [0.05, -0.02, 0.03, -0.01, 0.04];

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn variance_uses_bessel_correction() {
        // mean 2.5, squared deviations sum to 5.0, divided by n - 1 = 3
        assert!(approx(variance(&[1.0, 2.0, 3.0, 4.0]), 5.0 / 3.0));
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[42.0]), 0.0);
    }

    #[test]
    fn roi_compounds_instead_of_summing() {
        let expected = 1.05 * 0.98 * 1.03 * 0.99 * 1.04 - 1.0;
        assert!(approx(roi(&SAMPLE), expected));
        assert!(roi(&SAMPLE) > SAMPLE.iter().sum::<f64>());
    }

    #[test]
    fn win_rate_of_reference_series() {
        assert!(approx(win_rate(&SAMPLE), 0.6));
    }

    #[test]
    fn max_drawdown_of_reference_series() {
        // Wealth: 1.05 -> 1.029 -> 1.05987 -> 1.04927 -> 1.09124
        // Deepest decline is 1.05 -> 1.029, i.e. 0.021 / 1.05 = 0.02.
        let dd = max_drawdown_with_duration(&SAMPLE);
        assert!(approx(dd.max_drawdown, 0.021 / 1.05));
        assert_eq!(dd.duration, 1);
    }

    #[test]
    fn drawdown_duration_counts_longest_underwater_run() {
        let dd = max_drawdown_with_duration(&[0.10, -0.05, -0.05, 0.01, 0.20, -0.01]);
        assert_eq!(dd.duration, 3);
    }

    #[test]
    fn sharpe_is_zero_for_constant_excess() {
        assert_eq!(sharpe_ratio(&[0.01; 10], 0.01), 0.0);
        assert_eq!(sharpe_ratio(&[0.02; 10], 0.0), 0.0);
    }

    #[test]
    fn sortino_uses_count_below_target_as_denominator() {
        let returns = [0.04, -0.02, 0.06, -0.04];
        // below target: -0.02, -0.04 -> sqrt((0.0004 + 0.0016) / 2) = 0.0316...
        let dd = downside_deviation(&returns, 0.0);
        assert!(approx(dd, (0.002f64 / 2.0).sqrt()));
        assert!(approx(sortino_ratio(&returns, 0.0), mean(&returns) / dd));
        assert_eq!(sortino_ratio(&[0.01, 0.02], 0.0), 0.0);
    }

    #[test]
    fn calmar_annualizes_with_252() {
        let expected = mean(&SAMPLE) * 252.0 / max_drawdown(&SAMPLE);
        assert!(approx(calmar_ratio(&SAMPLE), expected));
        assert_eq!(calmar_ratio(&[0.01, 0.02]), 0.0);
    }

    #[test]
    fn kelly_is_capped_at_a_quarter() {
        // p = 0.8, payoff = 2 -> 0.8 - 0.2 / 2 = 0.7, capped
        let returns = [0.2, 0.2, 0.2, 0.2, -0.1];
        assert_eq!(kelly_fraction(&returns), KELLY_CAP);
        // p = 0.5, payoff = 1.5 -> 0.5 - 0.5 / 1.5 = 0.1667
        let returns = [0.03, -0.02, 0.03, -0.02];
        assert!(approx(kelly_fraction(&returns), 0.5 - 0.5 / 1.5));
    }

    #[test]
    fn kelly_is_zero_for_one_sided_series() {
        assert_eq!(kelly_fraction(&[0.1, 0.2, 0.3]), 0.0);
        assert_eq!(kelly_fraction(&[-0.1, -0.2]), 0.0);
        assert_eq!(kelly_fraction(&[]), 0.0);
    }

    #[test]
    fn profit_factor_and_expected_value() {
        assert!(approx(profit_factor(&SAMPLE), 0.12 / 0.03));
        assert!(approx(expected_value(&SAMPLE), mean(&SAMPLE)));
        assert_eq!(profit_factor(&[0.1, 0.2]), 0.0);
    }

    #[test]
    fn beta_and_alpha_follow_capm() {
        let benchmark = [0.01, -0.02, 0.03, 0.00, 0.02];
        let returns: Vec<f64> = benchmark.iter().map(|b| 2.0 * b + 0.001).collect();
        assert!(approx(beta(&returns, &benchmark), 2.0));
        assert!(approx(alpha(&returns, &benchmark, 0.0), 0.001));
        assert!(approx(
            treynor_ratio(&returns, &benchmark, 0.0),
            mean(&returns) / 2.0
        ));
    }

    #[test]
    fn benchmark_metrics_are_zero_on_mismatch_or_flat_benchmark() {
        assert_eq!(beta(&[0.1, 0.2], &[0.1]), 0.0);
        assert_eq!(alpha(&[0.1, 0.2], &[0.05, 0.05], 0.0), 0.0);
        assert_eq!(information_ratio(&[], &[]), 0.0);
        assert_eq!(treynor_ratio(&[0.1], &[0.1, 0.2], 0.0), 0.0);
    }

    #[test]
    fn capture_ratios_filter_by_benchmark_direction() {
        let benchmark = [0.02, -0.01, 0.04, -0.03];
        let returns = [0.03, -0.02, 0.05, -0.01];
        assert!(approx(upside_capture(&returns, &benchmark), 0.04 / 0.03));
        assert!(approx(downside_capture(&returns, &benchmark), -0.015 / -0.02));
        assert_eq!(upside_capture(&returns, &[-0.1, -0.1, -0.1, -0.1]), 0.0);
    }

    #[test]
    fn historical_var_and_cvar() {
        let returns: Vec<f64> = (1..=20).map(|i| i as f64 / 100.0 - 0.1).collect();
        // sorted ascending; floor(0.05 * 20) = 1
        assert!(approx(value_at_risk(&returns, 0.95), -0.08));
        assert!(approx(conditional_var(&returns, 0.95), (-0.09 - 0.08) / 2.0));
        // floor(0.01 * 20) = 0
        assert!(approx(value_at_risk(&returns, 0.99), -0.09));
        assert!(approx(conditional_var(&returns, 0.99), -0.09));
    }

    #[test]
    fn moments_require_minimum_sample_sizes() {
        assert_eq!(skewness(&[0.1, 0.2]), 0.0);
        assert_eq!(kurtosis(&[0.1, 0.2, 0.3]), 0.0);
        // Symmetric data has no skew.
        assert!(approx(skewness(&[-0.2, -0.1, 0.0, 0.1, 0.2]), 0.0));
        // Right-tailed data skews positive.
        assert!(skewness(&[0.0, 0.0, 0.0, 0.0, 1.0]) > 0.0);
    }

    #[test]
    fn correlation_edge_cases() {
        assert!(approx(correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0));
        assert!(approx(correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0));
        assert_eq!(correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(correlation(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn empty_series_yields_zero_everywhere() {
        let empty: [f64; 0] = [];
        let values = [
            mean(&empty),
            variance(&empty),
            std_dev(&empty),
            roi(&empty),
            volatility(&empty),
            sharpe_ratio(&empty, 0.01),
            sortino_ratio(&empty, 0.0),
            downside_deviation(&empty, 0.0),
            max_drawdown(&empty),
            calmar_ratio(&empty),
            win_rate(&empty),
            profit_factor(&empty),
            expected_value(&empty),
            kelly_fraction(&empty),
            consistency_score(&empty),
            risk_adjusted_return(&empty),
            information_ratio(&empty, &empty),
            upside_capture(&empty, &empty),
            downside_capture(&empty, &empty),
            covariance(&empty, &empty),
            beta(&empty, &empty),
            alpha(&empty, &empty, 0.0),
            treynor_ratio(&empty, &empty, 0.0),
            value_at_risk(&empty, 0.95),
            conditional_var(&empty, 0.99),
            skewness(&empty),
            kurtosis(&empty),
            correlation(&empty, &empty),
        ];
        assert!(values.iter().all(|v| *v == 0.0));
        assert_eq!(max_drawdown_with_duration(&empty), Drawdown::default());
    }

    fn returns_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-0.99f64..1.0, 0..64)
    }

    proptest! {
        #[test]
        fn prop_variance_zero_for_short_series(x in prop::option::of(-1.0e6f64..1.0e6)) {
            let values: Vec<f64> = x.into_iter().collect();
            prop_assert_eq!(variance(&values), 0.0);
        }

        #[test]
        fn prop_max_drawdown_is_a_fraction(returns in returns_strategy()) {
            let mdd = max_drawdown(&returns);
            prop_assert!((0.0..=1.0).contains(&mdd));
        }

        #[test]
        fn prop_no_drawdown_without_losses(returns in prop::collection::vec(0.0f64..1.0, 0..64)) {
            prop_assert_eq!(max_drawdown(&returns), 0.0);
        }

        #[test]
        fn prop_kelly_stays_within_cap(returns in returns_strategy()) {
            let k = kelly_fraction(&returns);
            prop_assert!((0.0..=KELLY_CAP).contains(&k));
        }

        #[test]
        fn prop_sharpe_zero_when_returns_equal_risk_free(rf in -0.5f64..0.5, n in 0usize..32) {
            let returns = vec![rf; n];
            prop_assert_eq!(sharpe_ratio(&returns, rf), 0.0);
        }

        #[test]
        fn prop_correlation_is_bounded(pairs in prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 0..48)) {
            let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let c = correlation(&x, &y);
            prop_assert!((-1.0..=1.0).contains(&c));
        }
    }
}
