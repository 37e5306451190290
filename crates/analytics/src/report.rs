use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};

/// Return, risk-adjusted and benchmark-relative statistics for one entity over one window.
///
/// This struct is a value object: it is produced fresh for each `(entity, window)`
/// pair and has no identity beyond that pair. `Default` is the zeroed record returned
/// for an empty series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // I. Return
    pub roi: f64,
    pub expected_value: f64,
    pub win_rate: f64,
    pub profit_factor: f64,

    // II. Risk and drawdown
    pub volatility: f64,
    pub downside_deviation: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,

    // III. Risk-adjusted
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub risk_adjusted_return: f64,
    pub consistency_score: f64,
    pub kelly_fraction: f64,

    // IV. Benchmark-relative (zero when no benchmark is supplied)
    pub information_ratio: f64,
    pub upside_capture: f64,
    pub downside_capture: f64,
    pub beta: f64,
    pub alpha: f64,
    pub treynor_ratio: f64,

    pub sample_count: usize,
}

/// Tail-risk and distribution-shape statistics, cacheable independently of
/// [`PerformanceMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub cvar_99: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub min_return: f64,
    pub max_return: f64,
    /// Magnitude of the worst single-period loss; 0 when no period lost.
    pub max_loss: f64,
    pub sample_count: usize,
}

/// A square, symmetric correlation matrix over named assets.
///
/// Instances only come from [`CorrelationMatrix::from_series`] or from
/// deserialization, which re-validates shape, symmetry and the unit diagonal.
/// The matrix is always replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCorrelationMatrix")]
pub struct CorrelationMatrix {
    assets: Vec<String>,
    size: usize,
    matrix: Vec<Vec<f64>>,
    average_correlation: f64,
}

#[derive(Deserialize)]
struct RawCorrelationMatrix {
    assets: Vec<String>,
    size: usize,
    matrix: Vec<Vec<f64>>,
    average_correlation: f64,
}

impl CorrelationMatrix {
    /// Builds the matrix by computing the upper triangle and mirroring it.
    pub fn from_series(series: &[(String, Vec<f64>)]) -> Self {
        let size = series.len();
        let mut matrix = vec![vec![0.0; size]; size];
        let mut off_diagonal_sum = 0.0;

        for i in 0..size {
            matrix[i][i] = 1.0;
            for j in (i + 1)..size {
                let c = crate::formulas::correlation(&series[i].1, &series[j].1);
                matrix[i][j] = c;
                matrix[j][i] = c;
                off_diagonal_sum += c;
            }
        }

        let pairs = size * size.saturating_sub(1) / 2;
        let average_correlation = if pairs > 0 {
            off_diagonal_sum / pairs as f64
        } else {
            0.0
        };

        Self {
            assets: series.iter().map(|(name, _)| name.clone()).collect(),
            size,
            matrix,
            average_correlation,
        }
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Mean of the off-diagonal (upper triangle) correlations; 0 for fewer than two assets.
    pub fn average_correlation(&self) -> f64 {
        self.average_correlation
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.matrix.get(i)?.get(j).copied()
    }

    /// Looks up the correlation between two named assets.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|x| x == a)?;
        let j = self.assets.iter().position(|x| x == b)?;
        self.get(i, j)
    }
}

impl TryFrom<RawCorrelationMatrix> for CorrelationMatrix {
    type Error = AnalyticsError;

    fn try_from(raw: RawCorrelationMatrix) -> Result<Self, Self::Error> {
        let n = raw.assets.len();
        if raw.size != n || raw.matrix.len() != n || raw.matrix.iter().any(|row| row.len() != n) {
            return Err(AnalyticsError::InvalidMatrix(format!(
                "expected a {n}x{n} matrix for {n} assets"
            )));
        }
        for i in 0..n {
            if raw.matrix[i][i] != 1.0 {
                return Err(AnalyticsError::InvalidMatrix(format!(
                    "diagonal entry {i} is not 1.0"
                )));
            }
            for j in (i + 1)..n {
                if raw.matrix[i][j] != raw.matrix[j][i] {
                    return Err(AnalyticsError::InvalidMatrix(format!(
                        "entries ({i},{j}) and ({j},{i}) differ"
                    )));
                }
            }
        }
        Ok(Self {
            assets: raw.assets,
            size: raw.size,
            matrix: raw.matrix,
            average_correlation: raw.average_correlation,
        })
    }
}
