use crate::formulas;
use chrono::{DateTime, Utc};
use core_types::{ReturnSeries, UserId};
use serde::{Deserialize, Serialize};

/// A forecast of a user's next-period lineup return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub user_id: UserId,
    pub as_of: DateTime<Utc>,
    pub expected_return: f64,
    /// Blend of the user's own win rate and the population win rate.
    pub win_probability: f64,
    /// Weight given to the user's own history, in `[0, 1]`.
    pub confidence: f64,
    pub model_version: String,
}

/// Hyperparameters of the shrinkage model.
///
/// A user's signal is an exponentially weighted mean of their own returns,
/// pulled toward the population mean with weight `n / (n + prior_strength)`,
/// so thin histories lean on the population and long ones on themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShrinkageModel {
    /// Smoothing factor for the EWMA, in `(0, 1]`.
    pub ewma_alpha: f64,
    /// Pseudo-sample count assigned to the population prior.
    pub prior_strength: f64,
}

impl Default for ShrinkageModel {
    fn default() -> Self {
        Self {
            ewma_alpha: 0.2,
            prior_strength: 20.0,
        }
    }
}

/// The fitted model. Training produces a fresh value; nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    params: ShrinkageModel,
    population_mean: f64,
    population_win_rate: f64,
    training_samples: usize,
    version: String,
}

impl ShrinkageModel {
    /// Fits the population prior from a set of recent histories.
    ///
    /// An empty population yields a neutral prior (zero mean, 0.5 win rate).
    pub fn train(&self, population: &[ReturnSeries], trained_at: DateTime<Utc>) -> TrainedModel {
        let pooled: Vec<f64> = population.iter().flat_map(|s| s.returns()).collect();
        let population_win_rate = if pooled.is_empty() {
            0.5
        } else {
            formulas::win_rate(&pooled)
        };

        TrainedModel {
            params: *self,
            population_mean: formulas::mean(&pooled),
            population_win_rate,
            training_samples: pooled.len(),
            version: format!("shrinkage-{}", trained_at.format("%Y%m%dT%H%M%SZ")),
        }
    }
}

impl TrainedModel {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    pub fn population_mean(&self) -> f64 {
        self.population_mean
    }

    pub fn predict(&self, series: &ReturnSeries, as_of: DateTime<Utc>) -> Prediction {
        let returns = series.returns();
        let n = returns.len() as f64;
        let confidence = if n > 0.0 {
            n / (n + self.params.prior_strength.max(0.0))
        } else {
            0.0
        };

        let own_win_rate = formulas::win_rate(&returns);
        let signal = ewma(&returns, self.params.ewma_alpha);

        Prediction {
            user_id: series.entity().clone(),
            as_of,
            expected_return: confidence * signal + (1.0 - confidence) * self.population_mean,
            win_probability: confidence * own_win_rate
                + (1.0 - confidence) * self.population_win_rate,
            confidence,
            model_version: self.version.clone(),
        }
    }
}

/// Exponentially weighted mean seeded with the first observation. 0 when empty.
fn ewma(values: &[f64], alpha: f64) -> f64 {
    let alpha = alpha.clamp(f64::MIN_POSITIVE, 1.0);
    let mut iter = values.iter();
    let Some(first) = iter.next() else {
        return 0.0;
    };
    iter.fold(*first, |acc, v| alpha * v + (1.0 - alpha) * acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::LineupId;

    fn series(user: &str, returns: &[f64]) -> ReturnSeries {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        ReturnSeries::from_returns(UserId::from(user), LineupId::from("l1"), start, returns)
    }

    #[test]
    fn empty_history_falls_back_to_population() {
        let now = Utc::now();
        let model = ShrinkageModel::default().train(
            &[series("a", &[0.02, 0.04]), series("b", &[0.0, -0.02])],
            now,
        );
        let p = model.predict(&series("c", &[]), now);
        assert_eq!(p.confidence, 0.0);
        assert!((p.expected_return - 0.01).abs() < 1e-12);
        assert!((p.win_probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn longer_history_earns_more_confidence() {
        let now = Utc::now();
        let model = ShrinkageModel::default().train(&[], now);
        let short = model.predict(&series("a", &[0.01; 5]), now);
        let long = model.predict(&series("a", &[0.01; 80]), now);
        assert!(long.confidence > short.confidence);
        assert!((long.confidence - 0.8).abs() < 1e-12);
        assert!((long.expected_return - 0.008).abs() < 1e-12);
    }

    #[test]
    fn version_is_stamped_with_training_time() {
        let at = Utc.with_ymd_and_hms(2026, 6, 2, 3, 4, 5).unwrap();
        let model = ShrinkageModel::default().train(&[], at);
        assert_eq!(model.version(), "shrinkage-20260602T030405Z");
        assert_eq!(model.training_samples(), 0);
    }

    #[test]
    fn ewma_tracks_recent_values() {
        assert_eq!(ewma(&[], 0.5), 0.0);
        assert!((ewma(&[0.0, 1.0], 0.5) - 0.5).abs() < 1e-12);
    }
}
