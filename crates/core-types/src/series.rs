use crate::ids::{LineupId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single observed lineup result inside an evaluation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSample {
    pub lineup_id: LineupId,
    pub timestamp: DateTime<Utc>,
    /// The normalized performance delta of the lineup for this sample.
    pub value: f64,
    /// The compounded wealth curve value after this sample.
    pub cumulative: f64,
}

/// A half-open `[start, end)` evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The window of length `length` ending at `end`. The start saturates at the
    /// earliest representable instant.
    pub fn trailing(end: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: end.checked_sub_signed(length).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// An ordered, immutable return series for one entity over one evaluation window.
///
/// Samples are sorted by timestamp on construction and non-finite returns are
/// dropped, so every consumer sees a clean, chronologically ordered sequence.
/// When the window advances a new series is built; an existing one is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    entity: UserId,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    samples: Vec<ReturnSample>,
    discarded: usize,
}

impl ReturnSeries {
    pub fn new(
        entity: UserId,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        samples: Vec<ReturnSample>,
    ) -> Self {
        let total = samples.len();
        let mut samples: Vec<ReturnSample> = samples
            .into_iter()
            .filter(|s| s.value.is_finite())
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        let discarded = total - samples.len();

        Self {
            entity,
            window_start,
            window_end,
            samples,
            discarded,
        }
    }

    /// Builds the series for `window`, dropping samples that fall outside it.
    /// Those count as discarded along with non-finite returns.
    pub fn for_window(entity: UserId, window: TimeWindow, samples: Vec<ReturnSample>) -> Self {
        let total = samples.len();
        let inside = samples
            .into_iter()
            .filter(|s| window.contains(s.timestamp))
            .collect();
        let mut series = Self::new(entity, window.start, window.end, inside);
        series.discarded = total - series.samples.len();
        series
    }

    /// Builds a daily series from raw returns, filling in the compounded wealth curve.
    pub fn from_returns(
        entity: UserId,
        lineup_id: LineupId,
        start: DateTime<Utc>,
        returns: &[f64],
    ) -> Self {
        let mut wealth = 1.0;
        let samples = returns
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                wealth *= 1.0 + r;
                ReturnSample {
                    lineup_id: lineup_id.clone(),
                    timestamp: start + Duration::days(i as i64),
                    value: r,
                    cumulative: wealth,
                }
            })
            .collect();
        let end = start + Duration::days(returns.len() as i64);
        Self::new(entity, start, end, samples)
    }

    pub fn entity(&self) -> &UserId {
        &self.entity
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    pub fn samples(&self) -> &[ReturnSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples rejected at construction: non-finite returns, and for
    /// [`ReturnSeries::for_window`] samples outside the window.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// The raw return values in chronological order.
    pub fn returns(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Splits the series into per-lineup return vectors, each kept in chronological order.
    pub fn group_by_lineup(&self) -> BTreeMap<LineupId, Vec<f64>> {
        let mut groups: BTreeMap<LineupId, Vec<f64>> = BTreeMap::new();
        for sample in &self.samples {
            groups
                .entry(sample.lineup_id.clone())
                .or_default()
                .push(sample.value);
        }
        groups
    }
}
