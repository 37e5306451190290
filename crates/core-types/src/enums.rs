use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four periodic jobs run by the analytics worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    PerformanceAggregation,
    PortfolioAnalysis,
    ModelRefresh,
    DataCleanup,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::PerformanceAggregation,
        TaskKind::PortfolioAnalysis,
        TaskKind::ModelRefresh,
        TaskKind::DataCleanup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::PerformanceAggregation => "performance_aggregation",
            TaskKind::PortfolioAnalysis => "portfolio_analysis",
            TaskKind::ModelRefresh => "model_refresh",
            TaskKind::DataCleanup => "data_cleanup",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTask(s.to_string()))
    }
}

/// The kind of real-time notification pushed after a result is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PerformanceUpdate,
    PortfolioUpdate,
    PredictionUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PerformanceUpdate => "performance_update",
            EventKind::PortfolioUpdate => "portfolio_update",
            EventKind::PredictionUpdate => "prediction_update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_kind_round_trips_through_its_name() {
        for task in TaskKind::ALL {
            assert_eq!(task.as_str().parse::<TaskKind>().unwrap(), task);
        }
        assert!("nightly_rebuild".parse::<TaskKind>().is_err());
    }

    #[test]
    fn event_kind_serializes_as_wire_name() {
        let json = serde_json::to_string(&EventKind::PortfolioUpdate).unwrap();
        assert_eq!(json, "\"portfolio_update\"");
    }
}
