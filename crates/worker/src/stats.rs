use chrono::{DateTime, Utc};
use core_types::TaskKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Bookkeeping for one periodic task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub runs: u64,
    pub last_run: Option<DateTime<Utc>>,
    /// Start of the most recent cycle that was not aborted. Staleness shows up here.
    pub last_success: Option<DateTime<Utc>>,
    pub last_duration: Option<Duration>,
    /// Cycles aborted because their entities could not be listed.
    pub failed_cycles: u64,
}

/// Cumulative worker counters. Reset only when the process restarts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStats {
    pub users_processed: u64,
    pub reports_generated: u64,
    pub analyses_generated: u64,
    pub predictions_generated: u64,
    pub rows_cleaned: u64,
    /// Failure counts keyed `"<task>.<category>"`.
    pub errors: BTreeMap<String, u64>,
    pub tasks: BTreeMap<TaskKind, TaskStats>,
    /// Version of the most recently trained prediction model.
    pub model_version: Option<String>,
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self {
            users_processed: 0,
            reports_generated: 0,
            analyses_generated: 0,
            predictions_generated: 0,
            rows_cleaned: 0,
            errors: BTreeMap::new(),
            tasks: TaskKind::ALL
                .into_iter()
                .map(|task| (task, TaskStats::default()))
                .collect(),
            model_version: None,
        }
    }
}

impl WorkerStats {
    pub fn task(&self, task: TaskKind) -> TaskStats {
        self.tasks.get(&task).cloned().unwrap_or_default()
    }

    pub fn error_count(&self, key: &str) -> u64 {
        self.errors.get(key).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }
}

/// What a single cycle of one task did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Users whose unit of work finished without error.
    pub users_processed: u64,
    /// Reports, analyses or predictions persisted, depending on the task.
    pub generated: u64,
    pub rows_cleaned: u64,
    /// Failure counts keyed by category.
    pub errors: BTreeMap<String, u64>,
    /// The cycle could not list its entities and did no work.
    pub aborted: bool,
    /// Shutdown was observed before every entity was visited.
    pub cancelled: bool,
    pub model_version: Option<String>,
}

impl CycleReport {
    pub(crate) fn count_error(&mut self, category: &str) {
        *self.errors.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn error_total(&self) -> u64 {
        self.errors.values().sum()
    }
}

/// The single mutex guarding [`WorkerStats`].
#[derive(Debug, Default)]
pub(crate) struct SharedStats {
    inner: Mutex<WorkerStats>,
}

impl SharedStats {
    /// Folds a finished cycle into the counters in one critical section.
    pub(crate) fn record(
        &self,
        task: TaskKind,
        started_at: DateTime<Utc>,
        duration: Duration,
        report: &CycleReport,
    ) {
        let mut stats = self.inner.lock();

        stats.users_processed += report.users_processed;
        stats.rows_cleaned += report.rows_cleaned;
        match task {
            TaskKind::PerformanceAggregation => stats.reports_generated += report.generated,
            TaskKind::PortfolioAnalysis => stats.analyses_generated += report.generated,
            TaskKind::ModelRefresh => stats.predictions_generated += report.generated,
            TaskKind::DataCleanup => {}
        }
        for (category, count) in &report.errors {
            *stats.errors.entry(format!("{task}.{category}")).or_insert(0) += count;
        }
        if let Some(version) = &report.model_version {
            stats.model_version = Some(version.clone());
        }

        let entry = stats.tasks.entry(task).or_default();
        entry.runs += 1;
        entry.last_run = Some(started_at);
        entry.last_duration = Some(duration);
        if report.aborted {
            entry.failed_cycles += 1;
        } else {
            entry.last_success = Some(started_at);
        }
    }

    /// An owned copy; later cycles never show through it.
    pub(crate) fn snapshot(&self) -> WorkerStats {
        self.inner.lock().clone()
    }
}
