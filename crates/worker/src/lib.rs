//! # Analytics Worker
//!
//! Owns the passage of time for the analytics subsystem. Four independent
//! periodic tasks run concurrently for as long as the worker is started:
//!
//! | Task | Default period | Does |
//! |---|---|---|
//! | `performance_aggregation` | 1h | Performance and risk metrics for recently active users |
//! | `portfolio_analysis` | 4h | Risk-parity analysis for users with enough lineups |
//! | `model_refresh` | 12h | Retrains the prediction prior, then predicts per user |
//! | `data_cleanup` | 24h | Deletes derived rows past retention, sweeps the cache |
//!
//! ## Architectural Principles
//!
//! - **Isolation:** one user's failure is logged, counted and skipped. Only a
//!   failure to list a cycle's users aborts that cycle; the next tick retries.
//! - **Bounded calls:** every data-store call runs under a shared circuit
//!   breaker with a deadline, and every cache call under the cache's own.
//! - **Cooperative shutdown:** a single `watch` signal is observed on every tick
//!   and before every user. [`AnalyticsWorker::stop`] waits for all four loops.
//! - **One lock:** the stats are the only shared mutable state, and
//!   [`AnalyticsWorker::stats`] hands out an owned copy.
//!
//! ## Public API
//!
//! - `AnalyticsWorker`: `start`, `stop`, `is_running`, `stats`, `run_once`.
//! - `WorkerStats` / `TaskStats` / `CycleReport`: observability records.
//! - `WorkerError`: lifecycle misuse.

use crate::tasks::WorkerContext;
use cache::AnalyticsCache;
use configuration::WorkerConfig;
use core_types::TaskKind;
use database::DataStore;
use events::PushSink;
use parking_lot::Mutex;
use resilience::{BreakerConfig, BreakerSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

pub mod error;
pub mod stats;
mod tasks;

pub use error::{TaskError, WorkerError};
pub use stats::{CycleReport, TaskStats, WorkerStats};

struct RunHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(TaskKind, JoinHandle<()>)>,
}

/// The background scheduler for the analytics subsystem.
pub struct AnalyticsWorker {
    ctx: Arc<WorkerContext>,
    run: Mutex<Option<RunHandle>>,
    span: Span,
}

impl AnalyticsWorker {
    pub fn new(
        store: Arc<dyn DataStore>,
        cache: Arc<AnalyticsCache>,
        push: Arc<dyn PushSink>,
        config: WorkerConfig,
        breaker: BreakerConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(WorkerContext::new(store, cache, push, config, breaker)),
            run: Mutex::new(None),
            span: tracing::info_span!("analytics_worker"),
        }
    }

    /// Attaches every log event of the worker and its tasks to `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        self.ctx.config()
    }

    /// Spawns the four task loops on the current Tokio runtime.
    ///
    /// Each task first runs one full period after this call. Starting a running
    /// worker is an error.
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut run = self.run.lock();
        if run.is_some() {
            return Err(WorkerError::AlreadyRunning);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| WorkerError::NoRuntime)?;

        let (shutdown, rx) = watch::channel(false);
        let tasks = TaskKind::ALL
            .into_iter()
            .map(|task| {
                let span = tracing::info_span!(parent: &self.span, "task", task = %task);
                let handle = runtime.spawn(
                    Arc::clone(&self.ctx)
                        .run_loop(task, rx.clone())
                        .instrument(span),
                );
                (task, handle)
            })
            .collect();

        *run = Some(RunHandle { shutdown, tasks });
        tracing::info!(parent: &self.span, "Analytics worker started");
        Ok(())
    }

    /// Signals every loop to stop and waits until all of them have returned.
    ///
    /// A loop finishes the user it is working on before it notices the signal.
    /// Stopping a stopped worker is an error.
    pub async fn stop(&self) -> Result<(), WorkerError> {
        let run = self.run.lock().take();
        let Some(run) = run else {
            return Err(WorkerError::NotRunning);
        };
        tracing::info!(parent: &self.span, "Stopping analytics worker");

        // Fails only when every loop has already exited.
        let _ = run.shutdown.send(true);

        let mut failed = 0;
        for (task, handle) in run.tasks {
            if let Err(e) = handle.await {
                tracing::error!(parent: &self.span, %task, error = %e, "Task ended abnormally");
                failed += 1;
            }
        }

        tracing::info!(parent: &self.span, "Analytics worker stopped");
        if failed > 0 {
            return Err(WorkerError::TaskFailed(failed));
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().is_some()
    }

    /// An owned snapshot of the cumulative counters.
    pub fn stats(&self) -> WorkerStats {
        self.ctx.stats.snapshot()
    }

    pub fn breaker(&self) -> BreakerSnapshot {
        self.ctx.breaker_snapshot()
    }

    /// Runs a single cycle of `task` right now, outside the schedule.
    ///
    /// The cycle is recorded in the stats like a scheduled one. It works whether
    /// or not the worker is started.
    pub async fn run_once(&self, task: TaskKind) -> CycleReport {
        let (_signal, shutdown) = watch::channel(false);
        let span = tracing::info_span!(parent: &self.span, "task", task = %task);
        self.ctx.run_cycle(task, &shutdown).instrument(span).await
    }
}

impl Drop for AnalyticsWorker {
    fn drop(&mut self) {
        if let Some(run) = self.run.get_mut().take() {
            tracing::warn!(parent: &self.span, "Analytics worker dropped while running, signalling tasks");
            let _ = run.shutdown.send(true);
        }
    }
}
