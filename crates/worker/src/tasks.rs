use crate::error::TaskError;
use crate::stats::{CycleReport, SharedStats};
use analytics::{MetricsCalculator, PortfolioAnalyzer, ShrinkageModel, TrainedModel};
use cache::{AnalyticsCache, CacheError, CachedMetric};
use chrono::{DateTime, NaiveDate, Utc};
use configuration::WorkerConfig;
use core_types::{EventKind, ReturnSeries, TaskKind, TimeWindow, UserId};
use database::{DataStore, DbError};
use events::PushSink;
use resilience::{BreakerConfig, BreakerError, BreakerSnapshot, CircuitBreaker};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Everything the four tasks share. Only `stats` is mutable.
pub(crate) struct WorkerContext {
    store: Arc<dyn DataStore>,
    cache: Arc<AnalyticsCache>,
    push: Arc<dyn PushSink>,
    config: WorkerConfig,
    breaker: CircuitBreaker,
    calculator: MetricsCalculator,
    analyzer: PortfolioAnalyzer,
    model: ShrinkageModel,
    pub(crate) stats: SharedStats,
}

impl WorkerContext {
    pub(crate) fn new(
        store: Arc<dyn DataStore>,
        cache: Arc<AnalyticsCache>,
        push: Arc<dyn PushSink>,
        config: WorkerConfig,
        breaker: BreakerConfig,
    ) -> Self {
        let calculator = MetricsCalculator::new(config.risk_free_rate);
        Self {
            store,
            cache,
            push,
            config,
            breaker: CircuitBreaker::new("data_store", breaker),
            calculator,
            analyzer: PortfolioAnalyzer::new(calculator),
            model: ShrinkageModel::default(),
            stats: SharedStats::default(),
        }
    }

    pub(crate) fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub(crate) fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    pub(crate) fn period(&self, task: TaskKind) -> Duration {
        match task {
            TaskKind::PerformanceAggregation => self.config.performance_interval,
            TaskKind::PortfolioAnalysis => self.config.portfolio_interval,
            TaskKind::ModelRefresh => self.config.model_interval,
            TaskKind::DataCleanup => self.config.cleanup_interval,
        }
    }

    /// Ticks `task` until shutdown is signalled or the sender is dropped.
    ///
    /// The first tick fires one full period after the loop starts.
    pub(crate) async fn run_loop(self: Arc<Self>, task: TaskKind, mut shutdown: watch::Receiver<bool>) {
        let period = self.period(task);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(?period, "Task loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }
            self.run_cycle(task, &shutdown).await;
        }

        tracing::debug!("Task loop stopped");
    }

    /// Runs one cycle of `task` and folds its outcome into the stats.
    pub(crate) async fn run_cycle(&self, task: TaskKind, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let report = match task {
            TaskKind::PerformanceAggregation => self.performance_cycle(started_at, shutdown).await,
            TaskKind::PortfolioAnalysis => self.portfolio_cycle(started_at, shutdown).await,
            TaskKind::ModelRefresh => self.model_cycle(started_at, shutdown).await,
            TaskKind::DataCleanup => self.cleanup_cycle(started_at).await,
        };

        let duration = clock.elapsed();
        self.stats.record(task, started_at, duration, &report);

        if report.aborted {
            tracing::warn!(?duration, "Cycle aborted");
        } else {
            tracing::info!(
                ?duration,
                users = report.users_processed,
                generated = report.generated,
                rows_cleaned = report.rows_cleaned,
                errors = report.error_total(),
                cancelled = report.cancelled,
                "Cycle finished"
            );
        }
        report
    }

    // ==========================================================================
    // Performance aggregation
    // ==========================================================================

    async fn performance_cycle(&self, now: DateTime<Utc>, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();
        let active = TimeWindow::trailing(now, span(self.config.active_window));
        let Some(users) = self
            .list(&mut report, self.store.list_active_users(&active))
            .await
        else {
            return report;
        };

        let window = TimeWindow::trailing(now, span(self.config.lookback));
        for user in &users {
            if cancelled(shutdown) {
                report.cancelled = true;
                break;
            }
            match self.aggregate_user(user, &window, &mut report).await {
                Ok(generated) => {
                    report.users_processed += 1;
                    report.generated += u64::from(generated);
                }
                Err(e) => user_failed(&mut report, user, &e),
            }
        }
        report
    }

    /// Returns whether a report was produced; users without history are skipped.
    async fn aggregate_user(
        &self,
        user: &UserId,
        window: &TimeWindow,
        report: &mut CycleReport,
    ) -> Result<bool, TaskError> {
        let series = self.history(user, window).await?;
        if series.is_empty() {
            tracing::debug!(%user, "No lineup results in window, skipping");
            return Ok(false);
        }

        let metrics = self.calculator.performance_for(&series, None);
        let risk = self.calculator.risk_for(&series);
        self.call(self.store.store_performance_report(user, window, &metrics))
            .await?;

        let date = window.end.date_naive();
        self.cache_write(report, user, date, &metrics).await;
        self.cache_write(report, user, date, &risk).await;
        self.publish(EventKind::PerformanceUpdate, user, &metrics)?;
        Ok(true)
    }

    // ==========================================================================
    // Portfolio analysis
    // ==========================================================================

    async fn portfolio_cycle(&self, now: DateTime<Utc>, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();
        let min_lineups = self.config.min_portfolio_lineups;
        let Some(users) = self
            .list(&mut report, self.store.list_portfolio_eligible_users(min_lineups))
            .await
        else {
            return report;
        };

        let window = TimeWindow::trailing(now, span(self.config.lookback));
        for user in &users {
            if cancelled(shutdown) {
                report.cancelled = true;
                break;
            }
            match self.analyze_user(user, &window, now, &mut report).await {
                Ok(()) => {
                    report.users_processed += 1;
                    report.generated += 1;
                }
                Err(e) => user_failed(&mut report, user, &e),
            }
        }
        report
    }

    async fn analyze_user(
        &self,
        user: &UserId,
        window: &TimeWindow,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<(), TaskError> {
        let series = self.history(user, window).await?;
        let analysis = self.analyzer.analyze(&series, now)?;
        self.call(self.store.store_portfolio_analysis(user, &analysis))
            .await?;

        self.cache_write(report, user, now.date_naive(), &analysis).await;
        self.cache_write(report, user, now.date_naive(), &analysis.correlation)
            .await;
        self.publish(EventKind::PortfolioUpdate, user, &analysis)?;
        Ok(())
    }

    // ==========================================================================
    // Model refresh
    // ==========================================================================

    /// Retrains the shrinkage prior on every recently active user's history, then
    /// predicts for each of them.
    async fn model_cycle(&self, now: DateTime<Utc>, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();
        let window = TimeWindow::trailing(now, span(self.config.lookback));
        let Some(users) = self
            .list(&mut report, self.store.list_active_users(&window))
            .await
        else {
            return report;
        };

        let mut population = Vec::with_capacity(users.len());
        for user in &users {
            if cancelled(shutdown) {
                report.cancelled = true;
                return report;
            }
            match self.history(user, &window).await {
                Ok(series) if !series.is_empty() => population.push(series),
                Ok(_) => report.users_processed += 1,
                Err(e) => user_failed(&mut report, user, &e),
            }
        }

        let model = self.model.train(&population, now);
        tracing::info!(
            version = model.version(),
            samples = model.training_samples(),
            population_mean = model.population_mean(),
            "Prediction model refreshed"
        );
        report.model_version = Some(model.version().to_string());

        for series in &population {
            if cancelled(shutdown) {
                report.cancelled = true;
                break;
            }
            match self.predict_user(&model, series, now, &mut report).await {
                Ok(()) => {
                    report.users_processed += 1;
                    report.generated += 1;
                }
                Err(e) => user_failed(&mut report, series.entity(), &e),
            }
        }
        report
    }

    async fn predict_user(
        &self,
        model: &TrainedModel,
        series: &ReturnSeries,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<(), TaskError> {
        let user = series.entity();
        let prediction = model.predict(series, now);
        self.call(self.store.store_prediction(user, &prediction)).await?;
        self.cache_write(report, user, now.date_naive(), &prediction).await;
        self.publish(EventKind::PredictionUpdate, user, &prediction)?;
        Ok(())
    }

    // ==========================================================================
    // Data cleanup
    // ==========================================================================

    /// Deletes derived rows past retention and sweeps lingering cache keys.
    async fn cleanup_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();
        let cutoff = TimeWindow::trailing(now, span(self.config.retention)).start;

        match self.call(self.store.cleanup_older_than(cutoff)).await {
            Ok(rows) => {
                tracing::info!(%cutoff, rows, "Expired analytics rows deleted");
                report.rows_cleaned = rows;
            }
            Err(e) => {
                let e = TaskError::from(e);
                tracing::error!(error = %e, "Failed to delete expired analytics rows");
                report.count_error(e.category());
                report.aborted = true;
                return report;
            }
        }

        match self.cache.clear_expired_keys().await {
            Ok(sweep) => tracing::debug!(scanned = sweep.scanned, removed = sweep.removed, "Cache swept"),
            Err(e) => cache_failed(&mut report, &e),
        }
        report
    }

    // ==========================================================================
    // Shared steps
    // ==========================================================================

    /// A data-store call under the breaker and the per-call deadline.
    ///
    /// Only an unavailable store counts against the breaker; a bad record is
    /// one user's problem.
    async fn call<T, F>(&self, fut: F) -> Result<T, BreakerError<DbError>>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        self.breaker
            .call_with(self.config.call_timeout, DbError::is_unavailable, fut)
            .await
    }

    /// Lists a cycle's entities. `None` aborts the cycle.
    async fn list<F>(&self, report: &mut CycleReport, fut: F) -> Option<Vec<UserId>>
    where
        F: Future<Output = Result<Vec<UserId>, DbError>>,
    {
        match self.call(fut).await {
            Ok(users) => {
                tracing::debug!(count = users.len(), "Eligible users listed");
                Some(users)
            }
            Err(e) => {
                let e = TaskError::from(e);
                tracing::error!(error = %e, "Failed to list eligible users");
                report.count_error(e.category());
                report.aborted = true;
                None
            }
        }
    }

    async fn history(&self, user: &UserId, window: &TimeWindow) -> Result<ReturnSeries, TaskError> {
        let samples = self
            .call(self.store.get_user_lineup_history(user, window))
            .await?;
        let series = ReturnSeries::for_window(user.clone(), *window, samples);
        if series.discarded() > 0 {
            tracing::warn!(%user, discarded = series.discarded(), "Dropped non-finite or out-of-window lineup results");
        }
        Ok(series)
    }

    /// Cache writes are best-effort; a failure is counted and the unit goes on.
    async fn cache_write<M: CachedMetric>(
        &self,
        report: &mut CycleReport,
        user: &UserId,
        date: NaiveDate,
        value: &M,
    ) {
        if let Err(e) = self.cache.set(user.as_str(), date, value, None).await {
            cache_failed(report, &e);
        }
    }

    fn publish<T: Serialize>(&self, kind: EventKind, user: &UserId, value: &T) -> Result<(), TaskError> {
        let payload = serde_json::to_value(value)?;
        self.push.send_event(kind, user, payload);
        Ok(())
    }
}

fn cancelled(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

fn user_failed(report: &mut CycleReport, user: &UserId, error: &TaskError) {
    tracing::warn!(%user, error = %error, "Skipping user");
    report.count_error(error.category());
}

fn cache_failed(report: &mut CycleReport, error: &CacheError) {
    tracing::debug!(error = %error, "Cache write failed");
    report.count_error(&format!("cache_{}", error.category()));
}

/// Converts a configured duration to a calendar span, saturating on overflow.
fn span(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(36_500))
}
