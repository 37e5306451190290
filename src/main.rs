use analytics::MetricsCalculator;
use anyhow::Context;
use cache::{AnalyticsCache, CacheBackend, CacheSettings, MemoryBackend, RedisBackend};
use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use configuration::{CacheProvider, Config, PushConfig};
use core_types::{ReturnSeries, TaskKind, TimeWindow, UserId};
use database::{DataStore, PgDataStore, connect, run_migrations};
use events::{BroadcastSink, NoopSink, PushSink};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use notifier::WebhookSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use worker::AnalyticsWorker;

/// The main entry point for the lineup analytics service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file when one is present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path)?,
        None => configuration::load_config()?,
    };
    let _log_guard = configuration::init_logging(&config.logging)?;

    match cli.command {
        Commands::Run => handle_run(&config).await,
        Commands::RunOnce(args) => handle_run_once(args, &config).await,
        Commands::Warm(args) => handle_warm(args, &config).await,
        Commands::Invalidate(args) => handle_invalidate(args, &config).await,
        Commands::Sweep => handle_sweep(&config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Background analytics for lineup portfolios: metrics, caching and scheduling.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to `config.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the analytics worker and run until Ctrl-C.
    Run,
    /// Run a single cycle of one task and print its report.
    RunOnce(RunOnceArgs),
    /// Compute and cache metrics for every recently active user.
    Warm(WarmArgs),
    /// Delete the cached metrics of one user for the given dates.
    Invalidate(InvalidateArgs),
    /// Delete cache keys whose expiry has passed but which are still present.
    Sweep,
}

#[derive(Parser)]
struct RunOnceArgs {
    /// One of: performance_aggregation, portfolio_analysis, model_refresh, data_cleanup.
    #[arg(long)]
    task: TaskKind,
}

#[derive(Parser)]
struct WarmArgs {
    /// The evaluation date to warm (format: YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// How many user histories to fetch at once.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
}

#[derive(Parser)]
struct InvalidateArgs {
    /// The user whose cached metrics are dropped.
    #[arg(long)]
    user: String,

    /// One or more evaluation dates (format: YYYY-MM-DD).
    #[arg(long = "date", required = true, num_args = 1..)]
    dates: Vec<NaiveDate>,
}

// ==============================================================================
// Provider Wiring
// ==============================================================================

/// Connects to PostgreSQL and applies pending migrations.
///
/// `DATABASE_URL`, when set, takes precedence over `database.url`.
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DataStore>> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());
    let pool = connect(
        &url,
        config.database.max_connections,
        config.database.acquire_timeout,
    )
    .await
    .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(Arc::new(PgDataStore::new(pool)))
}

async fn open_cache(config: &Config) -> anyhow::Result<AnalyticsCache> {
    let settings = CacheSettings {
        key_prefix: config.cache.key_prefix.clone(),
        default_ttl: config.cache.default_ttl,
        op_timeout: config.cache.op_timeout,
    };

    let backend: Arc<dyn CacheBackend> = match &config.cache.provider {
        CacheProvider::Redis { url } => Arc::new(
            RedisBackend::connect(url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {url}"))?,
        ),
        CacheProvider::Memory => Arc::new(MemoryBackend::new()),
        CacheProvider::Disabled => {
            tracing::warn!("Analytics cache disabled, every read will miss");
            return Ok(AnalyticsCache::disabled(settings));
        }
    };

    let span = tracing::info_span!("analytics_cache", backend = backend.name());
    Ok(AnalyticsCache::new(backend, settings, config.breaker.clone())
        .with_calculator(MetricsCalculator::new(config.worker.risk_free_rate))
        .with_span(span))
}

fn open_push(config: &PushConfig) -> anyhow::Result<Arc<dyn PushSink>> {
    let sink: Arc<dyn PushSink> = match config {
        PushConfig::None => Arc::new(NoopSink),
        PushConfig::Broadcast { capacity } => {
            let sink = BroadcastSink::new(*capacity);
            let mut rx = sink.subscribe();
            tokio::spawn(async move {
                while let Ok(event) = rx.recv().await {
                    tracing::debug!(kind = %event.kind, user = %event.user_id, "Analytics event");
                }
            });
            Arc::new(sink)
        }
        PushConfig::Webhook { url, timeout } => Arc::new(
            WebhookSink::new(url, *timeout).context("Invalid webhook configuration")?,
        ),
    };
    tracing::info!(sink = sink.name(), "Push sink ready");
    Ok(sink)
}

async fn build_worker(config: &Config) -> anyhow::Result<AnalyticsWorker> {
    let store = open_store(config).await?;
    let cache = Arc::new(open_cache(config).await?);
    let push = open_push(&config.push)?;
    Ok(AnalyticsWorker::new(
        store,
        cache,
        push,
        config.worker.clone(),
        config.breaker.clone(),
    ))
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_run(config: &Config) -> anyhow::Result<()> {
    let worker = build_worker(config).await?;
    worker.start()?;
    println!("Analytics worker running. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    println!("Shutting down...");
    worker.stop().await?;

    println!("{}", serde_json::to_string_pretty(&worker.stats())?);
    Ok(())
}

async fn handle_run_once(args: RunOnceArgs, config: &Config) -> anyhow::Result<()> {
    let worker = build_worker(config).await?;
    let report = worker.run_once(args.task).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.aborted {
        anyhow::bail!("The {} cycle was aborted", args.task);
    }
    Ok(())
}

/// Fetches every active user's history concurrently, then warms the cache in bulk.
async fn handle_warm(args: WarmArgs, config: &Config) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let end = date
        .checked_add_days(Days::new(1))
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .context("Date out of range")?
        .and_utc();
    let lookback = chrono::Duration::from_std(config.worker.lookback)
        .context("Lookback out of range")?;
    let window = TimeWindow::trailing(end, lookback);

    let store = open_store(config).await?;
    let cache = open_cache(config).await?;

    let call_timeout = config.worker.call_timeout;
    let users = tokio::time::timeout(call_timeout, store.list_active_users(&window))
        .await
        .with_context(|| format!("Listing active users timed out after {call_timeout:?}"))??;
    println!("Warming {} users for {}", users.len(), date);

    let progress_bar = ProgressBar::new(users.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let results: Vec<(UserId, anyhow::Result<ReturnSeries>)> = stream::iter(users)
        .map(|user| {
            let store = Arc::clone(&store);
            let pb = progress_bar.clone();
            async move {
                let series = fetch_history(store.as_ref(), &user, window, call_timeout).await;
                pb.inc(1);
                (user, series)
            }
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect()
        .await;
    progress_bar.finish_with_message("Histories fetched");

    let mut histories = Vec::with_capacity(results.len());
    for (user, result) in results {
        match result {
            Ok(series) => histories.push(series),
            Err(e) => eprintln!("Skipping {user}: {e}"),
        }
    }

    let report = cache.warm_cache(&histories, date).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// One user's history under the per-call deadline.
async fn fetch_history(
    store: &dyn DataStore,
    user: &UserId,
    window: TimeWindow,
    call_timeout: Duration,
) -> anyhow::Result<ReturnSeries> {
    let samples = tokio::time::timeout(call_timeout, store.get_user_lineup_history(user, &window))
        .await
        .with_context(|| format!("History fetch timed out after {call_timeout:?}"))??;
    Ok(ReturnSeries::for_window(user.clone(), window, samples))
}

async fn handle_invalidate(args: InvalidateArgs, config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config).await?;
    let removed = cache.invalidate(&args.user, &args.dates).await?;
    println!("Removed {removed} cached entries for {}", args.user);
    Ok(())
}

async fn handle_sweep(config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config).await?;
    let report = cache.clear_expired_keys().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::{PerformanceMetrics, PortfolioAnalysis, Prediction};
    use async_trait::async_trait;
    use chrono::DateTime;
    use core_types::ReturnSample;
    use database::DbError;

    /// A store whose history query never returns.
    struct StalledStore;

    #[async_trait]
    impl DataStore for StalledStore {
        async fn list_active_users(&self, _: &TimeWindow) -> Result<Vec<UserId>, DbError> {
            Ok(vec![UserId::from("alice")])
        }
        async fn list_portfolio_eligible_users(&self, _: u32) -> Result<Vec<UserId>, DbError> {
            Ok(Vec::new())
        }
        async fn get_user_lineup_history(
            &self,
            _: &UserId,
            _: &TimeWindow,
        ) -> Result<Vec<ReturnSample>, DbError> {
            std::future::pending().await
        }
        async fn store_performance_report(
            &self,
            _: &UserId,
            _: &TimeWindow,
            _: &PerformanceMetrics,
        ) -> Result<(), DbError> {
            Ok(())
        }
        async fn store_portfolio_analysis(&self, _: &UserId, _: &PortfolioAnalysis) -> Result<(), DbError> {
            Ok(())
        }
        async fn store_prediction(&self, _: &UserId, _: &Prediction) -> Result<(), DbError> {
            Ok(())
        }
        async fn cleanup_older_than(&self, _: DateTime<Utc>) -> Result<u64, DbError> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_history_fetch_gives_up_after_the_call_timeout() {
        let window = TimeWindow::trailing(Utc::now(), chrono::Duration::days(30));
        let started = tokio::time::Instant::now();

        let result = fetch_history(
            &StalledStore,
            &UserId::from("alice"),
            window,
            Duration::from_secs(10),
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }
}
