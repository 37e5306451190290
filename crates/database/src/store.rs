use crate::error::DbError;
use analytics::{PerformanceMetrics, PortfolioAnalysis, Prediction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{ReturnSample, TimeWindow, UserId};

/// The persistence operations the analytics worker depends on.
///
/// Implementations must be safe to share across the worker's tasks. Each call
/// is independent; the worker wraps every one in its own timeout.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Users with at least one lineup result inside `window`.
    async fn list_active_users(&self, window: &TimeWindow) -> Result<Vec<UserId>, DbError>;

    /// Users whose history spans at least `min_lineups` distinct lineups.
    async fn list_portfolio_eligible_users(&self, min_lineups: u32) -> Result<Vec<UserId>, DbError>;

    /// Every lineup result of `user` inside `window`, oldest first.
    async fn get_user_lineup_history(
        &self,
        user: &UserId,
        window: &TimeWindow,
    ) -> Result<Vec<ReturnSample>, DbError>;

    /// Upserts the report for `(user, window.end)`.
    async fn store_performance_report(
        &self,
        user: &UserId,
        window: &TimeWindow,
        metrics: &PerformanceMetrics,
    ) -> Result<(), DbError>;

    async fn store_portfolio_analysis(
        &self,
        user: &UserId,
        analysis: &PortfolioAnalysis,
    ) -> Result<(), DbError>;

    async fn store_prediction(&self, user: &UserId, prediction: &Prediction) -> Result<(), DbError>;

    /// Deletes derived analytics rows created before `cutoff` and returns how many went.
    async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError>;
}
