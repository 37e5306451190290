use crate::DbError;
use crate::store::DataStore;
use analytics::{PerformanceMetrics, PortfolioAnalysis, Prediction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{LineupId, ReturnSample, TimeWindow, UserId};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::types::Json;
use sqlx::Transaction;

/// Tables holding derived analytics rows, swept by the retention cleanup.
const DERIVED_TABLES: [&str; 3] = ["performance_reports", "portfolio_analyses", "predictions"];

/// The PostgreSQL implementation of [`DataStore`].
///
/// It encapsulates all SQL and row mapping. Derived records are stored as JSONB
/// documents, so adding a metric never needs a schema change.
#[derive(Debug, Clone)]
pub struct PgDataStore {
    pool: PgPool,
}

impl PgDataStore {
    /// Creates a new `PgDataStore` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sample_from_row(row: &PgRow) -> Result<ReturnSample, DbError> {
    let value: f64 = row.try_get("return_value")?;
    if !value.is_finite() {
        return Err(DbError::MalformedRow {
            table: "lineup_results",
            reason: format!("non-finite return value {value}"),
        });
    }
    Ok(ReturnSample {
        lineup_id: row.try_get::<LineupId, _>("lineup_id")?,
        timestamp: row.try_get("recorded_at")?,
        value,
        cumulative: row.try_get("cumulative_value")?,
    })
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn list_active_users(&self, window: &TimeWindow) -> Result<Vec<UserId>, DbError> {
        let users = sqlx::query_scalar::<_, UserId>(
            r#"
            SELECT DISTINCT user_id
            FROM lineup_results
            WHERE recorded_at >= $1 AND recorded_at < $2
            ORDER BY user_id
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_portfolio_eligible_users(&self, min_lineups: u32) -> Result<Vec<UserId>, DbError> {
        let users = sqlx::query_scalar::<_, UserId>(
            r#"
            SELECT user_id
            FROM lineup_results
            GROUP BY user_id
            HAVING COUNT(DISTINCT lineup_id) >= $1
            ORDER BY user_id
            "#,
        )
        .bind(i64::from(min_lineups))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_user_lineup_history(
        &self,
        user: &UserId,
        window: &TimeWindow,
    ) -> Result<Vec<ReturnSample>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT lineup_id, recorded_at, return_value, cumulative_value
            FROM lineup_results
            WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at < $3
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(user)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sample_from_row).collect()
    }

    async fn store_performance_report(
        &self,
        user: &UserId,
        window: &TimeWindow,
        metrics: &PerformanceMetrics,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO performance_reports (user_id, window_start, window_end, metrics)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, window_end)
            DO UPDATE SET window_start = EXCLUDED.window_start,
                          metrics = EXCLUDED.metrics,
                          created_at = now()
            "#,
        )
        .bind(user)
        .bind(window.start)
        .bind(window.end)
        .bind(Json(metrics))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_portfolio_analysis(
        &self,
        user: &UserId,
        analysis: &PortfolioAnalysis,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO portfolio_analyses (user_id, as_of, analysis)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, as_of) DO UPDATE SET analysis = EXCLUDED.analysis
            "#,
        )
        .bind(user)
        .bind(analysis.as_of)
        .bind(Json(analysis))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_prediction(&self, user: &UserId, prediction: &Prediction) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO predictions (user_id, as_of, model_version, prediction)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, as_of)
            DO UPDATE SET model_version = EXCLUDED.model_version,
                          prediction = EXCLUDED.prediction
            "#,
        )
        .bind(user)
        .bind(prediction.as_of)
        .bind(&prediction.model_version)
        .bind(Json(prediction))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Runs all deletes in a single transaction so a failed cleanup leaves every table untouched.
    async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

        let mut removed = 0;
        for table in DERIVED_TABLES {
            let result = sqlx::query(&format!("DELETE FROM {table} WHERE created_at < $1"))
                .bind(cutoff)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(table, rows = result.rows_affected(), "Expired analytics rows deleted");
            removed += result.rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }
}
