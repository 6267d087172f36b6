//! Database operations for the `competitor_metrics` table.
//!
//! At most one row exists per (competitor, date) — enforced by a unique
//! constraint. The merge arithmetic lives in `aivis-monitor`'s aggregator;
//! this module only reads the day row and writes the computed patch, each as
//! its own atomic statement.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `competitor_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorMetricRow {
    pub id: i64,
    pub competitor_id: i64,
    pub metric_date: NaiveDate,
    pub visibility_score: Decimal,
    pub sentiment_score: Decimal,
    pub top_three_score: Decimal,
    pub mentions: i32,
    pub avg_position: Option<Decimal>,
    pub detection_rate: Decimal,
    pub citation_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The mutable slice of a day row, as computed by the aggregator's merge.
///
/// `detection_rate` and `citation_count` are not part of the merge path and
/// keep their column defaults / prior values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPatch {
    pub visibility_score: Decimal,
    pub sentiment_score: Decimal,
    pub top_three_score: Decimal,
    pub mentions: i32,
    pub avg_position: Option<Decimal>,
}

/// Fetches the metric row for one competitor-day, or `None` if this is the
/// day's first observation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_metric_for_day(
    pool: &PgPool,
    competitor_id: i64,
    date: NaiveDate,
) -> Result<Option<CompetitorMetricRow>, DbError> {
    let row = sqlx::query_as::<_, CompetitorMetricRow>(
        "SELECT id, competitor_id, metric_date, visibility_score, sentiment_score, \
                top_three_score, mentions, avg_position, detection_rate, citation_count, \
                created_at, updated_at \
         FROM competitor_metrics \
         WHERE competitor_id = $1 AND metric_date = $2",
    )
    .bind(competitor_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates the day row from the first observation's patch. Returns the
/// generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a unique
/// violation when another writer created the day row concurrently).
pub async fn insert_metric_for_day(
    pool: &PgPool,
    competitor_id: i64,
    date: NaiveDate,
    patch: &MetricPatch,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO competitor_metrics \
             (competitor_id, metric_date, visibility_score, sentiment_score, \
              top_three_score, mentions, avg_position) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(competitor_id)
    .bind(date)
    .bind(patch.visibility_score)
    .bind(patch.sentiment_score)
    .bind(patch.top_three_score)
    .bind(patch.mentions)
    .bind(patch.avg_position)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Overwrites an existing day row with a merged patch.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row has vanished, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_metric(pool: &PgPool, id: i64, patch: &MetricPatch) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE competitor_metrics \
         SET visibility_score = $2, sentiment_score = $3, top_three_score = $4, \
             mentions = $5, avg_position = $6, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(patch.visibility_score)
    .bind(patch.sentiment_score)
    .bind(patch.top_three_score)
    .bind(patch.mentions)
    .bind(patch.avg_position)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Returns a competitor's metric rows for the trailing `days` window,
/// oldest first (dashboard trend order).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_metrics_for_competitor(
    pool: &PgPool,
    competitor_id: i64,
    days: i64,
) -> Result<Vec<CompetitorMetricRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorMetricRow>(
        "SELECT id, competitor_id, metric_date, visibility_score, sentiment_score, \
                top_three_score, mentions, avg_position, detection_rate, citation_count, \
                created_at, updated_at \
         FROM competitor_metrics \
         WHERE competitor_id = $1 \
           AND metric_date > CURRENT_DATE - $2::int \
         ORDER BY metric_date ASC",
    )
    .bind(competitor_id)
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
