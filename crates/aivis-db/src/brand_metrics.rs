//! Database operations for the `brand_metrics` table.
//!
//! The brand's own daily aggregate is populated by a reporting rollup over
//! that day's `prompt_results`, not by the pipeline's merge path. The rollup
//! is a single INSERT … SELECT … ON CONFLICT, so re-running it for a date is
//! idempotent.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `brand_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandMetricRow {
    pub id: i64,
    pub brand_id: i64,
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

/// Recomputes a brand's metric row for `date` from that day's results.
///
/// Detection rate is mentioned-runs over total runs; averages are taken over
/// mentioned runs only. The visibility and top-three bands match the
/// aggregator's constants (1–3 → 90, ranked → 60, unranked mention → 30;
/// top-three full credit 100). A day with no runs at all rolls up to a zero
/// row, which keeps trend charts continuous.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn refresh_brand_metric(
    pool: &PgPool,
    brand_id: i64,
    date: NaiveDate,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO brand_metrics \
             (brand_id, metric_date, mentions, avg_position, detection_rate, \
              sentiment_score, visibility_score, top_three_score, citation_count) \
         SELECT $1, $2, \
                COALESCE(COUNT(*) FILTER (WHERE pr.mentioned), 0)::int, \
                CAST(AVG(pr.rank_position) FILTER (WHERE pr.mentioned) AS NUMERIC(5,2)), \
                CAST(COALESCE(COUNT(*) FILTER (WHERE pr.mentioned)::numeric \
                     / NULLIF(COUNT(*), 0), 0) AS NUMERIC(6,3)), \
                CAST(COALESCE(AVG(CASE pr.sentiment WHEN 'positive' THEN 1 \
                     WHEN 'negative' THEN -1 ELSE 0 END) FILTER (WHERE pr.mentioned), 0) \
                     AS NUMERIC(6,3)), \
                CAST(COALESCE(AVG(CASE WHEN pr.rank_position BETWEEN 1 AND 3 THEN 90 \
                     WHEN pr.rank_position IS NOT NULL THEN 60 ELSE 30 END) \
                     FILTER (WHERE pr.mentioned), 0) AS NUMERIC(6,2)), \
                CAST(COALESCE(AVG(CASE WHEN pr.rank_position BETWEEN 1 AND 3 THEN 100 \
                     ELSE 0 END) FILTER (WHERE pr.mentioned), 0) AS NUMERIC(6,2)), \
                0 \
         FROM prompt_results pr \
         JOIN prompts p ON p.id = pr.prompt_id \
         WHERE p.brand_id = $1 AND (pr.run_at AT TIME ZONE 'UTC')::date = $2 \
         ON CONFLICT (brand_id, metric_date) DO UPDATE SET \
             mentions = EXCLUDED.mentions, \
             avg_position = EXCLUDED.avg_position, \
             detection_rate = EXCLUDED.detection_rate, \
             sentiment_score = EXCLUDED.sentiment_score, \
             visibility_score = EXCLUDED.visibility_score, \
             top_three_score = EXCLUDED.top_three_score, \
             updated_at = NOW()",
    )
    .bind(brand_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns a brand's metric rows for the trailing `days` window, oldest
/// first (dashboard trend order).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_metrics(
    pool: &PgPool,
    brand_id: i64,
    days: i64,
) -> Result<Vec<BrandMetricRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandMetricRow>(
        "SELECT id, brand_id, metric_date, visibility_score, sentiment_score, \
                top_three_score, mentions, avg_position, detection_rate, citation_count, \
                created_at, updated_at \
         FROM brand_metrics \
         WHERE brand_id = $1 \
           AND metric_date > CURRENT_DATE - $2::int \
         ORDER BY metric_date ASC",
    )
    .bind(brand_id)
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
