//! Database operations for the `competitors` table.
//!
//! Competitor identity is a case-insensitive name within the owning brand's
//! scope, backed by a unique index on `(brand_id, lower(name))`. Resolution
//! is a single idempotent upsert, so two overlapping batch runs seeing the
//! same new name converge on one row instead of racing lookup-then-insert.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `competitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolves a detected competitor name to its stable id within a brand's
/// scope, creating the row (with an empty domain) on first sight.
///
/// The name is stored with its first-seen casing; later casings resolve to
/// the same row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn resolve_competitor(
    pool: &PgPool,
    brand_id: i64,
    name: &str,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO competitors (brand_id, name) \
         VALUES ($1, $2) \
         ON CONFLICT (brand_id, lower(name)) DO UPDATE SET updated_at = NOW() \
         RETURNING id",
    )
    .bind(brand_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Looks up a competitor by case-insensitive name within a brand's scope.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_competitor_by_name(
    pool: &PgPool,
    brand_id: i64,
    name: &str,
) -> Result<Option<CompetitorRow>, DbError> {
    let row = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, brand_id, name, domain, created_at, updated_at \
         FROM competitors \
         WHERE brand_id = $1 AND lower(name) = lower($2)",
    )
    .bind(brand_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a competitor scoped to its owning brand, or `None` when the id
/// does not exist or belongs to a different brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_competitor(
    pool: &PgPool,
    brand_id: i64,
    competitor_id: i64,
) -> Result<Option<CompetitorRow>, DbError> {
    let row = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, brand_id, name, domain, created_at, updated_at \
         FROM competitors \
         WHERE id = $2 AND brand_id = $1",
    )
    .bind(brand_id)
    .bind(competitor_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all competitors discovered for a brand, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors_for_brand(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<CompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, brand_id, name, domain, created_at, updated_at \
         FROM competitors \
         WHERE brand_id = $1 \
         ORDER BY name, id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
