//! Database operations for the `prompts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `prompts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub text: String,
    pub category: String,
    pub providers: Vec<String>,
    pub is_subscribed: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A prompt joined with its owning brand, as the monitoring loop consumes it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonitoredPromptRow {
    pub id: i64,
    pub brand_id: i64,
    pub brand_name: String,
    pub text: String,
    pub providers: Vec<String>,
    pub last_run_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Creates a prompt for a brand and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_prompt(
    pool: &PgPool,
    brand_id: i64,
    text: &str,
    category: &str,
    providers: &[String],
    is_subscribed: bool,
) -> Result<PromptRow, DbError> {
    let row = sqlx::query_as::<_, PromptRow>(
        "INSERT INTO prompts (brand_id, text, category, providers, is_subscribed) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, public_id, brand_id, text, category, providers, is_subscribed, \
                   last_run_at, created_at, updated_at",
    )
    .bind(brand_id)
    .bind(text)
    .bind(category)
    .bind(providers)
    .bind(is_subscribed)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all prompts for a brand, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prompts_for_brand(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<PromptRow>, DbError> {
    let rows = sqlx::query_as::<_, PromptRow>(
        "SELECT id, public_id, brand_id, text, category, providers, is_subscribed, \
                last_run_at, created_at, updated_at \
         FROM prompts \
         WHERE brand_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a prompt scoped to its owning brand, or `None` when the id does
/// not exist or belongs to a different brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_prompt(
    pool: &PgPool,
    brand_id: i64,
    prompt_id: i64,
) -> Result<Option<PromptRow>, DbError> {
    let row = sqlx::query_as::<_, PromptRow>(
        "SELECT id, public_id, brand_id, text, category, providers, is_subscribed, \
                last_run_at, created_at, updated_at \
         FROM prompts \
         WHERE id = $2 AND brand_id = $1",
    )
    .bind(brand_id)
    .bind(prompt_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Selects the next batch of subscribed prompts, least-recently-run first.
///
/// Prompts that have never run sort ahead of everything (`NULLS FIRST`), so
/// new prompts get their first run promptly. Only prompts of active brands
/// are eligible.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prompts_for_monitoring(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<MonitoredPromptRow>, DbError> {
    let rows = sqlx::query_as::<_, MonitoredPromptRow>(
        "SELECT p.id, p.brand_id, b.name AS brand_name, p.text, p.providers, p.last_run_at \
         FROM prompts p \
         JOIN brands b ON b.id = p.brand_id \
         WHERE p.is_subscribed AND b.is_active AND b.deleted_at IS NULL \
         ORDER BY p.last_run_at ASC NULLS FIRST, p.id ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Loads one prompt in the monitoring shape (with its brand), regardless of
/// subscription state — the on-demand run path works on unsubscribed prompts
/// too.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_prompt_for_monitoring(
    pool: &PgPool,
    prompt_id: i64,
) -> Result<Option<MonitoredPromptRow>, DbError> {
    let row = sqlx::query_as::<_, MonitoredPromptRow>(
        "SELECT p.id, p.brand_id, b.name AS brand_name, p.text, p.providers, p.last_run_at \
         FROM prompts p \
         JOIN brands b ON b.id = p.brand_id \
         WHERE p.id = $1 AND b.is_active AND b.deleted_at IS NULL",
    )
    .bind(prompt_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Stamps a prompt's freshness timestamp.
///
/// Called unconditionally after every monitoring attempt, success or not, so
/// a permanently-failing prompt still ages to the back of the batch order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn touch_prompt_last_run(pool: &PgPool, prompt_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE prompts \
         SET last_run_at = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(prompt_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Deletes a prompt scoped to its owning brand. The `prompt_results` cascade
/// removes its observations.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the prompt does not exist or belongs to
/// a different brand, or [`DbError::Sqlx`] if the delete fails.
pub async fn delete_prompt(pool: &PgPool, brand_id: i64, prompt_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM prompts WHERE id = $2 AND brand_id = $1")
        .bind(brand_id)
        .bind(prompt_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
