//! Database operations for the `prompt_results` table.
//!
//! Rows are immutable observations: created once per (prompt, provider, run),
//! never updated, removed only by the cascade when their prompt is deleted.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// Raw response text is capped at this many characters on insert.
pub const MAX_RESPONSE_TEXT_CHARS: usize = 10_000;

/// A row from the `prompt_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptResultRow {
    pub id: i64,
    pub prompt_id: i64,
    pub provider: String,
    pub run_at: DateTime<Utc>,
    pub mentioned: bool,
    pub rank_position: Option<i32>,
    pub sentiment: String,
    pub response_text: String,
    /// Reserved for provider citation lists; currently always `[]`.
    pub citations: Value,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a new `prompt_results` row.
#[derive(Debug)]
pub struct NewPromptResult<'a> {
    pub prompt_id: i64,
    pub provider: &'a str,
    pub mentioned: bool,
    pub rank_position: Option<i32>,
    pub sentiment: &'a str,
    pub response_text: &'a str,
}

/// Inserts a result row and returns its generated id.
///
/// `response_text` is truncated to [`MAX_RESPONSE_TEXT_CHARS`] characters;
/// `run_at` and `citations` take their column defaults (`NOW()`, `[]`).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_prompt_result(
    pool: &PgPool,
    result: &NewPromptResult<'_>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO prompt_results \
             (prompt_id, provider, mentioned, rank_position, sentiment, response_text) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(result.prompt_id)
    .bind(result.provider)
    .bind(result.mentioned)
    .bind(result.rank_position)
    .bind(result.sentiment)
    .bind(truncate_chars(result.response_text, MAX_RESPONSE_TEXT_CHARS))
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns recent results for a prompt, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_results_for_prompt(
    pool: &PgPool,
    prompt_id: i64,
    limit: i64,
) -> Result<Vec<PromptResultRow>, DbError> {
    let rows = sqlx::query_as::<_, PromptResultRow>(
        "SELECT id, prompt_id, provider, run_at, mentioned, rank_position, sentiment, \
                response_text, citations, created_at \
         FROM prompt_results \
         WHERE prompt_id = $1 \
         ORDER BY run_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(prompt_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_noop_below_cap() {
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn truncate_cuts_at_char_boundary() {
        let text = "ünïcödé".repeat(2_000);
        let cut = truncate_chars(&text, MAX_RESPONSE_TEXT_CHARS);
        assert_eq!(cut.chars().count(), MAX_RESPONSE_TEXT_CHARS);
    }
}
