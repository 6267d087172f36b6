//! Database behaviour tests. Each test runs against a fresh migrated
//! database provisioned by `sqlx::test`.

use aivis_db::{DbError, MetricPatch, NewPromptResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

async fn seed_brand(pool: &PgPool, slug: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO brands (name, slug, is_active) VALUES ($1, $2, true) RETURNING id",
    )
    .bind(format!("Brand {slug}"))
    .bind(slug)
    .fetch_one(pool)
    .await
    .expect("seed_brand failed")
}

async fn seed_prompt(pool: &PgPool, brand_id: i64, text: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO prompts (brand_id, text, providers) \
         VALUES ($1, $2, ARRAY['openai']) RETURNING id",
    )
    .bind(brand_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .expect("seed_prompt failed")
}

fn metric_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 4).expect("valid date")
}

// ---------------------------------------------------------------------------
// Competitor resolution
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn resolve_competitor_is_idempotent_across_casings(pool: PgPool) {
    let brand_id = seed_brand(&pool, "resolve-brand").await;

    let first = aivis_db::resolve_competitor(&pool, brand_id, "Acme")
        .await
        .expect("first resolve");
    let second = aivis_db::resolve_competitor(&pool, brand_id, "acme")
        .await
        .expect("second resolve");
    let third = aivis_db::resolve_competitor(&pool, brand_id, "ACME")
        .await
        .expect("third resolve");

    assert_eq!(first, second);
    assert_eq!(second, third);

    let rows = aivis_db::list_competitors_for_brand(&pool, brand_id)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1, "exactly one row despite three casings");
    // First-seen casing wins.
    assert_eq!(rows[0].name, "Acme");
    assert_eq!(rows[0].domain, "");
}

#[sqlx::test(migrations = "../../migrations")]
async fn same_competitor_name_is_isolated_per_brand(pool: PgPool) {
    let brand_a = seed_brand(&pool, "scope-brand-a").await;
    let brand_b = seed_brand(&pool, "scope-brand-b").await;

    let id_a = aivis_db::resolve_competitor(&pool, brand_a, "Globex")
        .await
        .expect("resolve under A");
    let id_b = aivis_db::resolve_competitor(&pool, brand_b, "Globex")
        .await
        .expect("resolve under B");

    assert_ne!(id_a, id_b, "same name under two brands must be two rows");
}

#[sqlx::test(migrations = "../../migrations")]
async fn find_competitor_matches_case_insensitively(pool: PgPool) {
    let brand_id = seed_brand(&pool, "find-brand").await;
    let id = aivis_db::resolve_competitor(&pool, brand_id, "Initech")
        .await
        .expect("resolve");

    let found = aivis_db::find_competitor_by_name(&pool, brand_id, "iNiTeCh")
        .await
        .expect("find")
        .expect("should exist");
    assert_eq!(found.id, id);

    let missing = aivis_db::find_competitor_by_name(&pool, brand_id, "Hooli")
        .await
        .expect("find");
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn monitoring_batch_orders_least_recently_run_first(pool: PgPool) {
    let brand_id = seed_brand(&pool, "order-brand").await;

    let stale = seed_prompt(&pool, brand_id, "stale prompt").await;
    let fresh = seed_prompt(&pool, brand_id, "fresh prompt").await;
    let never_run = seed_prompt(&pool, brand_id, "never-run prompt").await;

    sqlx::query("UPDATE prompts SET last_run_at = NOW() - INTERVAL '2 days' WHERE id = $1")
        .bind(stale)
        .execute(&pool)
        .await
        .expect("age stale prompt");
    sqlx::query("UPDATE prompts SET last_run_at = NOW() WHERE id = $1")
        .bind(fresh)
        .execute(&pool)
        .await
        .expect("stamp fresh prompt");

    let batch = aivis_db::list_prompts_for_monitoring(&pool, 50)
        .await
        .expect("batch");
    let ids: Vec<i64> = batch.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![never_run, stale, fresh]);
    assert_eq!(batch[0].brand_name, "Brand order-brand");
}

#[sqlx::test(migrations = "../../migrations")]
async fn monitoring_batch_excludes_unsubscribed_and_respects_limit(pool: PgPool) {
    let brand_id = seed_brand(&pool, "filter-brand").await;

    for i in 0..3 {
        seed_prompt(&pool, brand_id, &format!("prompt {i}")).await;
    }
    let unsubscribed = seed_prompt(&pool, brand_id, "opted out").await;
    sqlx::query("UPDATE prompts SET is_subscribed = false WHERE id = $1")
        .bind(unsubscribed)
        .execute(&pool)
        .await
        .expect("unsubscribe");

    let batch = aivis_db::list_prompts_for_monitoring(&pool, 2)
        .await
        .expect("batch");
    assert_eq!(batch.len(), 2, "limit caps the batch");
    assert!(batch.iter().all(|p| p.id != unsubscribed));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_prompt_cascades_to_results(pool: PgPool) {
    let brand_id = seed_brand(&pool, "delete-brand").await;
    let prompt_id = seed_prompt(&pool, brand_id, "doomed prompt").await;

    aivis_db::insert_prompt_result(
        &pool,
        &NewPromptResult {
            prompt_id,
            provider: "openai",
            mentioned: true,
            rank_position: Some(1),
            sentiment: "positive",
            response_text: "Brand delete-brand is the best.",
        },
    )
    .await
    .expect("insert result");

    aivis_db::delete_prompt(&pool, brand_id, prompt_id)
        .await
        .expect("delete");

    let orphaned: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM prompt_results WHERE prompt_id = $1")
            .bind(prompt_id)
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(orphaned, 0, "results must be cascade-deleted");
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_prompt_is_not_found_for_wrong_brand_or_missing_id(pool: PgPool) {
    let brand_a = seed_brand(&pool, "owner-brand").await;
    let brand_b = seed_brand(&pool, "other-brand").await;
    let prompt_id = seed_prompt(&pool, brand_a, "owned prompt").await;

    let wrong_brand = aivis_db::delete_prompt(&pool, brand_b, prompt_id).await;
    assert!(matches!(wrong_brand, Err(DbError::NotFound)));

    let missing = aivis_db::delete_prompt(&pool, brand_a, 999_999).await;
    assert!(matches!(missing, Err(DbError::NotFound)));

    // The prompt survives both failed attempts.
    let still_there = aivis_db::get_brand_prompt(&pool, brand_a, prompt_id)
        .await
        .expect("get");
    assert!(still_there.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn touch_prompt_last_run_stamps_freshness(pool: PgPool) {
    let brand_id = seed_brand(&pool, "touch-brand").await;
    let prompt_id = seed_prompt(&pool, brand_id, "touched prompt").await;

    aivis_db::touch_prompt_last_run(&pool, prompt_id)
        .await
        .expect("touch");

    let row = aivis_db::get_brand_prompt(&pool, brand_id, prompt_id)
        .await
        .expect("get")
        .expect("exists");
    assert!(row.last_run_at.is_some());
}

// ---------------------------------------------------------------------------
// Prompt results
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn prompt_result_text_is_capped_and_citations_default_empty(pool: PgPool) {
    let brand_id = seed_brand(&pool, "cap-brand").await;
    let prompt_id = seed_prompt(&pool, brand_id, "capped prompt").await;

    let huge = "x".repeat(aivis_db::MAX_RESPONSE_TEXT_CHARS + 500);
    let id = aivis_db::insert_prompt_result(
        &pool,
        &NewPromptResult {
            prompt_id,
            provider: "anthropic",
            mentioned: false,
            rank_position: None,
            sentiment: "neutral",
            response_text: &huge,
        },
    )
    .await
    .expect("insert");

    let rows = aivis_db::list_results_for_prompt(&pool, prompt_id, 10)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(
        rows[0].response_text.chars().count(),
        aivis_db::MAX_RESPONSE_TEXT_CHARS
    );
    assert_eq!(rows[0].citations, serde_json::json!([]));
    assert!(rows[0].rank_position.is_none());
}

// ---------------------------------------------------------------------------
// Competitor metrics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn metric_day_row_roundtrip(pool: PgPool) {
    let brand_id = seed_brand(&pool, "metric-brand").await;
    let competitor_id = aivis_db::resolve_competitor(&pool, brand_id, "Globex")
        .await
        .expect("resolve");

    let none = aivis_db::get_metric_for_day(&pool, competitor_id, metric_date())
        .await
        .expect("get");
    assert!(none.is_none());

    let patch = MetricPatch {
        visibility_score: Decimal::new(90, 0),
        sentiment_score: Decimal::ONE,
        top_three_score: Decimal::new(100, 0),
        mentions: 1,
        avg_position: Some(Decimal::new(2, 0)),
    };
    let id = aivis_db::insert_metric_for_day(&pool, competitor_id, metric_date(), &patch)
        .await
        .expect("insert");

    let updated = MetricPatch {
        mentions: 2,
        avg_position: Some(Decimal::new(30, 1)), // 3.0
        ..patch
    };
    aivis_db::update_metric(&pool, id, &updated)
        .await
        .expect("update");

    let row = aivis_db::get_metric_for_day(&pool, competitor_id, metric_date())
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(row.mentions, 2);
    assert_eq!(row.avg_position, Some(Decimal::new(300, 2)));
    assert_eq!(row.detection_rate, Decimal::ZERO);
    assert_eq!(row.citation_count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_metric_day_row_is_rejected(pool: PgPool) {
    let brand_id = seed_brand(&pool, "unique-metric-brand").await;
    let competitor_id = aivis_db::resolve_competitor(&pool, brand_id, "Globex")
        .await
        .expect("resolve");

    let patch = MetricPatch {
        visibility_score: Decimal::new(60, 0),
        sentiment_score: Decimal::ZERO,
        top_three_score: Decimal::ZERO,
        mentions: 1,
        avg_position: None,
    };
    aivis_db::insert_metric_for_day(&pool, competitor_id, metric_date(), &patch)
        .await
        .expect("first insert");

    let second = aivis_db::insert_metric_for_day(&pool, competitor_id, metric_date(), &patch).await;
    assert!(
        matches!(second, Err(DbError::Sqlx(_))),
        "one row per (competitor, date): {second:?}"
    );
}

// ---------------------------------------------------------------------------
// Brand metric rollup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn brand_metric_rollup_computes_detection_rate(pool: PgPool) {
    let brand_id = seed_brand(&pool, "rollup-brand").await;
    let prompt_id = seed_prompt(&pool, brand_id, "rollup prompt").await;

    for (mentioned, rank, sentiment) in [
        (true, Some(2), "positive"),
        (true, Some(5), "neutral"),
        (false, None, "neutral"),
        (false, None, "neutral"),
    ] {
        aivis_db::insert_prompt_result(
            &pool,
            &NewPromptResult {
                prompt_id,
                provider: "openai",
                mentioned,
                rank_position: rank,
                sentiment,
                response_text: "rollup fixture",
            },
        )
        .await
        .expect("insert result");
    }

    let today: NaiveDate = sqlx::query_scalar("SELECT (NOW() AT TIME ZONE 'UTC')::date")
        .fetch_one(&pool)
        .await
        .expect("today");

    aivis_db::refresh_brand_metric(&pool, brand_id, today)
        .await
        .expect("rollup");

    let rows = aivis_db::list_brand_metrics(&pool, brand_id, 7)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.mentions, 2);
    assert_eq!(row.detection_rate, Decimal::new(500, 3)); // 2 of 4 runs
    assert_eq!(row.avg_position, Some(Decimal::new(350, 2))); // (2+5)/2
    assert_eq!(row.sentiment_score, Decimal::new(500, 3)); // (+1 + 0)/2

    // Re-running the rollup for the same date overwrites, never appends.
    aivis_db::refresh_brand_metric(&pool, brand_id, today)
        .await
        .expect("rollup again");
    let rows = aivis_db::list_brand_metrics(&pool, brand_id, 7)
        .await
        .expect("list again");
    assert_eq!(rows.len(), 1);
}
