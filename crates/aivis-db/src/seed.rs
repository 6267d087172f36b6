use aivis_core::seed::BrandSeed;
use sqlx::PgPool;

use crate::DbError;

/// Upsert brands and their prompts from seed config into the database.
///
/// Returns the number of brands processed. Brands conflict on slug and are
/// updated in place; prompts have no natural key, so a prompt is inserted
/// only when the brand has no prompt with identical text yet — re-seeding is
/// idempotent and never duplicates.
///
/// All statements run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_brands(pool: &PgPool, brands: &[BrandSeed]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for brand in brands {
        let slug = brand.slug();

        let brand_id: i64 = sqlx::query_scalar(
            "INSERT INTO brands (name, slug, domain, is_active) \
             VALUES ($1, $2, $3, true) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 domain = EXCLUDED.domain, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(&brand.name)
        .bind(&slug)
        .bind(&brand.domain)
        .fetch_one(&mut *tx)
        .await?;

        for prompt in &brand.prompts {
            let category = prompt.category.as_deref().unwrap_or("general");
            let subscribed = prompt.subscribed.unwrap_or(true);

            sqlx::query(
                "INSERT INTO prompts (brand_id, text, category, providers, is_subscribed) \
                 SELECT $1, $2, $3, $4, $5 \
                 WHERE NOT EXISTS ( \
                     SELECT 1 FROM prompts WHERE brand_id = $1 AND text = $2 \
                 )",
            )
            .bind(brand_id)
            .bind(&prompt.text)
            .bind(category)
            .bind(&prompt.providers)
            .bind(subscribed)
            .execute(&mut *tx)
            .await?;
        }

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
