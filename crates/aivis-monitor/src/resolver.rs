//! Competitor resolution and observation routing.
//!
//! Maps each detected rival name to its stable per-brand identity (creating
//! it on first sight) and folds the mention into that competitor's day row.
//! Failure granularity is one competitor: a bad name or a failed write is
//! logged and dropped, and the rest of the batch from the same response
//! keeps going.

use chrono::NaiveDate;
use sqlx::PgPool;

use aivis_analyzer::CompetitorMention;

use crate::aggregator::{record_observation, Observation};

/// Resolve and record every mentioned competitor from one analysis.
///
/// Entries the extraction flagged as not mentioned contribute nothing.
/// Returns the number of observations actually recorded.
pub async fn record_competitor_mentions(
    pool: &PgPool,
    brand_id: i64,
    date: NaiveDate,
    competitors: &[CompetitorMention],
) -> usize {
    let mut recorded = 0usize;

    for mention in competitors {
        if !mention.mentioned {
            continue;
        }

        let competitor_id =
            match aivis_db::resolve_competitor(pool, brand_id, &mention.name).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(
                        brand_id,
                        name = %mention.name,
                        error = %e,
                        "monitor: competitor resolution failed; dropping observation"
                    );
                    continue;
                }
            };

        let observation = Observation {
            position: mention.position,
            sentiment: mention.sentiment,
        };

        match record_observation(pool, competitor_id, date, &observation).await {
            Ok(()) => recorded += 1,
            Err(e) => {
                tracing::warn!(
                    competitor_id,
                    error = %e,
                    "monitor: metric merge failed; dropping observation"
                );
            }
        }
    }

    recorded
}
