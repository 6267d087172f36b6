//! Per-day metric aggregation for competitors.
//!
//! [`apply_observation`] is the whole merge algorithm as a pure function;
//! [`record_observation`] wraps it in the read-patch-write cycle. The read
//! and the write are independent atomic statements, never one transaction:
//! an interrupted run leaves a complete, valid day row behind.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use aivis_analyzer::Sentiment;
use aivis_db::{CompetitorMetricRow, DbError, MetricPatch};

/// One mention observation, as the analyzer produced it.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub position: Option<i32>,
    pub sentiment: Sentiment,
}

const VISIBILITY_TOP: Decimal = Decimal::from_parts(90, 0, 0, false, 0);
const VISIBILITY_RANKED: Decimal = Decimal::from_parts(60, 0, 0, false, 0);
const VISIBILITY_UNRANKED: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const TOP_THREE_CREDIT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Merge one observation into the (possibly absent) day row.
///
/// First observation of the day: `mentions = 1`, the average is the
/// observation's position (unset when unranked), sentiment and the
/// visibility bands come straight from the observation.
///
/// Later observations: `mentions` increments, sentiment is last-write-wins
/// (not blended), and when the new observation carries a position the
/// stored average becomes `(new_position + previous_average) / 2`. That is
/// a two-term mean of the new value and the prior average, NOT a cumulative
/// mean over all observations: recent observations weigh heavier and the
/// value drifts instead of converging. This is intentional behavior parity
/// with the metrics the dashboards were built on. A true mean would use
/// `mentions` as the divisor; do not make that change silently.
///
/// An unranked later observation leaves the average and both visibility
/// bands untouched, since it carries no rank signal to re-band on.
#[must_use]
pub fn apply_observation(
    existing: Option<&CompetitorMetricRow>,
    obs: &Observation,
) -> MetricPatch {
    match existing {
        None => MetricPatch {
            visibility_score: visibility_band(obs.position),
            sentiment_score: sentiment_value(obs.sentiment),
            top_three_score: top_three_credit(obs.position),
            mentions: 1,
            avg_position: obs.position.map(Decimal::from),
        },
        Some(row) => {
            let (avg_position, visibility_score, top_three_score) = match obs.position {
                Some(position) => {
                    let new_pos = Decimal::from(position);
                    let avg = match row.avg_position {
                        Some(prev) => (new_pos + prev) / Decimal::TWO,
                        None => new_pos,
                    };
                    (
                        Some(avg),
                        visibility_band(Some(position)),
                        top_three_credit(Some(position)),
                    )
                }
                None => (row.avg_position, row.visibility_score, row.top_three_score),
            };

            MetricPatch {
                visibility_score,
                sentiment_score: sentiment_value(obs.sentiment),
                top_three_score,
                mentions: row.mentions + 1,
                avg_position,
            }
        }
    }
}

/// Fold one observation into the competitor's day row, creating it if this
/// is the day's first.
///
/// # Errors
///
/// Returns [`DbError`] if the read or the write fails.
pub async fn record_observation(
    pool: &PgPool,
    competitor_id: i64,
    date: NaiveDate,
    obs: &Observation,
) -> Result<(), DbError> {
    let existing = aivis_db::get_metric_for_day(pool, competitor_id, date).await?;
    let patch = apply_observation(existing.as_ref(), obs);

    match existing {
        Some(row) => aivis_db::update_metric(pool, row.id, &patch).await,
        None => aivis_db::insert_metric_for_day(pool, competitor_id, date, &patch)
            .await
            .map(|_| ()),
    }
}

fn visibility_band(position: Option<i32>) -> Decimal {
    match position {
        Some(1..=3) => VISIBILITY_TOP,
        Some(_) => VISIBILITY_RANKED,
        None => VISIBILITY_UNRANKED,
    }
}

fn top_three_credit(position: Option<i32>) -> Decimal {
    if matches!(position, Some(1..=3)) {
        TOP_THREE_CREDIT
    } else {
        Decimal::ZERO
    }
}

fn sentiment_value(sentiment: Sentiment) -> Decimal {
    match sentiment {
        Sentiment::Positive => Decimal::ONE,
        Sentiment::Neutral => Decimal::ZERO,
        Sentiment::Negative => -Decimal::ONE,
    }
}
