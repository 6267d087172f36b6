use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    brands::require_brand, map_db_error, normalize_days, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

/// One day's point on a visibility trend chart. Shared between the brand
/// and competitor metric endpoints; the two tables are structurally
/// parallel.
#[derive(Debug, Serialize)]
pub(super) struct MetricPointItem {
    pub metric_date: NaiveDate,
    pub visibility_score: Decimal,
    pub sentiment_score: Decimal,
    pub top_three_score: Decimal,
    pub mentions: i32,
    pub avg_position: Option<Decimal>,
    pub detection_rate: Decimal,
    pub citation_count: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendQuery {
    pub days: Option<i64>,
}

pub(super) async fn list_brand_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<MetricPointItem>>>, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    let rows = aivis_db::list_brand_metrics(&state.pool, brand.id, normalize_days(query.days))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| MetricPointItem {
            metric_date: row.metric_date,
            visibility_score: row.visibility_score,
            sentiment_score: row.sentiment_score,
            top_three_score: row.top_three_score,
            mentions: row.mentions,
            avg_position: row.avg_position,
            detection_rate: row.detection_rate,
            citation_count: row.citation_count,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
