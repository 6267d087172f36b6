use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::metrics::{MetricPointItem, TrendQuery};
use super::{
    brands::require_brand, map_db_error, normalize_days, not_found, ApiError, ApiResponse,
    AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct CompetitorItem {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

pub(super) async fn list_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<CompetitorItem>>>, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    let rows = aivis_db::list_competitors_for_brand(&state.pool, brand.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CompetitorItem {
            id: row.id,
            name: row.name,
            domain: row.domain,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_competitor_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((slug, competitor_id)): Path<(String, i64)>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<MetricPointItem>>>, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    // Scope check: the competitor must belong to this brand.
    aivis_db::get_brand_competitor(&state.pool, brand.id, competitor_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            not_found(
                req_id.0.clone(),
                format!("competitor {competitor_id} not found"),
            )
        })?;

    let rows = aivis_db::list_metrics_for_competitor(
        &state.pool,
        competitor_id,
        normalize_days(query.days),
    )
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
