use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, not_found, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BrandItem {
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<aivis_db::BrandRow> for BrandItem {
    fn from(row: aivis_db::BrandRow) -> Self {
        Self {
            public_id: row.public_id,
            name: row.name,
            slug: row.slug,
            domain: row.domain,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandItem>>>, ApiError> {
    let rows = aivis_db::list_active_brands(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(BrandItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BrandItem>>, ApiError> {
    let row = aivis_db::get_brand_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), format!("brand '{slug}' not found")))?;

    Ok(Json(ApiResponse {
        data: BrandItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Shared helper: load a brand by slug or 404.
pub(super) async fn require_brand(
    state: &AppState,
    req_id: &str,
    slug: &str,
) -> Result<aivis_db::BrandRow, ApiError> {
    aivis_db::get_brand_by_slug(&state.pool, slug)
        .await
        .map_err(|e| map_db_error(req_id.to_string(), &e))?
        .ok_or_else(|| not_found(req_id.to_string(), format!("brand '{slug}' not found")))
}
