use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aivis_providers::Provider;

use crate::middleware::RequestId;

use super::{
    brands::require_brand, map_db_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct PromptItem {
    pub id: i64,
    pub public_id: Uuid,
    pub text: String,
    pub category: String,
    pub providers: Vec<String>,
    pub is_subscribed: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<aivis_db::PromptRow> for PromptItem {
    fn from(row: aivis_db::PromptRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            text: row.text,
            category: row.category,
            providers: row.providers,
            is_subscribed: row.is_subscribed,
            last_run_at: row.last_run_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatePromptRequest {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    pub providers: Vec<String>,
    #[serde(default)]
    pub subscribed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(super) struct ResultItem {
    pub id: i64,
    pub provider: String,
    pub run_at: DateTime<Utc>,
    pub mentioned: bool,
    pub rank_position: Option<i32>,
    pub sentiment: String,
    pub response_text: String,
    pub citations: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResultsQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_prompts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<PromptItem>>>, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    let rows = aivis_db::list_prompts_for_brand(&state.pool, brand.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(PromptItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_prompt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(body): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PromptItem>>), ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    if body.text.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "prompt text must be non-empty",
        ));
    }
    if body.providers.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "at least one provider is required",
        ));
    }
    for provider in &body.providers {
        if provider.parse::<Provider>().is_err() {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("unknown provider '{provider}'"),
            ));
        }
    }

    let row = aivis_db::create_prompt(
        &state.pool,
        brand.id,
        body.text.trim(),
        body.category.as_deref().unwrap_or("general"),
        &body.providers,
        body.subscribed.unwrap_or(true),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PromptItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn delete_prompt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((slug, prompt_id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    aivis_db::delete_prompt(&state.pool, brand.id, prompt_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_prompt_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((slug, prompt_id)): Path<(String, i64)>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ApiResponse<Vec<ResultItem>>>, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    // Scope check: the prompt must belong to this brand.
    aivis_db::get_brand_prompt(&state.pool, brand.id, prompt_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            super::not_found(req_id.0.clone(), format!("prompt {prompt_id} not found"))
        })?;

    let rows =
        aivis_db::list_results_for_prompt(&state.pool, prompt_id, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ResultItem {
            id: row.id,
            provider: row.provider,
            run_at: row.run_at,
            mentioned: row.mentioned,
            rank_position: row.rank_position,
            sentiment: row.sentiment,
            response_text: row.response_text,
            citations: row.citations,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
