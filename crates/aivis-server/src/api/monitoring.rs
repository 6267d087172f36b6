use axum::{
    extract::{Path, State},
    Extension, Json,
};

use aivis_monitor::{BatchSummary, MonitorError, ProviderOutcome};

use crate::middleware::RequestId;

use super::{
    brands::require_brand, map_db_error, not_found, ApiError, ApiResponse, AppState, ResponseMeta,
};

/// On-demand batch run. Returns the aggregate summary, consistent with the
/// scheduled path's unattended nature.
pub(super) async fn run_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<BatchSummary>>, ApiError> {
    let summary = aivis_monitor::run_monitoring_batch(
        &state.pool,
        &state.client,
        state.extractor.as_ref(),
        &state.monitor,
    )
    .await
    .map_err(|e| map_monitor_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// On-demand single-prompt run. Returns one entry per configured provider,
/// including explicit skip entries, so the caller can see exactly which
/// providers produced data.
pub(super) async fn run_prompt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((slug, prompt_id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<Vec<ProviderOutcome>>>, ApiError> {
    let brand = require_brand(&state, &req_id.0, &slug).await?;

    // Scope check: the prompt must belong to this brand.
    aivis_db::get_brand_prompt(&state.pool, brand.id, prompt_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            not_found(req_id.0.clone(), format!("prompt {prompt_id} not found"))
        })?;

    let outcomes = aivis_monitor::run_single_prompt(
        &state.pool,
        &state.client,
        state.extractor.as_ref(),
        prompt_id,
    )
    .await
    .map_err(|e| map_monitor_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: outcomes,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_monitor_error(request_id: String, error: &MonitorError) -> ApiError {
    match error {
        MonitorError::PromptNotFound(id) => {
            not_found(request_id, format!("prompt {id} not found"))
        }
        MonitorError::Db(e) => map_db_error(request_id, e),
    }
}
