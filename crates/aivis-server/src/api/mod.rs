mod brands;
mod competitors;
mod metrics;
mod monitoring;
mod prompts;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use aivis_analyzer::Extractor;
use aivis_monitor::MonitorConfig;
use aivis_providers::ProviderClient;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub client: Arc<ProviderClient>,
    pub extractor: Arc<dyn Extractor>,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Clamp a `days` query parameter into a sane dashboard window.
pub(super) fn normalize_days(days: Option<i64>) -> i64 {
    days.unwrap_or(30).clamp(1, 365)
}

/// Clamp a `limit` query parameter for list endpoints.
pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &aivis_db::DbError) -> ApiError {
    if matches!(error, aivis_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn not_found(request_id: String, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "not_found", message)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/brands", get(brands::list_brands))
        .route("/api/v1/brands/{slug}", get(brands::get_brand))
        .route(
            "/api/v1/brands/{slug}/prompts",
            get(prompts::list_prompts).post(prompts::create_prompt),
        )
        .route(
            "/api/v1/brands/{slug}/prompts/{prompt_id}",
            delete(prompts::delete_prompt),
        )
        .route(
            "/api/v1/brands/{slug}/prompts/{prompt_id}/results",
            get(prompts::list_prompt_results),
        )
        .route(
            "/api/v1/brands/{slug}/prompts/{prompt_id}/run",
            post(monitoring::run_prompt),
        )
        .route(
            "/api/v1/brands/{slug}/competitors",
            get(competitors::list_competitors),
        )
        .route(
            "/api/v1/brands/{slug}/competitors/{competitor_id}/metrics",
            get(competitors::list_competitor_metrics),
        )
        .route(
            "/api/v1/brands/{slug}/metrics",
            get(metrics::list_brand_metrics),
        )
        .route("/api/v1/monitoring/run", post(monitoring::run_batch))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match aivis_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::prompts::PromptItem;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state(pool: sqlx::PgPool) -> AppState {
        let client = aivis_providers::ProviderClient::with_base_urls(
            aivis_providers::ProviderCredentials::default(),
            aivis_providers::ModelConfig::default(),
            5,
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
        )
        .expect("client");
        AppState {
            pool,
            client: Arc::new(client),
            extractor: Arc::new(aivis_analyzer::RuleExtractor::unavailable()),
            monitor: MonitorConfig {
                batch_size: 50,
                pacing_delay: Duration::ZERO,
            },
        }
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        build_app(test_state(pool), auth, default_rate_limit_state())
    }

    #[test]
    fn prompt_item_is_serializable() {
        // Proves the type compiles and serde works, no DB needed.
        let item = PromptItem {
            id: 7,
            public_id: Uuid::new_v4(),
            text: "What are the best widget brands?".to_string(),
            category: "discovery".to_string(),
            providers: vec!["openai".to_string()],
            is_subscribed: true,
            last_run_at: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"category\":\"discovery\""));
        assert!(json.contains("\"last_run_at\":null"));
    }

    #[test]
    fn normalize_days_applies_defaults_and_bounds() {
        assert_eq!(normalize_days(None), 30);
        assert_eq!(normalize_days(Some(0)), 1);
        assert_eq!(normalize_days(Some(10_000)), 365);
        assert_eq!(normalize_days(Some(90)), 90);
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // -------------------------------------------------------------------------
    // Route integration tests (with DB)
    // -------------------------------------------------------------------------

    async fn seed_brand(pool: &sqlx::PgPool, slug: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO brands (name, slug, is_active) VALUES ($1, $2, true) RETURNING id",
        )
        .bind(format!("Brand {slug}"))
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("seed_brand failed")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_brands_returns_ok(pool: sqlx::PgPool) {
        seed_brand(&pool, "list-brand").await;

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/brands")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["slug"].as_str(), Some("list-brand"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_brand_returns_404_for_unknown_slug(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/brands/nonexistent-slug-xyz")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn prompt_crud_roundtrip(pool: sqlx::PgPool) {
        seed_brand(&pool, "crud-brand").await;
        let app = test_app(pool);

        // Create
        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/brands/crud-brand/prompts")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "text": "Best widget brands?",
                    "category": "discovery",
                    "providers": ["openai", "gemini"]
                })
                .to_string(),
            ))
            .expect("request");
        let response = app.clone().oneshot(create).await.expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let prompt_id = created["data"]["id"].as_i64().expect("id");
        assert_eq!(created["data"]["is_subscribed"], true);

        // List
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/brands/crud-brand/prompts")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let listed = body_json(response).await;
        assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));

        // Delete
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/brands/crud-brand/prompts/{prompt_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Delete again: gone means 404.
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/brands/crud-brand/prompts/{prompt_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_prompt_rejects_unknown_provider(pool: sqlx::PgPool) {
        seed_brand(&pool, "valid-brand").await;

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/brands/valid-brand/prompts")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "text": "Best widget brands?",
                            "providers": ["copilot"]
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn delete_prompt_of_another_brand_is_404(pool: sqlx::PgPool) {
        let owner = seed_brand(&pool, "owner-b").await;
        seed_brand(&pool, "intruder-b").await;
        let prompt_id: i64 = sqlx::query_scalar(
            "INSERT INTO prompts (brand_id, text, providers) \
             VALUES ($1, 'owned', ARRAY['openai']) RETURNING id",
        )
        .bind(owner)
        .fetch_one(&pool)
        .await
        .expect("seed prompt");

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/brands/intruder-b/prompts/{prompt_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn run_prompt_endpoint_reports_per_provider_outcomes(pool: sqlx::PgPool) {
        let brand_id = seed_brand(&pool, "run-brand").await;
        let prompt_id: i64 = sqlx::query_scalar(
            "INSERT INTO prompts (brand_id, text, providers) \
             VALUES ($1, 'Best widgets?', ARRAY['gemini', 'openai']) RETURNING id",
        )
        .bind(brand_id)
        .fetch_one(&pool)
        .await
        .expect("seed prompt");

        // State has no provider credentials, so openai skips with
        // missing_credentials and gemini with not_implemented. Both are
        // explicit entries, not errors.
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/brands/run-brand/prompts/{prompt_id}/run"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let outcomes = json["data"].as_array().expect("outcomes");
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0]["status"], "skipped");
        assert_eq!(outcomes[0]["provider"], "gemini");
        assert_eq!(outcomes[0]["reason"], "not_implemented");
        assert_eq!(outcomes[1]["provider"], "openai");
        assert_eq!(outcomes[1]["reason"], "missing_credentials");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn brand_metrics_endpoint_returns_trend_rows(pool: sqlx::PgPool) {
        let brand_id = seed_brand(&pool, "trend-brand").await;
        sqlx::query(
            "INSERT INTO brand_metrics (brand_id, metric_date, mentions, detection_rate) \
             VALUES ($1, CURRENT_DATE, 3, 0.75)",
        )
        .bind(brand_id)
        .execute(&pool)
        .await
        .expect("seed metric");

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/brands/trend-brand/metrics?days=7")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["mentions"].as_i64(), Some(3));
    }
}
