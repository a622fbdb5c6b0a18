//! HTTP Endpoints
//!
//! REST API for the loan desk helpers.

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use loan_desk_core::{LtvMatrix, LtvRateQuote, RateMatrix};
use loan_desk_tools::{CaseSnapshot, FeedKind};

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let timeout = Duration::from_secs(config.server.timeout_seconds);
    drop(config);

    Router::new()
        // LTV/rate helper
        .route("/api/ltv-rate/quote", get(ltv_rate_quote))
        .route("/api/ltv-rate/rates", get(ltv_rate_rates))
        .route("/api/ltv-rate/ltv", get(ltv_rate_ltv))
        // Feed wizard
        .route("/api/feeds", get(list_feeds))
        .route("/api/feeds/:kind", post(render_feed))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // Admin
        .route("/admin/reload-config", post(reload_config))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

fn localhost_cors() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    match FALLBACK_ORIGIN.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => layer,
    }
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        return localhost_cors();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        return localhost_cors();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Query shared by the LTV/rate endpoints
#[derive(Debug, Default, Deserialize)]
struct LtvRateParams {
    #[serde(default)]
    address: Option<String>,
    /// Kept as text; fractional scores ("850.0") are truncated, anything
    /// non-numeric or negative is unclassified
    #[serde(default)]
    credit_score: Option<String>,
}

impl LtvRateParams {
    fn credit_score(&self) -> Option<u32> {
        let raw = self.credit_score.as_deref()?.trim();
        raw.parse::<u32>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|score| score.is_finite() && *score >= 0.0 && *score <= u32::MAX as f64)
                .map(|score| score.trunc() as u32)
        })
    }
}

/// GET /api/ltv-rate/quote
async fn ltv_rate_quote(
    State(state): State<AppState>,
    Query(params): Query<LtvRateParams>,
) -> Result<Json<LtvRateQuote>, ServerError> {
    let quote = state
        .ltv_rate
        .quote(params.address.as_deref(), params.credit_score())
        .await?;
    Ok(Json(quote))
}

/// GET /api/ltv-rate/rates
async fn ltv_rate_rates(
    State(state): State<AppState>,
    Query(params): Query<LtvRateParams>,
) -> Result<Json<RateMatrix>, ServerError> {
    let matrix = state
        .ltv_rate
        .rate_matrix(params.address.as_deref(), params.credit_score())
        .await?;
    Ok(Json(matrix))
}

/// GET /api/ltv-rate/ltv
async fn ltv_rate_ltv(
    State(state): State<AppState>,
    Query(params): Query<LtvRateParams>,
) -> Result<Json<LtvMatrix>, ServerError> {
    let matrix = state
        .ltv_rate
        .ltv_matrix(params.address.as_deref(), params.credit_score())
        .await?;
    Ok(Json(matrix))
}

/// GET /api/feeds
async fn list_feeds(State(state): State<AppState>) -> Json<serde_json::Value> {
    let kinds: Vec<&str> = state.feeds.kinds().iter().map(FeedKind::label).collect();
    Json(serde_json::json!({ "kinds": kinds }))
}

/// POST /api/feeds/:kind
async fn render_feed(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(case): Json<CaseSnapshot>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let kind: FeedKind = kind.parse()?;
    let message = state.feeds.render(kind, &case)?;

    Ok(Json(serde_json::json!({
        "kind": kind.label(),
        "message": message,
    })))
}

/// Liveness plus a summary of what is loaded
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "tables": if state.ltv_rate.is_ready() { "loaded" } else { "pending" },
            "feed_templates": state.feeds.kinds().len(),
        }
    }))
}

/// Ready once the reference tables load; the first probe triggers the load
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.ltv_rate.calculator().await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "message": e.to_string(),
            })),
        ),
    }
}

/// POST /admin/reload-config
///
/// Note: server settings (CORS, timeout) are only applied at startup.
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "Configuration reloaded successfully"
            })),
        ),
        Err(e) => {
            tracing::error!("Config reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use loan_desk_config::{FeedTemplatesConfig, Settings, TablesConfig};
    use loan_desk_tools::{FeedWizard, LtvRateService};
    use tower::ServiceExt;

    const REGIONS: &str = r#"{"서울": 1, "부산": 1}"#;
    const LTV: &str = r#"{"N865점 이상 (1-2구간)": {"서울_1급지": "80%", "인천및광역시_1급지": "70%"}}"#;
    const RATES: &str = r#"{"N865점 이상 (1-2구간)": {"~70%": "4.9%", "~80%": "5.6%"}, "N790점 이상 (3-4구간)": {"~70%": "5.5%"}}"#;

    fn state_in(dir: &std::path::Path) -> AppState {
        let tables = TablesConfig::in_dir(dir);
        let feeds = FeedWizard::new(FeedTemplatesConfig::embedded().unwrap());
        AppState::with_services(Settings::default(), LtvRateService::new(tables, 0.5), feeds)
    }

    fn write_tables(dir: &std::path::Path) {
        let tables = TablesConfig::in_dir(dir);
        std::fs::write(tables.regional_tiers_path(), REGIONS).unwrap();
        std::fs::write(tables.ltv_path(), LTV).unwrap();
        std::fs::write(tables.interest_rate_path(), RATES).unwrap();
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_quote_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let app = create_router(state_in(dir.path()));

        // 서울특별시 강남구
        let (status, body) = get_json(
            app,
            "/api/ltv-rate/quote?address=%EC%84%9C%EC%9A%B8%ED%8A%B9%EB%B3%84%EC%8B%9C%20%EA%B0%95%EB%82%A8%EA%B5%AC&credit_score=880",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["region"], "서울");
        assert_eq!(body["region_key"], "서울_1급지");
        assert_eq!(body["credit_band"], "N865점 이상 (1-2구간)");
        assert_eq!(body["ltv"], 80.0);
        assert_eq!(body["info"]["credit_score"], "N880점 (N865점 이상 (1-2구간))");
        assert_eq!(body["rates"][0]["cell"]["total"], 4.9);
    }

    #[tokio::test]
    async fn test_rates_endpoint_surcharges_and_marks_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let app = create_router(state_in(dir.path()));

        // 부산광역시 해운대구
        let (status, body) = get_json(
            app,
            "/api/ltv-rate/rates?address=%EB%B6%80%EC%82%B0%EA%B4%91%EC%97%AD%EC%8B%9C%20%ED%95%B4%EC%9A%B4%EB%8C%80%EA%B5%AC&credit_score=800",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ltv_ranges"], serde_json::json!(["~70%", "~80%"]));
        assert_eq!(body["surcharge"], 0.5);
        assert_eq!(body["rows"][0]["cells"][1]["total"], 6.1);
        assert_eq!(body["rows"][1]["is_current"], true);
        assert_eq!(body["rows"][1]["cells"][1]["status"], "no_data");
    }

    #[tokio::test]
    async fn test_unparseable_credit_score_is_unclassified() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let app = create_router(state_in(dir.path()));

        let (status, body) = get_json(app, "/api/ltv-rate/quote?credit_score=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["credit_band"].is_null());
        assert!(body["region_key"].is_null());
        assert_eq!(body["info"]["address"], "-");
        assert_eq!(body["rates"], serde_json::json!([]));
    }

    #[test]
    fn test_credit_score_param_parsing() {
        let params = |raw: &str| LtvRateParams {
            address: None,
            credit_score: Some(raw.to_string()),
        };
        assert_eq!(params("850").credit_score(), Some(850));
        assert_eq!(params(" 850.0 ").credit_score(), Some(850));
        assert_eq!(params("864.9").credit_score(), Some(864));
        assert_eq!(params("-1").credit_score(), None);
        assert_eq!(params("NaN").credit_score(), None);
        assert_eq!(params("abc").credit_score(), None);
        assert_eq!(LtvRateParams::default().credit_score(), None);
    }

    #[tokio::test]
    async fn test_fractional_credit_score_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        let app = create_router(state_in(dir.path()));

        let (status, body) = get_json(app, "/api/ltv-rate/quote?credit_score=850.0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credit_band"], "N790점 이상 (3-4구간)");
    }

    #[tokio::test]
    async fn test_missing_tables_return_503() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let (status, body) = get_json(create_router(state.clone()), "/api/ltv-rate/ltv").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");

        let (status, _) = get_json(create_router(state.clone()), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        write_tables(dir.path());
        let (status, body) = get_json(create_router(state), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_list_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_json(create_router(state_in(dir.path())), "/api/feeds").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kinds"].as_array().unwrap().len(), 8);
        assert_eq!(body["kinds"][0], "신용조회");
    }

    #[tokio::test]
    async fn test_render_feed() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(state_in(dir.path()));

        // 승인
        let (status, body) = post_json(
            app,
            "/api/feeds/%EC%8A%B9%EC%9D%B8",
            serde_json::json!({
                "borrower_name": "김철수",
                "loan_amount": 12000,
                "interest_rate": 4.5,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "승인");
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("김철수고객"));
        assert!(message.contains("12,000만 / 4.50%"));
        assert!(message.ends_with("래퍼명"));
    }

    #[tokio::test]
    async fn test_unknown_feed_kind_is_404() {
        let dir = tempfile::tempdir().unwrap();
        // 보류
        let (status, body) = post_json(
            create_router(state_in(dir.path())),
            "/api/feeds/%EB%B3%B4%EB%A5%98",
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("보류"));
    }

    #[tokio::test]
    async fn test_health_reports_table_state() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_json(create_router(state_in(dir.path())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["tables"], "pending");
        assert_eq!(body["checks"]["feed_templates"], 8);
    }

    #[tokio::test]
    async fn test_metrics_disabled_without_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_router(state_in(dir.path()))
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_variants() {
        let _ = build_cors_layer(&[], true);
        let _ = build_cors_layer(&[], false);
        let _ = build_cors_layer(&["https://desk.example.com".to_string()], true);
    }
}
