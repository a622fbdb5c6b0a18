//! Prometheus metrics

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder.
///
/// Returns `None` if a recorder is already installed; counters then go to
/// that recorder and `/metrics` reports 404.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe_counter!(
                "ltv_rate_requests_total",
                "LTV/rate lookups served, by kind"
            );
            metrics::describe_counter!("feed_messages_total", "Feed messages rendered, by kind");
            metrics::describe_counter!(
                "table_load_failures_total",
                "Failed attempts to load the reference tables"
            );
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
