//! Loan Desk Server
//!
//! Provides the HTTP endpoints behind the LTV/rate helper and the feed wizard.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use loan_desk_tools::{FeedError, ToolError};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Reference data is not loaded yet; the next request retries
    #[error("Service unavailable: {0}")]
    NotReady(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ToolError> for ServerError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotReady(msg) => ServerError::NotReady(msg),
            ToolError::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            ToolError::Feed(FeedError::UnknownKind(kind)) => {
                ServerError::NotFound(format!("feed kind '{}'", kind))
            }
            ToolError::Feed(e @ FeedError::MissingTemplate(_)) => {
                ServerError::NotFound(e.to_string())
            }
            ToolError::Feed(e @ FeedError::Templates(_)) => ServerError::Internal(e.to_string()),
        }
    }
}

impl From<FeedError> for ServerError {
    fn from(err: FeedError) -> Self {
        ToolError::from(err).into()
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (
            status,
            Json(serde_json::json!({
                "status": "error",
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
