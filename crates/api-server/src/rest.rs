//! Shared handler state, error mapping and operational endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use recycle_core::error::RewardsError;
use recycle_rewards::RewardsEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RewardsEngine>,
    pub node_id: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<RewardsEngine>, node_id: impl Into<String>) -> Self {
        Self {
            engine,
            node_id: node_id.into(),
            start_time: Instant::now(),
        }
    }
}

/// Rewards failure surfaced to the dashboard. The message stays neutral;
/// the UI decides what to show instead of a fabricated limit.
pub struct ApiError(pub RewardsError);

impl From<RewardsError> for ApiError {
    fn from(err: RewardsError) -> Self {
        ApiError(err)
    }
}

/// Unreadable or mistyped request bodies get the same error envelope as
/// any other invalid argument.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(RewardsError::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            RewardsError::TierNotFound { .. } => (StatusCode::NOT_FOUND, "tier_not_found"),
            RewardsError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            error!(error = %self.0, "Rewards request failed");
            metrics::counter!("rewards.api.errors").increment(1);
        } else {
            warn!(error = %self.0, "Rewards request rejected");
            metrics::counter!("rewards.api.validation_errors").increment(1);
        }

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message: "Unable to determine your limit".to_string(),
                detail: (!status.is_server_error()).then(|| self.0.to_string()),
            }),
        )
            .into_response()
    }
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        tiers: state.engine.table().len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /live: Liveness check for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub tiers: usize,
    pub uptime_secs: u64,
}
