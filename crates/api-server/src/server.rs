//! API server: REST endpoints over the rewards engine plus the Prometheus
//! exporter.

use crate::rest::{self, AppState};
use crate::rewards_rest;
use axum::routing::{get, post};
use axum::Router;
use recycle_core::config::AppConfig;
use recycle_rewards::RewardsEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    engine: Arc<RewardsEngine>,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<RewardsEngine>) -> Self {
        Self { config, engine }
    }

    pub fn router(&self) -> Router {
        let state = AppState::new(self.engine.clone(), self.config.node_id.clone());

        Router::new()
            // Tier table
            .route(
                "/v1/tiers/:user_type/:level",
                get(rewards_rest::handle_tier_definition),
            )
            .route(
                "/v1/tiers/:user_type/:level/limit",
                get(rewards_rest::handle_monthly_limit),
            )
            // Coupon quota
            .route("/v1/coupons/eligibility", post(rewards_rest::handle_quota))
            .route(
                "/v1/coupons/eligibility/profile",
                post(rewards_rest::handle_profile_eligibility),
            )
            // Levels
            .route("/v1/levels/progress", post(rewards_rest::handle_progress))
            .route("/v1/levels/evaluate", post(rewards_rest::handle_evaluate_level))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.metrics.port);
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
