//! Recycle Rewards: tier, coupon quota and level progress service for the
//! recycling marketplace dashboards.

use clap::Parser;
use recycle_api::ApiServer;
use recycle_core::config::AppConfig;
use recycle_rewards::RewardsEngine;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "recycle-rewards")]
#[command(about = "Tier, coupon quota and level progress service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "RECYCLE_REWARDS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "RECYCLE_REWARDS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// JSON tier table replacing the built-in program
    #[arg(long, env = "RECYCLE_REWARDS__REWARDS__TIER_TABLE_PATH")]
    tier_table: Option<String>,

    /// Offset from UTC, in minutes, where calendar months start
    #[arg(long, allow_hyphen_values = true)]
    month_offset_minutes: Option<i32>,

    /// Skip the Prometheus exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recycle_rewards=info,recycle_api=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Recycle Rewards starting up");

    let mut config = AppConfig::load().map_err(|e| {
        error!(error = %e, "Failed to load config");
        e
    })?;

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(path) = cli.tier_table {
        config.rewards.tier_table_path = Some(path);
    }
    if let Some(minutes) = cli.month_offset_minutes {
        config.rewards.month_boundary_offset_minutes = minutes;
    }
    if cli.no_metrics {
        config.metrics.enabled = false;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics = config.metrics.enabled,
        "Configuration loaded"
    );

    // Tier table errors are fatal; there is no fallback table.
    let engine = Arc::new(RewardsEngine::new(&config.rewards)?);

    let api_server = ApiServer::new(config.clone(), engine);

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics() {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Recycle Rewards is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
