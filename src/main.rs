use std::path::PathBuf;

use anyhow::{Context, Result};
use hikeplanner::{PlannerConfig, api::AppState, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("HIKEPLANNER_CONFIG").map(PathBuf::from);
    let config = PlannerConfig::load_from_path(config_path)?;
    let _telemetry = telemetry::init(&config.logging)?;

    tracing::info!("Starting HikePlanner {}", hikeplanner::VERSION);
    let state = AppState::from_config(&config).context("Failed to build planner")?;

    web::run(config.server.port, state).await
}
