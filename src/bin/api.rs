//! Singularity API Server
//!
//! Run with: cargo run --bin singularity-api
//!
//! # Configuration
//!
//! Reads `config.toml` from the standard locations (or the path in
//! `SINGULARITY_CONFIG`), then applies environment overrides:
//! - `SINGULARITY_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `SINGULARITY_API_PORT`: Port to listen on (default: 8090)
//! - `SINGULARITY_DATA_DIR`: Directory holding the lists
//! - `SINGULARITY_MARKET_PROVIDER`: `coingecko` or `demo`
//! - `SINGULARITY_ETHERSCAN_API_KEY`: Etherscan API key for wallet balances
//! - `RUST_LOG`: Log filter (overrides `[logging] level`)

use anyhow::Context;
use singularity::api::{serve, ApiConfig, AppState};
use singularity::config::Config;
use singularity::services::Services;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("SINGULARITY_CONFIG") {
        Ok(path) => Config::load_with_env(&PathBuf::from(path))?,
        Err(_) => Config::load_default(),
    };

    singularity::logging::init(&config.logging);
    tracing::info!("Starting Singularity API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.storage.data_dir);
    tracing::info!("Market provider: {:?}", config.market.provider);

    let services = Services::from_config(&config).context("failed to start services")?;
    for namespace in services.sync.namespaces() {
        let count = services.sync.list(&namespace.key).await?.len();
        tracing::info!(namespace = %namespace.key, count, "List ready");
    }

    let api_config = ApiConfig::from(config.api.clone());
    let state = AppState::new(services, api_config.clone());

    tracing::info!("Starting server on {}", api_config.addr());
    serve(state, &api_config).await?;

    tracing::info!("Singularity API server stopped");
    Ok(())
}
