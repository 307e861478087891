//! Stable welfare HTTP server binary.
//!
//! Loads configuration, creates the repository, and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! # Run with the in-memory repository and defaults
//! cargo run --bin stable-server
//!
//! # Use an explicit config file and permissive advisory checks
//! STABLE_CONFIG=./stable.toml WELFARE_ON_INFRA_ERROR=allow cargo run --bin stable-server
//! ```
//!
//! # Environment Variables
//!
//! - `STABLE_CONFIG`: Path to the TOML config (default: search for `stable.toml`)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `REPOSITORY_TYPE`: Storage backend (default: local)
//! - `WELFARE_ON_INFRA_ERROR`: `block` or `allow` (default: block)
//! - `RUST_LOG`: Log filter, e.g. `info` or `stable_welfare=debug` (default: info)

use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stable_welfare::config::AppConfig;
use stable_welfare::db::RepositoryFactory;
use stable_welfare::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; `log` records from the library are forwarded too.
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting stable welfare server");

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        "Welfare policy on store failure: {}",
        config.welfare.on_infra_error
    );

    let repository = RepositoryFactory::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create repository: {}", e))?;
    info!("Repository initialized ({})", config.repository.repo_type);

    let state = AppState::with_welfare(repository, config.welfare.clone());
    let app = create_router(state);

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address()))?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
