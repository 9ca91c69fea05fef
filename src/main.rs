mod bria;
mod config;
mod error;
mod form;
mod models;
mod normalize;
mod page;
mod routes;
mod session;
mod state;
mod storage;

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::Config, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    match &config.default_api_key {
        Some(key) => {
            let prefix: String = key.chars().take(4).collect();
            tracing::info!("Default API key from env: {}...", prefix);
        }
        None => tracing::info!("No BRIA_API_KEY set; users must provide a key"),
    }
    tracing::info!(static_dir = %config.static_dir.display(), api = %config.api_base, "Configuration loaded");

    let state = AppState::from_config(&config)?;
    state.artifacts.ensure_folders().await?;

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
