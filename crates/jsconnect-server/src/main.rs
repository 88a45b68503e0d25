//! jsConnect Server - Main Entry Point

use jsconnect_server::{build_router, config::ServerConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("jsConnect server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Invalid configuration, using defaults");
        ServerConfig::default()
    });

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!("Listening on {}", config.server.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
