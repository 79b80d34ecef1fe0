//! tunehost server binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tunehost::server::{ServerConfig, router};
use tunehost::{AppConfig, SessionCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Without credentials there is nothing useful to serve.
    let app_config = AppConfig::from_env().context("failed to load configuration")?;
    let server_config =
        ServerConfig::from_env(&app_config).context("failed to load server configuration")?;

    let sessions = Arc::new(SessionCoordinator::default());
    let app = router(server_config, sessions);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", app_config.port))
        .await
        .with_context(|| format!("failed to bind port {}", app_config.port))?;

    tracing::info!(
        port = app_config.port,
        redirect_uri = %app_config.redirect_uri,
        "listening on http://localhost:{}/",
        app_config.port
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
