//! # OrgHub API Server
//!
//! Serves the OrgHub JSON API: health and echo, registration and login, and
//! organization membership management.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Connect to PostgreSQL, retrying with exponential backoff
//! 3. Apply migrations and membership constraints
//! 4. Serve until Ctrl+C, then close the pool
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p orghub-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use orghub_api::{
    app::{build_router, AppState},
    config::Config,
};
use orghub_shared::{db::Database, store::PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is loaded before the subscriber so RUST_LOG can live there too
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "orghub_api=debug,orghub_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("OrgHub API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("failed to load configuration")?;

    let mut database = Database::new(config.database.clone());
    database.initialize().await?;
    database.migrate().await?;

    let store = PgStore::new(database.pool()?.clone());
    let bind_address = config.bind_address();
    let app = build_router(AppState::new(Arc::new(store), config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    database.close().await;
    served?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
