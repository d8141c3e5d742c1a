//! # Restaurant API Server
//!
//! REST backend for restaurant staff: users with token-based sessions,
//! orders and tables, stored in a document store (PostgreSQL JSONB or
//! in-memory).
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) DATABASE_URL=postgresql://localhost/restaurant \
//!     cargo run -p restaurant-api
//! ```

use anyhow::Context;
use restaurant_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use restaurant_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    store::{memory::MemoryDocumentStore, postgres::PgDocumentStore, DocumentStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restaurant_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Restaurant API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let store = open_store(&config).await?;
    tracing::info!(backend = store.backend(), "Document store ready");

    let state = AppState::from_config(store, config.clone())
        .context("Failed to initialize token service")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .context("DATABASE_URL is required for the postgres backend")?;

            let pool = create_pool(DatabaseConfig {
                url,
                max_connections: config.storage.max_connections,
                ..Default::default()
            })
            .await
            .context("Failed to connect to PostgreSQL")?;

            run_migrations(&pool).await.context("Failed to run migrations")?;

            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
