//! Storefront API - store API service for sales channels
//!
//! Serves the shipping methods of a sales channel, optionally narrowed to
//! the methods whose availability rule holds for the caller's context.

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use tokio::net::TcpListener;

mod api;
mod config;
mod domain;
mod engine;
mod error;
mod logging;
mod shipping;
mod storage;

use crate::api::{build_router, ContextResolver};
use crate::config::{Config, StoreApiConfig};
use crate::engine::ConditionRuleMatcher;
use crate::shipping::{BaseShippingMethodRoute, ShippingMethodRoute};
use crate::storage::{seed_demo_data, StoreRepository};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Route serving the shipping method list.
    pub shipping_method_route: Arc<dyn ShippingMethodRoute>,
    /// Database repository.
    pub repository: StoreRepository,
    /// Store API behaviour (versions, limits).
    pub store_api: StoreApiConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is expected in production
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Storefront API v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.url,
        supported_versions = ?config.store_api.supported_versions,
        max_limit = config.store_api.max_limit,
        context_token_ttl_days = config.store_api.context_token_ttl_days,
        "Configuration loaded"
    );

    let pool = SqlitePool::connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    let repository = StoreRepository::new(pool);
    repository.init_schema().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize database schema");
        anyhow::anyhow!("Schema initialization error: {}", e)
    })?;

    tracing::info!("Database connected and schema initialized");

    let purged = repository
        .purge_context_tokens(
            chrono::Utc::now() - chrono::Duration::days(config.store_api.context_token_ttl_days),
        )
        .await?;
    tracing::info!(purged, "Expired context tokens removed");

    if let Some(access_key) = &config.database.demo_access_key {
        let channel = seed_demo_data(&repository, access_key).await?;
        tracing::info!(sales_channel_id = %channel.id, "Demo sales channel available");
    }

    let shipping_method_route: Arc<dyn ShippingMethodRoute> = Arc::new(
        BaseShippingMethodRoute::new(Arc::new(repository.clone())),
    );
    let resolver = ContextResolver::new(repository.clone(), Arc::new(ConditionRuleMatcher::new()));

    let state = AppState {
        shipping_method_route,
        repository,
        store_api: config.store_api.clone(),
    };

    let app = build_router(state, resolver);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
