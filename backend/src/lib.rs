//! Pyro Predictor backend
//!
//! Serves a 7-day matrix of environmental predictors (vegetation indices,
//! elevation, weather) for any coordinate, and keeps a per-district cache of
//! the same matrix fresh with a round-robin refresh job.

use axum::{routing::get, Router};
use reqwest::Client;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use config::{HttpConfig, StoreBackend};
use external::{EarthEngineClient, LocationApiClient, OpenMeteoClient};
use services::{DistrictCatalog, DistrictRefreshJob, LocationDataAssembler, LocationDataProvider};
use store::{DistrictCache, DocumentStore, MemoryDocumentStore, PgDocumentStore};

/// Liveness text served at `/`
pub const LIVENESS_MESSAGE: &str = "App is running..";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: DistrictCache,
    pub assembler: Arc<LocationDataAssembler>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .merge(routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    LIVENESS_MESSAGE
}

/// Install the global tracing subscriber
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Shared outbound HTTP client
pub fn http_client(config: &HttpConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
}

/// Open the configured document store, running migrations for postgres
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            let store = PgDocumentStore::new(pool);
            tracing::info!("Running database migrations...");
            store.migrate().await?;
            tracing::info!("Migrations completed");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; cached districts are lost on exit");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

/// Build the location assembler from configuration. Missing Earth Engine
/// credentials leave the vegetation fields null.
pub fn build_assembler(client: Client, config: &Config) -> anyhow::Result<LocationDataAssembler> {
    let earth_engine = EarthEngineClient::from_config(client.clone(), &config.earth_engine)?;
    if earth_engine.is_none() {
        tracing::warn!("Earth Engine credentials not configured; vegetation indices will be null");
    }
    let open_meteo = OpenMeteoClient::new(client, &config.open_meteo);

    Ok(LocationDataAssembler::new(
        earth_engine.map(Arc::new),
        open_meteo,
    ))
}

/// Build the refresh job. It calls a remote `/getLocationData` when
/// `refresh.location_api_url` is set, otherwise the in-process assembler.
pub fn build_refresh_job(
    cache: DistrictCache,
    client: Client,
    assembler: Arc<LocationDataAssembler>,
    config: &Config,
) -> anyhow::Result<DistrictRefreshJob> {
    let catalog = DistrictCatalog::load(&config.refresh.districts_path, &config.refresh.name_property)?;

    let provider: Arc<dyn LocationDataProvider> = match &config.refresh.location_api_url {
        Some(url) if !url.is_empty() => {
            tracing::info!("District refresh will fetch from {}", url);
            Arc::new(LocationApiClient::new(client, url.clone()))
        }
        _ => assembler,
    };

    Ok(DistrictRefreshJob::new(
        cache,
        Arc::new(catalog),
        provider,
        &config.refresh,
    ))
}
