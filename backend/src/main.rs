//! Pyro Predictor - Backend Server
//!
//! Environmental predictor API for forest-fire risk modelling.

use pyro_predictor::{
    build_assembler, build_refresh_job, config::Config, connect_store, create_app, http_client,
    init_tracing, store::DistrictCache, AppState,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing("pyro_predictor=debug,pyro_server=debug,tower_http=debug,sqlx=warn");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Pyro Predictor Server");
    tracing::info!("Environment: {}", config.environment);

    let store = connect_store(&config).await?;
    let cache = DistrictCache::new(store);
    let client = http_client(&config.http)?;
    let assembler = Arc::new(build_assembler(client.clone(), &config)?);

    if let Some(interval_secs) = config.refresh.interval_secs.filter(|secs| *secs > 0) {
        let job = build_refresh_job(cache.clone(), client, assembler.clone(), &config)?;
        tracing::info!("District refresh scheduled every {}s", interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                if let Err(e) = job.run_once().await {
                    tracing::error!("District refresh run failed: {}", e);
                }
            }
        });
    }

    // Create application state
    let state = AppState { cache, assembler };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
