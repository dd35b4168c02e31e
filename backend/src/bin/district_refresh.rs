//! One district refresh run, for use from a scheduler (cron, systemd timer)

use pyro_predictor::{
    build_assembler, build_refresh_job, config::Config, connect_store, http_client, init_tracing,
    store::DistrictCache,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("pyro_predictor=info,district_refresh=info,sqlx=warn");

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let cache = DistrictCache::new(connect_store(&config).await?);
    let client = http_client(&config.http)?;
    let assembler = Arc::new(build_assembler(client.clone(), &config)?);
    let job = build_refresh_job(cache, client, assembler, &config)?;

    let summary = job.run_once().await?;
    tracing::info!(
        "District {} ({}) -> {:?}; cursor {} -> {}",
        summary.cursor,
        summary.district_id.as_deref().unwrap_or("unknown"),
        summary.outcome,
        summary.cursor,
        summary.next_cursor
    );

    Ok(())
}
