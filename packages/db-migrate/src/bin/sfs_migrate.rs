//! Applies pending migrations to the tracker database and exits.

use sfs_tracker_pipeline::{create_pool, run_migrations, PipelineConfig, Result};
use tracing_subscriber::EnvFilter;

async fn migrate() -> Result<()> {
    let config = PipelineConfig::from_env()?.with_max_connections(2);
    let pool = create_pool(&config).await?;

    tracing::info!("running migrations...");
    run_migrations(&pool).await?;
    pool.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = migrate().await {
        tracing::error!(error = %e, "migration failed");
        std::process::exit(1);
    }

    tracing::info!("migrations completed successfully");
}
