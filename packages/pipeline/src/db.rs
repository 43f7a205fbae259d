//! Connection pool, embedded migrations and per-transaction timeouts.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use crate::config::{PipelineConfig, SyncConfig};
use crate::error::Result;

pub async fn create_pool(config: &PipelineConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Apply the sync timeouts to the current transaction.
///
/// Uses `SET LOCAL`, so the settings end with the transaction. Must be
/// called inside an open transaction.
pub async fn set_transaction_timeouts(conn: &mut PgConnection, config: &SyncConfig) -> Result<()> {
    let statement_ms = config.statement_timeout.as_millis();
    let lock_ms = config.lock_timeout.as_millis();

    sqlx::query(&format!("SET LOCAL statement_timeout = {statement_ms}"))
        .execute(&mut *conn)
        .await?;
    sqlx::query(&format!("SET LOCAL lock_timeout = {lock_ms}"))
        .execute(&mut *conn)
        .await?;

    tracing::trace!(statement_ms, lock_ms, "transaction timeouts set");
    Ok(())
}
