use anyhow::{anyhow, Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Opens the connection pool and probes it once.
///
/// Both steps are bounded by `db_connect_timeout` so that an unreachable
/// database stops startup instead of hanging it.
pub async fn connect(config: &Config) -> Result<PgPool> {
    let timeout = config.db_connect_timeout;
    tracing::info!(dsn = %config.redacted_dsn(), "connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(timeout)
        .connect_with(config.connect_options())
        .await
        .with_context(|| {
            format!(
                "failed to connect to database {} at {}:{}",
                config.db_name, config.db_host, config.db_port
            )
        })?;

    tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&pool))
        .await
        .map_err(|_| anyhow!("database ping timed out after {timeout:?}"))?
        .context("failed to ping database")?;

    tracing::info!(host = %config.db_host, database = %config.db_name, "database reachable");
    Ok(pool)
}
