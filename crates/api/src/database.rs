//! Database connectivity probe backing the health endpoint.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use thiserror::Error;

/// Errors reported by a database probe.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The connection URL could not be turned into a pool.
    #[error("invalid database configuration: {0}")]
    Configuration(sqlx::Error),

    /// The probe query failed.
    #[error("{0}")]
    Query(#[from] sqlx::Error),

    /// The probe did not finish in time.
    #[error("database probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Something that can confirm the database is reachable.
#[async_trait]
pub trait DatabaseProbe: Send + Sync + 'static {
    /// Round-trips a trivial query to the database.
    async fn ping(&self) -> Result<()>;
}

/// SQL database reached through sqlx's `Any` driver (SQLite or PostgreSQL).
///
/// The pool connects lazily, so the service starts even while the database
/// is down and reports the failure through `/health` instead.
#[derive(Debug, Clone)]
pub struct SqlDatabase {
    pool: AnyPool,
    timeout: Duration,
}

impl SqlDatabase {
    /// Builds a lazily connecting pool for `url`. Every probe is bounded by `timeout`.
    pub fn connect_lazy(url: &str, timeout: Duration) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(timeout)
            .connect_lazy(url)
            .map_err(DatabaseError::Configuration)?;
        Ok(Self { pool, timeout })
    }
}

#[async_trait]
impl DatabaseProbe for SqlDatabase {
    #[tracing::instrument(skip(self))]
    async fn ping(&self) -> Result<()> {
        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await;
        metrics::histogram!("database_probe_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        outcome.map_err(|_| DatabaseError::Timeout(self.timeout))??;
        Ok(())
    }
}
