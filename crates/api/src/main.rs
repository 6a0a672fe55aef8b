//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::database::{DatabaseProbe, SqlDatabase};
use api::routes::AppState;
use common::shutdown_signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load .env and configuration
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 4. Open the database pool; an unreachable database is reported by /health
    let database = SqlDatabase::connect_lazy(&config.database_url, config.database_timeout)?;
    match database.ping().await {
        Ok(()) => tracing::info!("database connected"),
        Err(err) => tracing::warn!(error = %err, "database unavailable at startup"),
    }

    // 5. Build the application
    let state = Arc::new(AppState { database });
    let app = api::create_app(state, metrics_handle, config.cors_origin_header()?);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
