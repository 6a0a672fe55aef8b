//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{DatabaseStatus, HealthReport};

use crate::database::DatabaseProbe;
use crate::routes::AppState;

/// GET /health returns service status and database connectivity.
///
/// Always answers 200; a failed probe is reported in the `database` field.
#[tracing::instrument(skip_all)]
pub async fn check<D: DatabaseProbe>(State(state): State<Arc<AppState<D>>>) -> Json<HealthReport> {
    metrics::counter!("http_health_checks_total").increment(1);

    let database = match state.database.ping().await {
        Ok(()) => DatabaseStatus::Connected,
        Err(err) => {
            metrics::counter!("database_probe_failures_total").increment(1);
            tracing::warn!(error = %err, "database probe failed");
            DatabaseStatus::Error(err.to_string())
        }
    };

    Json(HealthReport::healthy(database))
}
