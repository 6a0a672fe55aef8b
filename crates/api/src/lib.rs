//! Backend liveness service for Tickets P2P.
//!
//! Serves the welcome message, a health report backed by a database probe,
//! API documentation and Prometheus metrics, with structured logging
//! (tracing) on every request.

pub mod config;
pub mod database;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use database::DatabaseProbe;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// Cross-origin requests are accepted from `cors_origin` only, with
/// credentials.
pub fn create_app<D: DatabaseProbe>(
    state: Arc<AppState<D>>,
    metrics_handle: PrometheusHandle,
    cors_origin: HeaderValue,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::scrape))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::root::index))
        .route("/health", get(routes::health::check::<D>))
        .route("/docs", get(routes::docs::index))
        .route(routes::docs::OPENAPI_PATH, get(routes::docs::openapi))
        .with_state(state)
        .merge(metrics_router)
        .fallback(error::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_credentials(true)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request()),
        )
        .layer(TraceLayer::new_for_http())
}
