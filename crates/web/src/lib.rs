//! Frontend for Tickets P2P: renders the static landing page and serves it
//! over HTTP.

pub mod config;
pub mod page;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// GET / renders the landing page.
async fn index() -> Html<String> {
    Html(page::render())
}

/// Creates the frontend router.
pub fn create_app() -> Router {
    Router::new()
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
}
