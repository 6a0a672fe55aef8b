//! Root endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET / returns the API welcome message.
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to Tickets P2P API",
    })
}
