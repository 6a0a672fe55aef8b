//! API error types with HTTP response mapping.

use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No route matches the request.
    NotFound { method: Method, uri: Uri },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound { method, uri } => {
                tracing::debug!(%method, %uri, "no route matched");
                (StatusCode::NOT_FOUND, "Not Found".to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Fallback handler for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound { method, uri }
}
