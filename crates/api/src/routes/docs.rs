//! API documentation: an HTML reference page and the OpenAPI document it
//! is generated from.

use axum::Json;
use axum::response::Html;
use common::{API_DESCRIPTION, API_TITLE, API_VERSION};
use serde_json::{Value, json};

/// Path the OpenAPI document is served from.
pub const OPENAPI_PATH: &str = "/openapi.json";

/// A documented endpoint.
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub summary: &'static str,
    pub content_type: &'static str,
}

/// Every public endpoint, in display order.
pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/",
        summary: "Root endpoint",
        content_type: "application/json",
    },
    Endpoint {
        method: "GET",
        path: "/health",
        summary: "Health check endpoint",
        content_type: "application/json",
    },
    Endpoint {
        method: "GET",
        path: "/docs",
        summary: "API documentation",
        content_type: "text/html",
    },
    Endpoint {
        method: "GET",
        path: OPENAPI_PATH,
        summary: "OpenAPI document",
        content_type: "application/json",
    },
    Endpoint {
        method: "GET",
        path: "/metrics",
        summary: "Prometheus metrics",
        content_type: "text/plain",
    },
];

/// Builds the OpenAPI 3.1 document for [`ENDPOINTS`].
pub fn openapi_document() -> Value {
    let mut paths = serde_json::Map::new();
    for endpoint in ENDPOINTS {
        let operation = json!({
            "summary": endpoint.summary,
            "responses": {
                "200": {
                    "description": "Successful Response",
                    "content": { endpoint.content_type: {} }
                }
            }
        });
        paths.insert(
            endpoint.path.to_string(),
            json!({ endpoint.method.to_lowercase(): operation }),
        );
    }

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": API_TITLE,
            "description": API_DESCRIPTION,
            "version": API_VERSION,
        },
        "paths": paths,
    })
}

/// GET /openapi.json
pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

/// GET /docs renders the endpoint reference.
pub async fn index() -> Html<String> {
    let rows: String = ENDPOINTS
        .iter()
        .map(|e| {
            format!(
                "        <tr><td><code>{}</code></td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
                e.method, e.path, e.summary, e.content_type
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{API_TITLE} - Docs</title>
  </head>
  <body>
    <h1>{API_TITLE} <small>{API_VERSION}</small></h1>
    <p>{API_DESCRIPTION}</p>
    <table>
      <thead>
        <tr><th>Method</th><th>Path</th><th>Summary</th><th>Content type</th></tr>
      </thead>
      <tbody>
{rows}      </tbody>
    </table>
    <p>Machine-readable schema: <a href="{OPENAPI_PATH}">{OPENAPI_PATH}</a></p>
  </body>
</html>
"#
    ))
}
