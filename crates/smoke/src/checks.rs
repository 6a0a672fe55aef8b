//! The smoke checks and the context they run in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{DATABASE_CONNECTED, PRODUCT_NAME, STATUS_HEALTHY};
use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};

use crate::config::{HarnessConfig, parse_url};
use crate::error::{CheckError, HarnessError};
use crate::html::{self, BodyVisibility};

/// A single reachability check.
#[async_trait]
pub trait SmokeCheck: Send + Sync {
    /// Human-readable title, also used for `--grep` selection.
    fn title(&self) -> &'static str;

    /// Runs one attempt of the check.
    async fn run(&self, ctx: &CheckContext) -> Result<(), CheckError>;
}

/// Where the services live and how requests are made.
#[derive(Debug, Clone)]
pub struct CheckContext {
    base_url: Url,
    backend_url: Url,
    request_timeout: Duration,
}

impl CheckContext {
    pub fn new(base_url: Url, backend_url: Url, request_timeout: Duration) -> Self {
        Self {
            base_url,
            backend_url,
            request_timeout,
        }
    }

    /// Builds a context from harness configuration.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        Ok(Self::new(
            parse_url("base", &config.base_url)?,
            parse_url("backend", &config.backend_url)?,
            config.timeout,
        ))
    }

    /// A fresh client, so no connection state is shared between checks.
    pub fn client(&self) -> Result<Client, CheckError> {
        Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|err| CheckError::Infrastructure(format!("failed to build HTTP client: {err}")))
    }

    pub fn backend(&self, path: &str) -> Result<Url, CheckError> {
        join(&self.backend_url, path)
    }

    pub fn frontend(&self, path: &str) -> Result<Url, CheckError> {
        join(&self.base_url, path)
    }
}

fn join(base: &Url, path: &str) -> Result<Url, CheckError> {
    base.join(path)
        .map_err(|err| CheckError::Infrastructure(format!("cannot resolve {path} against {base}: {err}")))
}

fn expect_status(url: &Url, expected: StatusCode, actual: StatusCode) -> Result<(), CheckError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CheckError::assertion(format!(
            "GET {url}: expected status {expected}, received {actual}"
        )))
    }
}

fn expect_property(body: &Map<String, Value>, key: &str, expected: &str) -> Result<(), CheckError> {
    match body.get(key) {
        None => Err(CheckError::assertion(format!(
            "expected health report to have property \"{key}\""
        ))),
        Some(Value::String(actual)) if actual == expected => Ok(()),
        Some(actual) => Err(CheckError::assertion(format!(
            "expected property \"{key}\" to be \"{expected}\", received {actual}"
        ))),
    }
}

/// GETs `/health`, requires 200, and returns the body as a JSON object.
async fn fetch_health(ctx: &CheckContext) -> Result<Map<String, Value>, CheckError> {
    let url = ctx.backend("/health")?;
    let response = ctx.client()?.get(url.clone()).send().await?;
    expect_status(&url, StatusCode::OK, response.status())?;

    match response.json::<Value>().await? {
        Value::Object(body) => Ok(body),
        other => Err(CheckError::assertion(format!(
            "expected a JSON object from {url}, received {other}"
        ))),
    }
}

/// The backend reports itself healthy with its database connected.
pub struct BackendHealth;

#[async_trait]
impl SmokeCheck for BackendHealth {
    fn title(&self) -> &'static str {
        "backend health check endpoint should be accessible"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        let body = fetch_health(ctx).await?;
        expect_property(&body, "status", STATUS_HEALTHY)?;
        expect_property(&body, "database", DATABASE_CONNECTED)
    }
}

/// The frontend serves a titled page with a visible body.
pub struct FrontendLoads {
    /// Substring the document title must contain.
    pub title_pattern: String,
}

impl Default for FrontendLoads {
    fn default() -> Self {
        Self {
            title_pattern: PRODUCT_NAME.to_string(),
        }
    }
}

#[async_trait]
impl SmokeCheck for FrontendLoads {
    fn title(&self) -> &'static str {
        "frontend should load successfully"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        let url = ctx.frontend("/")?;
        let response = ctx.client()?.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::assertion(format!(
                "GET {url}: expected a successful status, received {status}"
            )));
        }

        let document = response.text().await?;
        match html::document_title(&document) {
            Some(title) if title.contains(&self.title_pattern) => {}
            Some(title) => {
                return Err(CheckError::assertion(format!(
                    "expected page title to match /{}/, received \"{title}\"",
                    self.title_pattern
                )));
            }
            None => {
                return Err(CheckError::assertion(format!(
                    "expected page title to match /{}/, but the page has no <title>",
                    self.title_pattern
                )));
            }
        }

        match html::body_visibility(&document) {
            BodyVisibility::Visible => Ok(()),
            BodyVisibility::Missing => Err(CheckError::assertion("expected <body> to exist")),
            BodyVisibility::Hidden(reason) => Err(CheckError::assertion(format!(
                "expected <body> to be visible, but it is hidden by {reason}"
            ))),
            BodyVisibility::Empty => Err(CheckError::assertion(
                "expected <body> to be visible, but it has no content",
            )),
        }
    }
}

/// The backend serves its API documentation.
pub struct ApiDocs;

#[async_trait]
impl SmokeCheck for ApiDocs {
    fn title(&self) -> &'static str {
        "backend API documentation should be accessible"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        let url = ctx.backend("/docs")?;
        let response = ctx.client()?.get(url.clone()).send().await?;
        expect_status(&url, StatusCode::OK, response.status())
    }
}

/// The backend's database probe succeeds.
pub struct DatabaseConnection;

#[async_trait]
impl SmokeCheck for DatabaseConnection {
    fn title(&self) -> &'static str {
        "database connection should be working"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        let body = fetch_health(ctx).await?;
        expect_property(&body, "database", DATABASE_CONNECTED)
    }
}

/// The infrastructure suite, in declaration order.
pub fn default_suite() -> Vec<Arc<dyn SmokeCheck>> {
    vec![
        Arc::new(BackendHealth),
        Arc::new(FrontendLoads::default()),
        Arc::new(ApiDocs),
        Arc::new(DatabaseConnection),
    ]
}

/// Keeps the checks whose title contains `pattern`.
pub fn select(checks: Vec<Arc<dyn SmokeCheck>>, pattern: Option<&str>) -> Vec<Arc<dyn SmokeCheck>> {
    match pattern {
        Some(pattern) => checks
            .into_iter()
            .filter(|check| check.title().contains(pattern))
            .collect(),
        None => checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_has_four_checks_in_order() {
        let titles: Vec<_> = default_suite().iter().map(|c| c.title()).collect();
        assert_eq!(
            titles,
            vec![
                "backend health check endpoint should be accessible",
                "frontend should load successfully",
                "backend API documentation should be accessible",
                "database connection should be working",
            ]
        );
    }

    #[test]
    fn select_filters_by_title() {
        let selected = select(default_suite(), Some("backend"));
        assert_eq!(selected.len(), 2);
        assert_eq!(select(default_suite(), Some("nothing")).len(), 0);
        assert_eq!(select(default_suite(), None).len(), 4);
    }

    #[test]
    fn missing_property_is_an_assertion() {
        let body = Map::new();
        let err = expect_property(&body, "database", "connected").unwrap_err();
        assert!(err.is_assertion());
        assert_eq!(
            err.to_string(),
            "expected health report to have property \"database\""
        );
    }

    #[test]
    fn mismatched_property_reports_received_value() {
        let mut body = Map::new();
        body.insert("status".into(), Value::String("degraded".into()));
        let err = expect_property(&body, "status", "healthy").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected property \"status\" to be \"healthy\", received \"degraded\""
        );
    }

    #[test]
    fn paths_resolve_against_base() {
        let ctx = CheckContext::new(
            Url::parse("http://localhost:3000").unwrap(),
            Url::parse("http://localhost:8000/").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(ctx.backend("/health").unwrap().as_str(), "http://localhost:8000/health");
        assert_eq!(ctx.frontend("/").unwrap().as_str(), "http://localhost:3000/");
    }
}
