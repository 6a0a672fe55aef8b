//! End-to-end smoke harness for Tickets P2P.
//!
//! Launches (or reuses) the backend and frontend servers, then checks that
//! they are reachable and report themselves healthy:
//! - [`checks`]: the four infrastructure checks behind the [`SmokeCheck`] trait
//! - [`runner`]: bounded-concurrency execution with timeouts and retries
//! - [`server`]: process launch, port polling and server reuse
//! - [`report`]: per-check outcomes and the JSON suite report

pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod html;
pub mod report;
pub mod runner;
pub mod server;

use std::sync::Arc;

pub use checks::{CheckContext, SmokeCheck, default_suite};
pub use config::{HarnessConfig, WebServerConfig};
pub use error::{CheckError, FailureKind, HarnessError, Result};
pub use report::{CheckOutcome, CheckStatus, SuiteReport};
pub use runner::Runner;

/// Runs `checks` against the configured services.
///
/// When `manage_servers` is set, every configured web server is launched or
/// reused first and the launched ones are stopped afterwards.
pub async fn run_suite(
    config: &HarnessConfig,
    checks: Vec<Arc<dyn SmokeCheck>>,
    manage_servers: bool,
) -> Result<SuiteReport> {
    let ctx = Arc::new(CheckContext::from_config(config)?);
    let runner = Runner::from_config(config);

    let servers = if manage_servers {
        let servers = server::start_all(&config.web_servers).await?;
        for handle in servers.handles() {
            tracing::info!(
                server = handle.name(),
                port = handle.port(),
                reused = handle.is_reused(),
                "server ready"
            );
        }
        Some(servers)
    } else {
        None
    };

    let started_at = chrono::Utc::now();
    let outcomes = runner.run(checks, ctx).await;

    if let Some(servers) = servers {
        servers.shutdown().await;
    }

    Ok(SuiteReport::new(
        started_at,
        config.ci,
        runner.workers(),
        runner.retries(),
        outcomes,
    ))
}
