//! Runs checks concurrently with bounded workers, per-attempt timeouts and
//! retries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::checks::{CheckContext, SmokeCheck};
use crate::config::HarnessConfig;
use crate::error::CheckError;
use crate::report::{CheckOutcome, CheckStatus};

/// Executes a suite of checks.
#[derive(Debug, Clone)]
pub struct Runner {
    workers: usize,
    retries: u32,
    timeout: Duration,
}

impl Runner {
    pub fn new(workers: usize, retries: u32, timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            retries,
            timeout,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.workers, config.retries, config.timeout)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Runs every check and returns their outcomes in input order.
    ///
    /// At most `workers` checks run at once. Each check is attempted up to
    /// `retries + 1` times; every attempt is cut off after `timeout`.
    #[tracing::instrument(skip_all, fields(checks = checks.len(), workers = self.workers, retries = self.retries))]
    pub async fn run(
        &self,
        checks: Vec<Arc<dyn SmokeCheck>>,
        ctx: Arc<CheckContext>,
    ) -> Vec<CheckOutcome> {
        let permits = Arc::new(Semaphore::new(self.workers));

        let handles: Vec<_> = checks
            .iter()
            .map(|check| {
                let check = Arc::clone(check);
                let ctx = Arc::clone(&ctx);
                let permits = Arc::clone(&permits);
                let runner = self.clone();
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    runner.run_one(check.as_ref(), &ctx).await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (check, handle) in checks.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    let error = CheckError::Infrastructure(format!("check task failed: {err}"));
                    tracing::error!(check = check.title(), error = %error, "check aborted");
                    CheckOutcome::failed(check.title(), 1, Duration::ZERO, &error)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn run_one(&self, check: &dyn SmokeCheck, ctx: &CheckContext) -> CheckOutcome {
        let title = check.title();
        let started = Instant::now();
        let max_attempts = self.retries + 1;
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(self.timeout, check.run(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(CheckError::Timeout(self.timeout)),
            };

            match result {
                Ok(()) => {
                    let status = if attempt == 1 {
                        CheckStatus::Passed
                    } else {
                        CheckStatus::Flaky
                    };
                    tracing::info!(check = title, attempts = attempt, ?status, "check passed");
                    return CheckOutcome::passed(title, status, attempt, started.elapsed());
                }
                Err(error) if attempt < max_attempts => {
                    tracing::warn!(check = title, attempt, error = %error, "check failed, retrying");
                    attempt += 1;
                }
                Err(error) => {
                    tracing::error!(check = title, attempts = attempt, kind = ?error.kind(), error = %error, "check failed");
                    return CheckOutcome::failed(title, attempt, started.elapsed(), &error);
                }
            }
        }
    }
}
