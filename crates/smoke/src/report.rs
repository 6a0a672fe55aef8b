//! Check outcomes and the suite report.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CheckError, FailureKind, Result};

/// Final status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    /// Passed after at least one failed attempt.
    Flaky,
    Failed,
}

/// Result of running one check, retries included.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub title: String,
    pub status: CheckStatus,
    pub attempts: u32,
    pub duration_ms: u64,
    /// Message of the last failed attempt, for failed checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

impl CheckOutcome {
    pub fn passed(title: &str, status: CheckStatus, attempts: u32, duration: Duration) -> Self {
        Self {
            title: title.to_string(),
            status,
            attempts,
            duration_ms: millis(duration),
            error: None,
            failure_kind: None,
        }
    }

    pub fn failed(title: &str, attempts: u32, duration: Duration, error: &CheckError) -> Self {
        Self {
            title: title.to_string(),
            status: CheckStatus::Failed,
            attempts,
            duration_ms: millis(duration),
            error: Some(error.to_string()),
            failure_kind: Some(error.kind()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ci: bool,
    pub workers: usize,
    pub retries: u32,
    pub outcomes: Vec<CheckOutcome>,
}

impl SuiteReport {
    pub fn new(
        started_at: DateTime<Utc>,
        ci: bool,
        workers: usize,
        retries: u32,
        outcomes: Vec<CheckOutcome>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            ci,
            workers,
            retries,
            outcomes,
        }
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Passed)
    }

    pub fn flaky(&self) -> usize {
        self.count(CheckStatus::Flaky)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Failed)
    }

    /// True when no check failed. Flaky checks count as success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// One line per check followed by a totals line.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let mark = match outcome.status {
                CheckStatus::Passed => "ok",
                CheckStatus::Flaky => "flaky",
                CheckStatus::Failed => "FAILED",
            };
            out.push_str(&format!(
                "{mark:>6}  {} ({} ms, {} attempt{})\n",
                outcome.title,
                outcome.duration_ms,
                outcome.attempts,
                if outcome.attempts == 1 { "" } else { "s" }
            ));
            if let Some(error) = &outcome.error {
                out.push_str(&format!("        {error}\n"));
            }
        }
        out.push_str(&format!(
            "\n{} passed, {} flaky, {} failed\n",
            self.passed(),
            self.flaky(),
            self.failed()
        ));
        out
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SuiteReport {
        SuiteReport::new(
            Utc::now(),
            true,
            1,
            2,
            vec![
                CheckOutcome::passed("a", CheckStatus::Passed, 1, Duration::from_millis(12)),
                CheckOutcome::passed("b", CheckStatus::Flaky, 2, Duration::from_millis(30)),
                CheckOutcome::failed(
                    "c",
                    3,
                    Duration::from_millis(90),
                    &CheckError::assertion("expected property \"database\" to be \"connected\", received \"disconnected\""),
                ),
            ],
        )
    }

    #[test]
    fn counts_by_status() {
        let report = sample();
        assert_eq!(report.passed(), 1);
        assert_eq!(report.flaky(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn flaky_counts_as_success() {
        let mut report = sample();
        report.outcomes.pop();
        assert!(report.is_success());
    }

    #[test]
    fn summary_lists_failures() {
        let summary = sample().render_summary();
        assert!(summary.contains("FAILED  c (90 ms, 3 attempts)"));
        assert!(summary.contains("received \"disconnected\""));
        assert!(summary.ends_with("1 passed, 1 flaky, 1 failed\n"));
    }

    #[test]
    fn json_omits_error_for_passing_checks() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "passed");
        assert!(json["outcomes"][0].get("error").is_none());
        assert_eq!(json["outcomes"][2]["failure_kind"], "assertion");
    }

    #[test]
    fn writes_json_file() {
        let path = std::env::temp_dir().join(format!("smoke-report-{}.json", Uuid::new_v4()));
        sample().write_json(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written["retries"], 2);
        assert_eq!(written["outcomes"].as_array().unwrap().len(), 3);
    }
}
