//! Command-line interface of the `smoke` binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::checks::{self, SmokeCheck};
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::report::SuiteReport;

/// Every check passed, possibly after retries.
pub const EXIT_SUCCESS: u8 = 0;
/// At least one check failed.
pub const EXIT_CHECK_FAILED: u8 = 1;
/// The run could not be carried out.
pub const EXIT_HARNESS_ERROR: u8 = 2;

/// Checks that the Tickets P2P backend and frontend are up and healthy.
#[derive(Debug, Parser)]
#[command(name = "smoke", version, about)]
pub struct Cli {
    /// Run in CI mode: serial, two retries, no server reuse.
    #[arg(long)]
    pub ci: bool,

    /// Frontend URL; the frontend server is expected on its port.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Backend URL; the backend server is expected on its port.
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Extra attempts for a failing check.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Checks run at once.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-attempt timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Command that starts the backend.
    #[arg(long)]
    pub backend_command: Option<String>,

    /// Command that starts the frontend.
    #[arg(long)]
    pub frontend_command: Option<String>,

    /// Directory the backend command runs in.
    #[arg(long)]
    pub backend_dir: Option<PathBuf>,

    /// Directory the frontend command runs in.
    #[arg(long)]
    pub frontend_dir: Option<PathBuf>,

    /// Do not launch or reuse servers; check whatever is running.
    #[arg(long)]
    pub no_servers: bool,

    /// Only run checks whose title contains this text.
    #[arg(long)]
    pub grep: Option<String>,

    /// Print the selected check titles and exit.
    #[arg(long)]
    pub list: bool,

    /// Write the suite report as JSON to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// The default suite narrowed by `--grep`.
    pub fn selected_checks(&self) -> Vec<Arc<dyn SmokeCheck>> {
        checks::select(checks::default_suite(), self.grep.as_deref())
    }

    /// Layers the flags over `base`, usually [`HarnessConfig::from_env`].
    /// A flag wins over the environment value it names.
    pub fn apply(&self, mut config: HarnessConfig) -> Result<HarnessConfig> {
        if self.ci && !config.ci {
            config.enable_ci();
        }
        if let Some(url) = &self.base_url {
            config.set_base_url(url.clone())?;
        }
        if let Some(url) = &self.backend_url {
            config.set_backend_url(url.clone())?;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(command) = &self.backend_command {
            config.set_command("backend", command.clone());
        }
        if let Some(command) = &self.frontend_command {
            config.set_command("frontend", command.clone());
        }
        if let Some(dir) = &self.backend_dir {
            config.set_working_dir("backend", dir.clone());
        }
        if let Some(dir) = &self.frontend_dir {
            config.set_working_dir("frontend", dir.clone());
        }
        Ok(config)
    }
}

/// Process exit status for the outcome of a run.
pub fn exit_status(result: &Result<SuiteReport>) -> u8 {
    match result {
        Ok(report) if report.is_success() => EXIT_SUCCESS,
        Ok(_) => EXIT_CHECK_FAILED,
        Err(_) => EXIT_HARNESS_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use crate::report::{CheckOutcome, CheckStatus};
    use chrono::Utc;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("smoke").chain(args.iter().copied())).unwrap()
    }

    fn outcome(status: CheckStatus) -> CheckOutcome {
        CheckOutcome {
            title: "check".to_string(),
            status,
            attempts: 1,
            duration_ms: 1,
            error: None,
            failure_kind: None,
        }
    }

    fn report(statuses: &[CheckStatus]) -> SuiteReport {
        SuiteReport::new(
            Utc::now(),
            false,
            1,
            0,
            statuses.iter().copied().map(outcome).collect(),
        )
    }

    #[test]
    fn test_ci_flag_forces_ci_settings() {
        let config = cli(&["--ci"]).apply(HarnessConfig::for_mode(false)).unwrap();
        assert!(config.ci);
        assert_eq!(config.retries, 2);
        assert_eq!(config.workers, 1);
        assert!(config.web_servers.iter().all(|s| !s.reuse_existing_server));
    }

    #[test]
    fn test_explicit_flags_beat_ci_flag() {
        let config = cli(&["--ci", "--retries", "0", "--workers", "3"])
            .apply(HarnessConfig::for_mode(false))
            .unwrap();
        assert_eq!(config.retries, 0);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_flag_beats_environment_value() {
        let mut from_env = HarnessConfig::for_mode(false);
        from_env.set_backend_url("http://localhost:9000".to_string()).unwrap();
        from_env.set_command("backend", "./api-from-env".to_string());
        from_env.timeout = Duration::from_secs(5);

        let config = cli(&[
            "--backend-url",
            "http://localhost:9100",
            "--backend-command",
            "./api-from-flag",
            "--timeout-secs",
            "7",
        ])
        .apply(from_env)
        .unwrap();

        assert_eq!(config.backend_url, "http://localhost:9100");
        assert_eq!(config.web_servers[0].port, 9100);
        assert_eq!(config.web_servers[0].command, "./api-from-flag");
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_unset_flags_keep_environment_values() {
        let mut from_env = HarnessConfig::for_mode(true);
        from_env.set_base_url("http://localhost:4000".to_string()).unwrap();

        let config = cli(&[]).apply(from_env).unwrap();

        assert!(config.ci);
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.web_servers[1].port, 4000);
    }

    #[test]
    fn test_working_dir_flags() {
        let config = cli(&["--frontend-dir", "frontend", "--backend-dir", "backend"])
            .apply(HarnessConfig::default())
            .unwrap();
        assert_eq!(config.web_servers[0].working_dir, Some(PathBuf::from("backend")));
        assert_eq!(config.web_servers[1].working_dir, Some(PathBuf::from("frontend")));
    }

    #[test]
    fn test_bad_url_flag_is_rejected() {
        let err = cli(&["--base-url", "nope"])
            .apply(HarnessConfig::default())
            .unwrap_err();
        assert!(matches!(err, HarnessError::InvalidUrl { field: "base", .. }));
    }

    #[test]
    fn test_grep_narrows_selection() {
        let checks = cli(&["--grep", "documentation"]).selected_checks();
        assert_eq!(checks.len(), 1);
        assert_eq!(cli(&[]).selected_checks().len(), 4);
    }

    #[test]
    fn test_unknown_flag_is_a_parse_error() {
        assert!(Cli::try_parse_from(["smoke", "--headless"]).is_err());
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(report(&[CheckStatus::Passed]))), EXIT_SUCCESS);
        assert_eq!(
            exit_status(&Ok(report(&[CheckStatus::Passed, CheckStatus::Flaky]))),
            EXIT_SUCCESS
        );
        assert_eq!(
            exit_status(&Ok(report(&[CheckStatus::Flaky, CheckStatus::Failed]))),
            EXIT_CHECK_FAILED
        );
        assert_eq!(
            exit_status(&Err(HarnessError::PortInUse {
                name: "backend".to_string(),
                port: 8000,
            })),
            EXIT_HARNESS_ERROR
        );
    }
}
