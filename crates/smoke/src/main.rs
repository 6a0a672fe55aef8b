//! Smoke harness entry point.

use std::process::ExitCode;

use clap::Parser;
use smoke::HarnessConfig;
use smoke::cli::{self, Cli};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let selected = cli.selected_checks();
    if cli.list {
        for check in &selected {
            println!("{}", check.title());
        }
        return ExitCode::SUCCESS;
    }

    let config = match HarnessConfig::from_env().and_then(|config| cli.apply(config)) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::from(cli::EXIT_HARNESS_ERROR);
        }
    };

    let result = smoke::run_suite(&config, selected, !cli.no_servers).await;
    match &result {
        Ok(report) => {
            print!("{}", report.render_summary());
            if let Some(path) = &cli.report {
                if let Err(err) = report.write_json(path) {
                    tracing::error!(error = %err, path = %path.display(), "failed to write report");
                    return ExitCode::from(cli::EXIT_HARNESS_ERROR);
                }
                tracing::info!(path = %path.display(), "report written");
            }
        }
        Err(err) => tracing::error!(error = %err, "smoke run aborted"),
    }

    ExitCode::from(cli::exit_status(&result))
}
