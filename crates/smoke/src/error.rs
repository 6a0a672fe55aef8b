//! Smoke harness error types.

use std::process::ExitStatus;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a single check attempt failed.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The service answered, but not with what was expected.
    #[error("{0}")]
    Assertion(String),

    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The attempt ran past its timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The harness could not run the check at all.
    #[error("{0}")]
    Infrastructure(String),
}

impl CheckError {
    /// Builds an assertion failure from a message.
    pub fn assertion(message: impl Into<String>) -> Self {
        CheckError::Assertion(message.into())
    }

    /// Classifies the failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            CheckError::Assertion(_) => FailureKind::Assertion,
            CheckError::Request(_) | CheckError::Timeout(_) | CheckError::Infrastructure(_) => {
                FailureKind::Infrastructure
            }
        }
    }

    /// Returns true if the service answered with an unexpected value.
    pub fn is_assertion(&self) -> bool {
        self.kind() == FailureKind::Assertion
    }
}

/// Failure taxonomy reported for failed checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected value mismatch: status code, JSON field, title, visibility.
    Assertion,
    /// Process, port, request or timeout failure.
    Infrastructure,
}

/// Errors that stop the harness before or after the checks run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A URL in the configuration does not parse.
    #[error("invalid {field} URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A port is taken and the server may not be reused.
    #[error(
        "{name}: http://localhost:{port} is already used, make sure that nothing is running on the port or enable server reuse"
    )]
    PortInUse { name: String, port: u16 },

    /// The server command could not be started.
    #[error("{name}: failed to launch `{command}`: {source}")]
    Spawn {
        name: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The server process exited before its port opened.
    #[error("{name}: process exited early with {status}")]
    ExitedEarly { name: String, status: ExitStatus },

    /// The server port did not open in time.
    #[error("{name}: port {port} did not accept connections within {timeout:?}")]
    StartupTimeout {
        name: String,
        port: u16,
        timeout: Duration,
    },

    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    ReportIo(#[from] std::io::Error),

    /// Serializing the report failed.
    #[error("failed to serialize report: {0}")]
    ReportFormat(#[from] serde_json::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
