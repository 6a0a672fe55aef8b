//! Harness configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use common::{DEFAULT_BACKEND_PORT, DEFAULT_FRONTEND_PORT};
use reqwest::Url;

use crate::error::{HarnessError, Result};

/// Retries granted to each check under CI.
pub const CI_RETRIES: u32 = 2;

/// A server the harness ensures is running before any check.
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Label used in logs and errors.
    pub name: String,
    /// Shell command that starts the server.
    pub command: String,
    /// Port that accepts connections once the server is up.
    pub port: u16,
    /// Use a server already listening on `port` instead of failing.
    pub reuse_existing_server: bool,
    pub startup_timeout: Duration,
    /// Directory the command runs in; the harness's own when unset.
    pub working_dir: Option<PathBuf>,
}

/// Harness configuration.
///
/// Reads from environment variables:
/// - `CI`: enables CI mode (serial, retried, no server reuse)
/// - `SMOKE_BASE_URL`: frontend URL (default: `"http://localhost:3000"`)
/// - `SMOKE_BACKEND_URL`: backend URL (default: `"http://localhost:8000"`)
/// - `SMOKE_TIMEOUT_SECS`: per-check timeout (default: `30`)
/// - `SMOKE_STARTUP_TIMEOUT_SECS`: per-server startup timeout (default: `120`)
/// - `SMOKE_BACKEND_COMMAND`: backend launch command (default: `"cargo run -p api"`)
/// - `SMOKE_FRONTEND_COMMAND`: frontend launch command (default: `"cargo run -p web"`)
/// - `SMOKE_BACKEND_DIR`, `SMOKE_FRONTEND_DIR`: directories the launch commands run in
///
/// The port each server is expected on follows the port of its URL.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub backend_url: String,
    pub ci: bool,
    /// Extra attempts after a failed one.
    pub retries: u32,
    /// Checks allowed to run at once.
    pub workers: usize,
    /// Bound on a single check attempt.
    pub timeout: Duration,
    pub web_servers: Vec<WebServerConfig>,
}

impl HarnessConfig {
    /// Defaults for local runs (`ci == false`) or CI runs.
    pub fn for_mode(ci: bool) -> Self {
        Self {
            base_url: default_url(DEFAULT_FRONTEND_PORT),
            backend_url: default_url(DEFAULT_BACKEND_PORT),
            ci,
            retries: if ci { CI_RETRIES } else { 0 },
            workers: if ci { 1 } else { available_workers() },
            timeout: Duration::from_secs(30),
            web_servers: vec![
                WebServerConfig {
                    name: "backend".to_string(),
                    command: "cargo run -p api".to_string(),
                    port: DEFAULT_BACKEND_PORT,
                    reuse_existing_server: !ci,
                    startup_timeout: Duration::from_secs(120),
                    working_dir: None,
                },
                WebServerConfig {
                    name: "frontend".to_string(),
                    command: "cargo run -p web".to_string(),
                    port: DEFAULT_FRONTEND_PORT,
                    reuse_existing_server: !ci,
                    startup_timeout: Duration::from_secs(120),
                    working_dir: None,
                },
            ],
        }
    }

    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::for_mode(is_ci(std::env::var("CI").ok().as_deref()));

        if let Ok(value) = std::env::var("SMOKE_BASE_URL") {
            config.set_base_url(value)?;
        }
        if let Ok(value) = std::env::var("SMOKE_BACKEND_URL") {
            config.set_backend_url(value)?;
        }
        if let Some(secs) = env_u64("SMOKE_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("SMOKE_STARTUP_TIMEOUT_SECS") {
            for server in &mut config.web_servers {
                server.startup_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(command) = std::env::var("SMOKE_BACKEND_COMMAND") {
            config.set_command("backend", command);
        }
        if let Ok(command) = std::env::var("SMOKE_FRONTEND_COMMAND") {
            config.set_command("frontend", command);
        }
        if let Ok(dir) = std::env::var("SMOKE_BACKEND_DIR") {
            config.set_working_dir("backend", dir);
        }
        if let Ok(dir) = std::env::var("SMOKE_FRONTEND_DIR") {
            config.set_working_dir("frontend", dir);
        }

        Ok(config)
    }

    /// Sets the frontend URL and moves the frontend server to its port.
    pub fn set_base_url(&mut self, value: String) -> Result<()> {
        let port = url_port("base", &value)?;
        self.base_url = value;
        self.set_port("frontend", port);
        Ok(())
    }

    /// Sets the backend URL and moves the backend server to its port.
    pub fn set_backend_url(&mut self, value: String) -> Result<()> {
        let port = url_port("backend", &value)?;
        self.backend_url = value;
        self.set_port("backend", port);
        Ok(())
    }

    /// Replaces the launch command of the named server.
    pub fn set_command(&mut self, name: &str, command: String) {
        if let Some(server) = self.server_mut(name) {
            server.command = command;
        }
    }

    /// Runs the named server's command from `dir`.
    pub fn set_working_dir(&mut self, name: &str, dir: impl Into<PathBuf>) {
        if let Some(server) = self.server_mut(name) {
            server.working_dir = Some(dir.into());
        }
    }

    /// Turns CI mode on: serial, retried, and never reusing a server.
    pub fn enable_ci(&mut self) {
        self.ci = true;
        self.retries = CI_RETRIES;
        self.workers = 1;
        for server in &mut self.web_servers {
            server.reuse_existing_server = false;
        }
    }

    fn set_port(&mut self, name: &str, port: u16) {
        if let Some(server) = self.server_mut(name) {
            server.port = port;
        }
    }

    fn server_mut(&mut self, name: &str) -> Option<&mut WebServerConfig> {
        self.web_servers.iter_mut().find(|s| s.name == name)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::for_mode(false)
    }
}

/// Interprets the `CI` variable: set, non-empty and not `0`/`false`.
pub fn is_ci(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    }
}

/// Parses a configured URL, naming the field on failure.
pub fn parse_url(field: &'static str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|err| HarnessError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

/// Port a URL connects to, explicit or implied by its scheme.
fn url_port(field: &'static str, value: &str) -> Result<u16> {
    let url = parse_url(field, value)?;
    url.port_or_known_default()
        .ok_or_else(|| HarnessError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: "no port for scheme".to_string(),
        })
}

fn default_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
