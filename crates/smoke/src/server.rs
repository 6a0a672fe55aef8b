//! Launching the servers under test, or reusing ones already running.
//!
//! A launched command runs in its own process group, so stopping it also
//! stops whatever the command started (`cargo run` starting the binary,
//! `npm run dev` starting node).

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};

use crate::config::WebServerConfig;
use crate::error::{HarnessError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// How long a stopped server may take to exit after SIGTERM before it is killed.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// A server process group launched by the harness.
///
/// Dropping it without [`SpawnedServer::stop`] kills the whole group.
#[derive(Debug)]
pub struct SpawnedServer {
    name: String,
    port: u16,
    child: Child,
    /// Process group id; equals the launcher's pid.
    pgid: Option<i32>,
    stopped: bool,
}

impl SpawnedServer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Terminates the process group, escalating to SIGKILL after a grace
    /// period, and reaps the launcher.
    pub async fn stop(&mut self) -> std::io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        let Some(pgid) = self.pgid else {
            self.stopped = true;
            return self.child.kill().await;
        };

        signal_group(pgid, GroupSignal::Terminate);
        let deadline = Instant::now() + STOP_GRACE;
        loop {
            // a zombie launcher still counts as a group member until reaped
            let _ = self.child.try_wait();
            if !group_alive(pgid) || Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        if group_alive(pgid) {
            tracing::warn!(server = %self.name, "server ignored SIGTERM, killing");
            signal_group(pgid, GroupSignal::Kill);
        }

        self.stopped = true;
        self.child.wait().await.map(|_| ())
    }
}

impl Drop for SpawnedServer {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        if let Some(pgid) = self.pgid {
            signal_group(pgid, GroupSignal::Kill);
        }
        let _ = self.child.start_kill();
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(pgid: i32, signal: GroupSignal) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let signal = match signal {
        GroupSignal::Terminate => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };
    if let Err(errno) = killpg(Pid::from_raw(pgid), signal) {
        tracing::debug!(pgid, %errno, "signalling process group failed");
    }
}

#[cfg(unix)]
fn group_alive(pgid: i32) -> bool {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    // signal 0 only checks that some member of the group still exists
    killpg(Pid::from_raw(pgid), None::<Signal>).is_ok()
}

#[cfg(not(unix))]
fn signal_group(_pgid: i32, _signal: GroupSignal) {}

#[cfg(not(unix))]
fn group_alive(_pgid: i32) -> bool {
    false
}

/// A server the harness made sure is running.
#[derive(Debug)]
pub enum ServerHandle {
    /// Something was already listening on the port.
    Reused { name: String, port: u16 },
    /// Launched by the harness.
    Spawned(SpawnedServer),
}

impl ServerHandle {
    pub fn name(&self) -> &str {
        match self {
            ServerHandle::Reused { name, .. } => name,
            ServerHandle::Spawned(server) => server.name(),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            ServerHandle::Reused { port, .. } => *port,
            ServerHandle::Spawned(server) => server.port(),
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, ServerHandle::Reused { .. })
    }
}

/// The servers started for a run.
#[derive(Debug, Default)]
pub struct ManagedServers {
    handles: Vec<ServerHandle>,
}

impl ManagedServers {
    pub fn handles(&self) -> &[ServerHandle] {
        &self.handles
    }

    /// Stops every spawned server. Reused servers are left running.
    pub async fn shutdown(self) {
        for handle in self.handles {
            if let ServerHandle::Spawned(mut server) = handle {
                match server.stop().await {
                    Ok(()) => tracing::info!(server = %server.name, "server stopped"),
                    Err(err) => {
                        tracing::warn!(server = %server.name, error = %err, "failed to stop server")
                    }
                }
            }
        }
    }
}

/// Ensures every configured server is up, in order.
///
/// On failure the servers already started are dropped, which kills them.
pub async fn start_all(configs: &[WebServerConfig]) -> Result<ManagedServers> {
    let mut servers = ManagedServers::default();
    for config in configs {
        servers.handles.push(ensure_running(config).await?);
    }
    Ok(servers)
}

/// Reuses a server already listening on the configured port, or launches
/// one and waits for its port to open.
#[tracing::instrument(skip_all, fields(server = %config.name, port = config.port))]
pub async fn ensure_running(config: &WebServerConfig) -> Result<ServerHandle> {
    if port_is_open(config.port).await {
        if config.reuse_existing_server {
            tracing::info!("reusing server already listening");
            return Ok(ServerHandle::Reused {
                name: config.name.clone(),
                port: config.port,
            });
        }
        return Err(HarnessError::PortInUse {
            name: config.name.clone(),
            port: config.port,
        });
    }

    tracing::info!(command = %config.command, "launching server");
    let mut server = spawn(config)?;
    wait_for_port(config, &mut server.child).await?;
    tracing::info!("server is accepting connections");

    Ok(ServerHandle::Spawned(server))
}

/// Starts the server command through `sh -c` in a new process group, with
/// `PORT` set to the configured port.
pub fn spawn(config: &WebServerConfig) -> Result<SpawnedServer> {
    let mut command = std::process::Command::new("sh");
    command
        .arg("-c")
        .arg(&config.command)
        .env("PORT", config.port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &config.working_dir {
        command.current_dir(dir);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut command = Command::from(command);
    command.kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
        name: config.name.clone(),
        command: config.command.clone(),
        source,
    })?;

    if let Some(stdout) = child.stdout.take() {
        forward_output(config.name.clone(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_output(config.name.clone(), "stderr", stderr);
    }

    let pgid = if cfg!(unix) {
        child.id().and_then(|pid| i32::try_from(pid).ok())
    } else {
        None
    };

    Ok(SpawnedServer {
        name: config.name.clone(),
        port: config.port,
        child,
        pgid,
        stopped: false,
    })
}

/// Re-emits a server's output line by line as tracing events.
fn forward_output<R>(server: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(server = %server, stream, "{line}");
        }
    });
}

async fn wait_for_port(config: &WebServerConfig, child: &mut Child) -> Result<()> {
    let deadline = Instant::now() + config.startup_timeout;
    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(HarnessError::ExitedEarly {
                name: config.name.clone(),
                status,
            });
        }
        if port_is_open(config.port).await {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(HarnessError::StartupTimeout {
                name: config.name.clone(),
                port: config.port,
                timeout: config.startup_timeout,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// True if something on localhost accepts connections on `port`.
pub async fn port_is_open(port: u16) -> bool {
    matches!(
        tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(("localhost", port))).await,
        Ok(Ok(_))
    )
}
