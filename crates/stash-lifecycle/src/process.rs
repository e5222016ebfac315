//! Store server process handling.
//!
//! Builds the fixed argument vector for the store server binary and
//! wraps the spawned child behind the [`ServerProcess`] trait so the
//! launcher and shutdown paths can be exercised without a real binary.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::debug;

use stash_core::{StoreError, StoreResult};

/// Name of the store server executable looked up on PATH.
pub const SERVER_PROGRAM: &str = "redis-server";

/// Fully resolved invocation of the store server binary.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    pub port: u16,
    pub password: String,
    /// Enable append-only durability.
    pub append_only: bool,
    /// Keyspace change-notification flags, e.g. `KEA`.
    pub keyspace_events: Option<String>,
    /// Working directory for the server's database files.
    pub data_dir: PathBuf,
}

impl ServerCommand {
    /// The argument vector passed to the server binary.
    pub fn argv(&self) -> Vec<String> {
        let mut args = vec![
            "--port".to_string(),
            self.port.to_string(),
            "--requirepass".to_string(),
            self.password.clone(),
        ];
        if self.append_only {
            args.push("--appendonly".to_string());
            args.push("yes".to_string());
        }
        if let Some(events) = &self.keyspace_events {
            args.push("--notify-keyspace-events".to_string());
            args.push(events.clone());
        }
        args.push("--dir".to_string());
        args.push(self.data_dir.display().to_string());
        args
    }
}

/// Handle to a running (or exited) store server process.
pub trait ServerProcess: Send {
    /// OS process id.
    fn id(&self) -> u32;

    /// Whether the process is still alive (non-blocking poll).
    fn is_running(&mut self) -> bool;

    /// Send the graceful termination signal.
    fn terminate(&mut self) -> StoreResult<()>;

    /// Send the forceful kill signal.
    fn kill(&mut self) -> StoreResult<()>;

    /// Drain captured stdout/stderr. Only meaningful once the process
    /// has exited.
    fn captured_output(&mut self) -> (String, String);
}

/// Spawns store server processes.
pub trait Spawn {
    fn spawn(&self, cmd: &ServerCommand) -> StoreResult<Box<dyn ServerProcess>>;
}

/// Production spawner backed by `std::process`.
pub struct ProcessSpawner;

impl Spawn for ProcessSpawner {
    fn spawn(&self, cmd: &ServerCommand) -> StoreResult<Box<dyn ServerProcess>> {
        let child = Command::new(SERVER_PROGRAM)
            .args(cmd.argv())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StoreError::Io(format!("failed to spawn {SERVER_PROGRAM}: {e}")))?;
        debug!(pid = child.id(), port = cmd.port, "store server spawned");
        Ok(Box::new(ChildProcess { child }))
    }
}

/// [`ServerProcess`] over a real child process.
struct ChildProcess {
    child: Child,
}

impl ServerProcess for ChildProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> StoreResult<()> {
        let rc = unsafe { libc::kill(self.child.id() as libc::pid_t, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(StoreError::Io(std::io::Error::last_os_error().to_string()))
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> StoreResult<()> {
        // No graceful signal on this platform; fall through to kill.
        self.child.kill().map_err(Into::into)
    }

    fn kill(&mut self) -> StoreResult<()> {
        self.child.kill().map_err(Into::into)
    }

    fn captured_output(&mut self) -> (String, String) {
        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(mut out) = self.child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        if let Some(mut err) = self.child.stderr.take() {
            let _ = err.read_to_string(&mut stderr);
        }
        (stdout, stderr)
    }
}
