//! Store server launcher.
//!
//! Probes the configured address first and only spawns a server binary
//! when nothing is listening. All failures are absorbed into the
//! [`LaunchOutcome`]; launching never panics or propagates errors.

use std::time::Duration;

use tracing::{error, info};

use crate::manager::{ConnectOverrides, StoreManager};
use crate::process::{ProcessSpawner, ServerCommand, Spawn};
use crate::redis_client::{Connect, RedisConnector};

/// Tunables for a launch attempt.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Listening port; defaults to the configured URL's port.
    pub port: Option<u16>,
    /// Server password; defaults to the configured URL's password.
    pub password: Option<String>,
    /// Enable append-only durability.
    pub append_only: bool,
    /// Keyspace change-notification flags, `None` to disable.
    pub keyspace_events: Option<String>,
    /// Connect timeout for the liveness probe.
    pub probe_timeout: Duration,
    /// Time the freshly spawned server gets before the liveness check.
    pub settle: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            port: None,
            password: None,
            append_only: true,
            keyspace_events: Some("KEA".to_string()),
            probe_timeout: Duration::from_secs(1),
            settle: Duration::from_secs(2),
        }
    }
}

/// Result of a launch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A server was already listening on the target address; nothing
    /// was spawned and we are not responsible for teardown.
    AlreadyRunning,
    /// We spawned a server and hold its process handle.
    Launched,
    /// No server is available: the spawn failed or the process exited
    /// before the liveness check.
    Failed,
}

impl LaunchOutcome {
    /// Whether a server is now reachable.
    pub fn success(self) -> bool {
        !matches!(self, LaunchOutcome::Failed)
    }
}

impl StoreManager {
    /// Ensure a store server is running on the configured address,
    /// spawning one if needed.
    pub fn launch(&mut self, opts: &LaunchOptions) -> LaunchOutcome {
        self.launch_with(&RedisConnector, &ProcessSpawner, opts)
    }

    /// [`launch`](Self::launch) with injected probe and spawn seams.
    pub fn launch_with(
        &mut self,
        prober: &dyn Connect,
        spawner: &dyn Spawn,
        opts: &LaunchOptions,
    ) -> LaunchOutcome {
        let overrides = ConnectOverrides {
            port: opts.port,
            password: opts.password.clone(),
            ..Default::default()
        };
        let params = self.resolve_params(&overrides);

        // Short-timeout probe. A successful connect proves a server is
        // already running; so does an authentication error, since it
        // requires a completed TCP handshake.
        match prober.connect(&params, Some(opts.probe_timeout)) {
            Ok(_probe) => {
                info!(port = params.port, "store server already running");
                self.launched_by_us = false;
                return LaunchOutcome::AlreadyRunning;
            }
            Err(e) if e.proves_liveness() => {
                info!(port = params.port, error = %e, "store server already running (auth required)");
                self.launched_by_us = false;
                return LaunchOutcome::AlreadyRunning;
            }
            Err(e) => {
                info!(port = params.port, error = %e, "no store server found, launching new instance");
            }
        }

        let command = ServerCommand {
            port: params.port,
            password: params
                .password
                .clone()
                .unwrap_or_else(|| stash_core::config::FALLBACK_PASSWORD.to_string()),
            append_only: opts.append_only,
            keyspace_events: opts.keyspace_events.clone(),
            data_dir: self.config.data_dir.clone(),
        };

        let mut process = match spawner.spawn(&command) {
            Ok(process) => process,
            Err(e) => {
                error!(error = %e, "failed to spawn store server");
                self.launched_by_us = false;
                return LaunchOutcome::Failed;
            }
        };

        // Give the server time to start before checking on it.
        std::thread::sleep(opts.settle);

        if process.is_running() {
            info!(
                port = params.port,
                pid = process.id(),
                data_dir = %self.config.data_dir.display(),
                "store server launched"
            );
            self.process = Some(process);
            self.launched_by_us = true;
            LaunchOutcome::Launched
        } else {
            let (_, stderr) = process.captured_output();
            error!(stderr = %stderr, "store server exited during startup");
            self.launched_by_us = false;
            LaunchOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        AuthFailConnector, FailingConnector, MockSpawner, ProcessProbe, RecordingConnector,
    };
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use stash_core::StoreConfig;

    fn manager() -> StoreManager {
        StoreManager::new(StoreConfig::new("redis://:pw@localhost:6399", "/tmp/db"))
    }

    fn fast_opts() -> LaunchOptions {
        LaunchOptions {
            settle: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn probe_success_skips_spawn() {
        let mut manager = manager();
        let spawner = MockSpawner::new(ProcessProbe::alive(true));

        let outcome = manager.launch_with(&RecordingConnector::default(), &spawner, &fast_opts());

        assert_eq!(outcome, LaunchOutcome::AlreadyRunning);
        assert!(outcome.success());
        assert!(!manager.launched_by_us());
        assert!(!manager.has_process());
        assert_eq!(spawner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn probe_auth_error_counts_as_running() {
        let mut manager = manager();
        let spawner = MockSpawner::new(ProcessProbe::alive(true));

        let outcome = manager.launch_with(&AuthFailConnector, &spawner, &fast_opts());

        assert_eq!(outcome, LaunchOutcome::AlreadyRunning);
        assert_eq!(spawner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn spawn_when_probe_refused() {
        let mut manager = manager();
        let probe = ProcessProbe::alive(true);
        let spawner = MockSpawner::new(Arc::clone(&probe));

        let outcome = manager.launch_with(&FailingConnector, &spawner, &fast_opts());

        assert_eq!(outcome, LaunchOutcome::Launched);
        assert!(manager.launched_by_us());
        assert!(manager.has_process());
        assert_eq!(spawner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn early_exit_reports_failure() {
        let mut manager = manager();
        let spawner = MockSpawner::new(ProcessProbe::exited());

        let outcome = manager.launch_with(&FailingConnector, &spawner, &fast_opts());

        assert_eq!(outcome, LaunchOutcome::Failed);
        assert!(!outcome.success());
        assert!(!manager.launched_by_us());
        assert!(!manager.has_process());
    }

    #[test]
    fn spawn_error_is_absorbed() {
        let mut manager = manager();
        let spawner = MockSpawner::failing();

        let outcome = manager.launch_with(&FailingConnector, &spawner, &fast_opts());

        assert_eq!(outcome, LaunchOutcome::Failed);
        assert!(!manager.launched_by_us());
        assert!(!manager.has_process());
    }
}
