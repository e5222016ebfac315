//! Escalating shutdown of a server this process launched.
//!
//! The sequence is a fixed ordered list of steps — graceful protocol
//! shutdown, terminate, kill — driven by a loop that logs each step's
//! failure independently and always proceeds. State is cleared
//! unconditionally afterwards: leaving a stale process handle or flag
//! would make a future launch skip spawning.

use std::time::Duration;

use tracing::{info, warn};

use crate::manager::StoreManager;

/// Grace period between terminate and kill.
const TERMINATE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
enum Step {
    Graceful,
    Terminate,
    Kill,
}

impl StoreManager {
    /// Shut down the store server if and only if we launched it.
    ///
    /// Never touches a server someone else started. Step failures are
    /// logged and the sequence continues; the operation always
    /// completes and clears the process handle and launched flag.
    pub fn shutdown(&mut self) {
        self.shutdown_with_grace(TERMINATE_GRACE);
    }

    /// [`shutdown`](Self::shutdown) with an explicit terminate grace
    /// period.
    pub fn shutdown_with_grace(&mut self, grace: Duration) {
        if !self.launched_by_us {
            return;
        }
        if self.process.is_none() {
            // Flag set without a handle: a cleared process left the flag
            // behind. Normalize instead of skipping future launches.
            warn!("launched flag set without a process handle, clearing");
            self.launched_by_us = false;
            return;
        }

        info!("shutting down store server that we launched");

        for step in [Step::Graceful, Step::Terminate, Step::Kill] {
            if let Err(e) = self.run_step(step, grace) {
                warn!(step = ?step, error = %e, "shutdown step failed, continuing");
            }
        }

        self.process = None;
        self.launched_by_us = false;
        info!("store server shutdown complete");
    }

    fn run_step(&mut self, step: Step, grace: Duration) -> stash_core::StoreResult<()> {
        match step {
            Step::Graceful => {
                if let Some(client) = self.client.as_deref_mut() {
                    client.shutdown_server()?;
                }
            }
            Step::Terminate => {
                if let Some(process) = self.process.as_deref_mut() {
                    if process.is_running() {
                        info!(pid = process.id(), "terminating store server process");
                        process.terminate()?;
                        std::thread::sleep(grace);
                    }
                }
            }
            Step::Kill => {
                if let Some(process) = self.process.as_deref_mut() {
                    if process.is_running() {
                        warn!(
                            pid = process.id(),
                            "store server not responding to terminate, forcing kill"
                        );
                        process.kill()?;
                    }
                }
            }
        }
        Ok(())
    }
}
