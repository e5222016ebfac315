//! Process-exit and signal-driven cleanup.
//!
//! Installs one idempotent cleanup routine — close the client, then
//! shut down a server we launched — on two paths: a guard whose `Drop`
//! covers normal exit, and a signal-watcher thread covering SIGINT and
//! SIGTERM. Both paths share an atomic flag so cleanup runs exactly
//! once no matter which fires first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::info;

use crate::manager::StoreManager;

/// A manager shared with the signal-watcher thread.
pub type SharedManager = Arc<Mutex<StoreManager>>;

/// Runs cleanup on drop unless a signal handler already did.
pub struct CleanupGuard {
    manager: SharedManager,
    done: Arc<AtomicBool>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        run_cleanup(&self.manager, &self.done);
    }
}

/// Register the cleanup routine for normal exit and for termination
/// signals. The returned guard must be held for the life of the
/// process; dropping it runs cleanup.
pub fn register_cleanup_handlers(manager: SharedManager) -> std::io::Result<CleanupGuard> {
    let done = Arc::new(AtomicBool::new(false));

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let signal_manager = Arc::clone(&manager);
    let signal_done = Arc::clone(&done);
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!(signal, "received termination signal, shutting down");
            run_cleanup(&signal_manager, &signal_done);
            std::process::exit(0);
        }
    });

    Ok(CleanupGuard { manager, done })
}

/// Close the client connection, then shut down the server if we
/// launched it. Safe to invoke from multiple paths; only the first
/// call does anything.
fn run_cleanup(manager: &SharedManager, done: &AtomicBool) {
    if done.swap(true, Ordering::SeqCst) {
        return;
    }
    // A poisoned lock must not abort teardown.
    let mut manager = match manager.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    manager.close();
    manager.shutdown();
}
