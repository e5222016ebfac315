//! stash-lifecycle — supervision of the external store server.
//!
//! Covers the full lifecycle: parsing the connection URL, probing for
//! and launching a server process, owning the client connection, and
//! escalating shutdown of a server this process started, wired into
//! process teardown via exit hooks.
//!
//! Everything here is synchronous and blocking; the only extra thread
//! is the signal watcher installed by [`hooks::register_cleanup_handlers`].

pub mod hooks;
pub mod launcher;
pub mod locator;
pub mod manager;
pub mod process;
pub mod redis_client;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use hooks::{CleanupGuard, SharedManager, register_cleanup_handlers};
pub use launcher::{LaunchOptions, LaunchOutcome};
pub use locator::{ConnectionParams, parse};
pub use manager::{ConnectOverrides, StoreManager};
pub use process::{ServerCommand, ServerProcess, Spawn};
pub use redis_client::{Connect, RedisConnector};
