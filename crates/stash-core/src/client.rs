//! Client seam for the key-value store.
//!
//! The lifecycle and persistence layers never speak the store's wire
//! protocol; they go through this trait. The production implementation
//! wraps the official Redis client (see `stash-lifecycle`), tests use
//! in-memory doubles with call counters.

use crate::error::StoreResult;

/// The subset of store operations this system relies on: liveness,
/// get/set/delete/exists, and graceful server shutdown.
pub trait StoreClient {
    /// Liveness check (PING).
    fn ping(&mut self) -> StoreResult<()>;

    /// Fetch the value stored under `key`, if any.
    fn get(&mut self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, overwriting any existing value.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Returns whether a value existed.
    fn del(&mut self, key: &str) -> StoreResult<bool>;

    /// Whether `key` currently holds a value.
    fn exists(&mut self, key: &str) -> StoreResult<bool>;

    /// Ask the server to persist its data and exit.
    ///
    /// The server drops the connection while exiting, so implementations
    /// should treat a connection error raised by this call as success.
    fn shutdown_server(&mut self) -> StoreResult<()>;
}
