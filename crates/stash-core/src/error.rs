//! Error types shared across the stash workspace.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to or supervising the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused or dropped the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store is reachable but rejected our credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// A probe or command exceeded its time budget.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The store answered with something we could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("io error: {0}")]
    Io(String),
}

impl StoreError {
    /// Whether this error still proves a server is listening on the
    /// target address. An authentication failure requires a completed
    /// TCP handshake, so it counts as liveness.
    pub fn proves_liveness(&self) -> bool {
        matches!(self, StoreError::Auth(_) | StoreError::Protocol(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}
