//! Store manager — owns the client handle, the server process handle,
//! and the launched-by-us flag as one struct.
//!
//! Only the launcher sets the process handle and flag, only the
//! shutdown path clears them, and only the connection methods here
//! touch the client handle. When shared with the signal thread the
//! manager is wrapped in `Arc<Mutex<..>>`.

use tracing::{error, info};

use stash_core::config::FALLBACK_PASSWORD;
use stash_core::{StoreClient, StoreConfig};

use crate::locator::{self, ConnectionParams};
use crate::process::ServerProcess;
use crate::redis_client::{Connect, RedisConnector};

/// Optional per-call overrides for [`StoreManager::connect`]. Fields
/// left as `None` fall back to the configured URL.
#[derive(Debug, Clone, Default)]
pub struct ConnectOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub db_index: Option<i64>,
}

/// Process-wide store state: connection parameters, client handle,
/// process handle, and whether we launched the server.
pub struct StoreManager {
    pub(crate) config: StoreConfig,
    pub(crate) client: Option<Box<dyn StoreClient + Send>>,
    pub(crate) process: Option<Box<dyn ServerProcess>>,
    pub(crate) launched_by_us: bool,
}

impl StoreManager {
    /// Create a manager with empty state.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: None,
            process: None,
            launched_by_us: false,
        }
    }

    /// Create a manager from the environment.
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether this process is responsible for tearing down the server.
    pub fn launched_by_us(&self) -> bool {
        self.launched_by_us
    }

    /// Whether a server process handle is held.
    pub fn has_process(&self) -> bool {
        self.process.is_some()
    }

    /// Resolve connection parameters from the configured URL plus any
    /// caller overrides, applying the hard-coded fallback password when
    /// none is configured anywhere. Pure; no network access.
    pub fn resolve_params(&self, overrides: &ConnectOverrides) -> ConnectionParams {
        let mut params = locator::parse(&self.config.url);
        if let Some(host) = &overrides.host {
            params.host = host.clone();
        }
        if let Some(port) = overrides.port {
            params.port = port;
        }
        if let Some(password) = &overrides.password {
            params.password = Some(password.clone());
        }
        if params.password.is_none() {
            params.password = Some(FALLBACK_PASSWORD.to_string());
        }
        if let Some(db) = overrides.db_index {
            params.db_index = db;
        }
        params
    }

    /// Connect to the store, verify liveness, and hold the handle.
    ///
    /// Connection failures are logged and reported as `false`; they are
    /// never raised.
    pub fn connect(&mut self, overrides: &ConnectOverrides) -> bool {
        self.connect_with(&RedisConnector, overrides)
    }

    /// [`connect`](Self::connect) with an injected connector.
    pub fn connect_with(&mut self, connector: &dyn Connect, overrides: &ConnectOverrides) -> bool {
        let params = self.resolve_params(overrides);
        match connector.connect(&params, None) {
            Ok(client) => {
                info!(host = %params.host, port = params.port, "connected to store");
                self.client = Some(client);
                true
            }
            Err(e) => {
                error!(host = %params.host, port = params.port, error = %e, "failed to connect to store");
                false
            }
        }
    }

    /// The held client handle, if any.
    pub fn client_mut(&mut self) -> Option<&mut (dyn StoreClient + Send + 'static)> {
        self.client.as_deref_mut()
    }

    /// Return the held client handle, connecting with defaults if none
    /// is held yet.
    pub fn get_or_connect(&mut self) -> Option<&mut (dyn StoreClient + Send + 'static)> {
        if self.client.is_none() {
            self.connect(&ConnectOverrides::default());
        }
        self.client_mut()
    }

    /// Close the client connection if one is held. A no-op otherwise;
    /// close failures are logged, never raised.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            info!("closing store client connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingClient, FailingConnector, RecordingConnector};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn manager_with_url(url: &str) -> StoreManager {
        StoreManager::new(StoreConfig::new(url, "/tmp/stash-test-db"))
    }

    #[test]
    fn resolve_params_from_url_only() {
        let manager = manager_with_url("redis://:secret@10.1.2.3:6390/4");
        let params = manager.resolve_params(&ConnectOverrides::default());
        assert_eq!(params.host, "10.1.2.3");
        assert_eq!(params.port, 6390);
        assert_eq!(params.password.as_deref(), Some("secret"));
        assert_eq!(params.db_index, 4);
    }

    #[test]
    fn resolve_params_applies_fallback_password() {
        let manager = manager_with_url("redis://localhost");
        let params = manager.resolve_params(&ConnectOverrides::default());
        assert_eq!(params.password.as_deref(), Some(FALLBACK_PASSWORD));
    }

    #[test]
    fn resolve_params_overrides_win() {
        let manager = manager_with_url("redis://:secret@localhost:6379/1");
        let overrides = ConnectOverrides {
            host: Some("other".to_string()),
            port: Some(7000),
            password: Some("override".to_string()),
            db_index: Some(9),
        };
        let params = manager.resolve_params(&overrides);
        assert_eq!(params.host, "other");
        assert_eq!(params.port, 7000);
        assert_eq!(params.password.as_deref(), Some("override"));
        assert_eq!(params.db_index, 9);
    }

    #[test]
    fn connect_stores_handle_on_success() {
        let mut manager = manager_with_url("redis://localhost");
        let connector = RecordingConnector::default();

        assert!(manager.connect_with(&connector, &ConnectOverrides::default()));
        assert!(manager.client_mut().is_some());
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_failure_returns_false_without_handle() {
        let mut manager = manager_with_url("redis://localhost");

        assert!(!manager.connect_with(&FailingConnector, &ConnectOverrides::default()));
        assert!(manager.client_mut().is_none());
    }

    #[test]
    fn close_without_handle_is_noop() {
        let mut manager = manager_with_url("redis://localhost");
        manager.close();
        assert!(manager.client_mut().is_none());
    }

    #[test]
    fn close_clears_held_handle() {
        let mut manager = manager_with_url("redis://localhost");
        let client = CountingClient::default();
        manager.client = Some(Box::new(client));

        manager.close();
        assert!(manager.client_mut().is_none());
    }

    #[test]
    fn get_or_connect_reuses_existing_handle() {
        let mut manager = manager_with_url("redis://localhost");
        let client = CountingClient::default();
        let gets = Arc::clone(&client.gets);
        manager.client = Some(Box::new(client));

        assert!(manager.get_or_connect().is_some());
        // No reconnect happened, and no store commands were issued.
        assert_eq!(gets.load(Ordering::SeqCst), 0);
    }
}
