//! Environment-driven configuration for the store subsystem.

use std::env;
use std::path::PathBuf;

/// Environment variable holding the store connection URL.
pub const STORE_URL_ENV: &str = "STASH_REDIS_URL";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STASH_DATA_DIR";

/// URL used when the environment provides none.
pub const DEFAULT_STORE_URL: &str = "redis://localhost:6379";

/// Well-known port of the store server.
pub const DEFAULT_STORE_PORT: u16 = 6379;

/// Password used when neither the URL nor the caller supplies one.
pub const FALLBACK_PASSWORD: &str = "redispassword";

/// Resolved configuration for the store subsystem.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store connection URL, `scheme://[:password@]host[:port][/db]`.
    pub url: String,
    /// Directory the store server writes its database files into.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Build a config from the environment, filling defaults for any
    /// unset variable.
    pub fn from_env() -> Self {
        let url = env::var(STORE_URL_ENV).unwrap_or_else(|_| DEFAULT_STORE_URL.to_string());
        let data_dir = env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::paths::default_data_dir());
        Self { url, data_dir }
    }

    /// Build a config with an explicit URL and data directory.
    pub fn new(url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            data_dir: data_dir.into(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_URL, crate::paths::default_data_dir())
    }
}
