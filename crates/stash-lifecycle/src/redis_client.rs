//! Redis-backed implementation of the [`StoreClient`] seam.
//!
//! All wire-protocol work is delegated to the official `redis` crate;
//! this module only maps its errors into the workspace taxonomy.

use std::time::Duration;

use redis::{Commands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::debug;

use stash_core::{StoreClient, StoreError, StoreResult};

use crate::locator::ConnectionParams;

/// Opens [`StoreClient`] handles against resolved connection parameters.
pub trait Connect {
    /// Open a client and verify liveness. `connect_timeout` bounds the
    /// TCP connect for probe use; `None` uses the library default.
    fn connect(
        &self,
        params: &ConnectionParams,
        connect_timeout: Option<Duration>,
    ) -> StoreResult<Box<dyn StoreClient + Send>>;
}

/// Production connector backed by the official client library.
pub struct RedisConnector;

impl Connect for RedisConnector {
    fn connect(
        &self,
        params: &ConnectionParams,
        connect_timeout: Option<Duration>,
    ) -> StoreResult<Box<dyn StoreClient + Send>> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(params.host.clone(), params.port),
            redis: RedisConnectionInfo {
                db: params.db_index,
                password: params.password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info).map_err(map_redis_err)?;
        let con = match connect_timeout {
            Some(timeout) => client
                .get_connection_with_timeout(timeout)
                .map_err(map_redis_err)?,
            None => client.get_connection().map_err(map_redis_err)?,
        };
        let mut store = RedisStoreClient { con };
        store.ping()?;
        Ok(Box::new(store))
    }
}

/// [`StoreClient`] over a synchronous Redis connection.
pub struct RedisStoreClient {
    con: redis::Connection,
}

impl StoreClient for RedisStoreClient {
    fn ping(&mut self) -> StoreResult<()> {
        redis::cmd("PING")
            .query::<String>(&mut self.con)
            .map_err(map_redis_err)?;
        Ok(())
    }

    fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        self.con.get(key).map_err(map_redis_err)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let _: () = self.con.set(key, value).map_err(map_redis_err)?;
        Ok(())
    }

    fn del(&mut self, key: &str) -> StoreResult<bool> {
        let removed: i64 = self.con.del(key).map_err(map_redis_err)?;
        Ok(removed > 0)
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        self.con.exists(key).map_err(map_redis_err)
    }

    fn shutdown_server(&mut self) -> StoreResult<()> {
        // The server drops the connection while exiting, so an IO error
        // here means the command took effect.
        match redis::cmd("SHUTDOWN").arg("SAVE").query::<()>(&mut self.con) {
            Ok(()) => Ok(()),
            Err(e) if e.is_io_error() || e.is_connection_dropped() => {
                debug!("server closed connection during shutdown");
                Ok(())
            }
            Err(e) => Err(map_redis_err(e)),
        }
    }
}

/// Map a client-library error into the workspace taxonomy.
fn map_redis_err(e: redis::RedisError) -> StoreError {
    use redis::ErrorKind;
    if e.is_timeout() {
        return StoreError::Timeout(e.to_string());
    }
    match e.kind() {
        ErrorKind::AuthenticationFailed => StoreError::Auth(e.to_string()),
        ErrorKind::IoError => StoreError::Connection(e.to_string()),
        _ => StoreError::Protocol(e.to_string()),
    }
}
