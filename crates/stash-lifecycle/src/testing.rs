//! Counting test doubles for the client, connector, spawner, and
//! process seams. Shared state lives behind `Arc` so tests can inspect
//! call counts after handing ownership to the manager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stash_core::{StoreClient, StoreError, StoreResult};

use crate::locator::ConnectionParams;
use crate::process::{ServerCommand, ServerProcess, Spawn};
use crate::redis_client::Connect;

/// In-memory client that counts every operation.
#[derive(Default)]
pub(crate) struct CountingClient {
    pub data: Mutex<HashMap<String, String>>,
    pub pings: Arc<AtomicUsize>,
    pub gets: Arc<AtomicUsize>,
    pub sets: Arc<AtomicUsize>,
    pub shutdowns: Arc<AtomicUsize>,
    /// When set, `shutdown_server` reports a connection error.
    pub shutdown_fails: bool,
}

impl StoreClient for CountingClient {
    fn ping(&mut self) -> StoreResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn del(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.data.lock().unwrap().remove(key).is_some())
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.data.lock().unwrap().contains_key(key))
    }

    fn shutdown_server(&mut self) -> StoreResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.shutdown_fails {
            Err(StoreError::Connection("shutdown refused".into()))
        } else {
            Ok(())
        }
    }
}

/// Connector that hands out [`CountingClient`]s and records each call.
#[derive(Default)]
pub(crate) struct RecordingConnector {
    pub calls: Arc<AtomicUsize>,
}

impl Connect for RecordingConnector {
    fn connect(
        &self,
        _params: &ConnectionParams,
        _connect_timeout: Option<Duration>,
    ) -> StoreResult<Box<dyn StoreClient + Send>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingClient::default()))
    }
}

/// Connector that always reports a connectivity failure.
pub(crate) struct FailingConnector;

impl Connect for FailingConnector {
    fn connect(
        &self,
        _params: &ConnectionParams,
        _connect_timeout: Option<Duration>,
    ) -> StoreResult<Box<dyn StoreClient + Send>> {
        Err(StoreError::Connection("connection refused".into()))
    }
}

/// Connector that fails with an authentication error, proving a server
/// is listening.
pub(crate) struct AuthFailConnector;

impl Connect for AuthFailConnector {
    fn connect(
        &self,
        _params: &ConnectionParams,
        _connect_timeout: Option<Duration>,
    ) -> StoreResult<Box<dyn StoreClient + Send>> {
        Err(StoreError::Auth("NOAUTH authentication required".into()))
    }
}

/// Observable state of a [`MockProcess`], shared with the test.
#[derive(Default)]
pub(crate) struct ProcessProbe {
    pub running: AtomicBool,
    pub terminate_calls: AtomicUsize,
    pub kill_calls: AtomicUsize,
    /// Whether a terminate signal stops the process.
    pub dies_on_terminate: AtomicBool,
}

impl ProcessProbe {
    pub fn alive(dies_on_terminate: bool) -> Arc<Self> {
        let probe = Self::default();
        probe.running.store(true, Ordering::SeqCst);
        probe
            .dies_on_terminate
            .store(dies_on_terminate, Ordering::SeqCst);
        Arc::new(probe)
    }

    pub fn exited() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Scriptable server process handle.
pub(crate) struct MockProcess {
    pub probe: Arc<ProcessProbe>,
    pub stderr: String,
}

impl MockProcess {
    pub fn new(probe: Arc<ProcessProbe>) -> Self {
        Self {
            probe,
            stderr: String::new(),
        }
    }
}

impl ServerProcess for MockProcess {
    fn id(&self) -> u32 {
        4242
    }

    fn is_running(&mut self) -> bool {
        self.probe.running.load(Ordering::SeqCst)
    }

    fn terminate(&mut self) -> StoreResult<()> {
        self.probe.terminate_calls.fetch_add(1, Ordering::SeqCst);
        if self.probe.dies_on_terminate.load(Ordering::SeqCst) {
            self.probe.running.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    fn kill(&mut self) -> StoreResult<()> {
        self.probe.kill_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn captured_output(&mut self) -> (String, String) {
        (String::new(), self.stderr.clone())
    }
}

/// Spawner returning a [`MockProcess`] wired to a shared probe.
pub(crate) struct MockSpawner {
    pub calls: Arc<AtomicUsize>,
    pub probe: Arc<ProcessProbe>,
    /// When set, `spawn` reports an IO failure (binary missing).
    pub fail: bool,
}

impl MockSpawner {
    pub fn new(probe: Arc<ProcessProbe>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            probe,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        let mut spawner = Self::new(ProcessProbe::exited());
        spawner.fail = true;
        spawner
    }
}

impl Spawn for MockSpawner {
    fn spawn(&self, _cmd: &ServerCommand) -> StoreResult<Box<dyn ServerProcess>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Io("no such file or directory".into()));
        }
        let mut process = MockProcess::new(Arc::clone(&self.probe));
        process.stderr = "bind: address already in use".to_string();
        Ok(Box::new(process))
    }
}
