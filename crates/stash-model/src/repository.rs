//! Store-backed persistence for singleton records.
//!
//! Each record type is stored as one JSON document under the key
//! `"{prefix}:{record-name}"`. Store failures are absorbed into
//! boolean/`None` results with logging; nothing operational is raised
//! past this boundary.
//!
//! Reentrancy is guarded by an explicit per-type state machine: `load`
//! and `save` transition `Idle -> Loading`/`Saving` on entry through a
//! scoped guard that restores `Idle` on drop, so a reentrant call
//! observes the in-flight state and short-circuits instead of recursing.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, error, info, warn};

use stash_core::StoreClient;

use crate::record::Persisted;

/// Default key namespace.
pub const DEFAULT_PREFIX: &str = "stash";

/// Per-type persistence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistState {
    Idle,
    Loading,
    Saving,
}

/// Tracks the in-flight persistence state for every record type.
#[derive(Default)]
struct Gate {
    states: Mutex<HashMap<TypeId, PersistState>>,
}

impl Gate {
    /// Transition `type_id` out of `Idle`, or report the state that
    /// blocked the transition.
    fn enter(&self, type_id: TypeId, state: PersistState) -> Result<GateGuard<'_>, PersistState> {
        let mut states = self.states.lock().unwrap();
        match states.get(&type_id).copied().unwrap_or(PersistState::Idle) {
            PersistState::Idle => {
                states.insert(type_id, state);
                Ok(GateGuard {
                    gate: self,
                    type_id,
                })
            }
            busy => Err(busy),
        }
    }
}

/// Restores `Idle` when the load/save scope ends, on every exit path.
struct GateGuard<'a> {
    gate: &'a Gate,
    type_id: TypeId,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate
            .states
            .lock()
            .unwrap()
            .insert(self.type_id, PersistState::Idle);
    }
}

/// Persistence repository over any [`StoreClient`].
pub struct Repository {
    prefix: String,
    gate: Gate,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Repository {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            gate: Gate::default(),
        }
    }

    /// Storage key for `T`; a pure function of the type.
    pub fn key_for<T: Persisted>(&self) -> String {
        format!("{}:{}", self.prefix, T::RECORD_NAME)
    }

    /// Serialize `record` and write it under its derived key,
    /// refreshing `updated_at` first. Store failures are logged and
    /// reported as `false`.
    pub fn save<T, S>(&self, store: &mut S, record: &mut T) -> bool
    where
        T: Persisted,
        S: StoreClient + ?Sized,
    {
        let _guard = match self.gate.enter(TypeId::of::<T>(), PersistState::Saving) {
            Ok(guard) => guard,
            Err(busy) => {
                warn!(record = T::RECORD_NAME, state = ?busy, "save short-circuited, persistence in flight");
                return false;
            }
        };

        record.meta_mut().touch();
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to serialize record");
                return false;
            }
        };

        let key = self.key_for::<T>();
        match store.set(&key, &payload) {
            Ok(()) => {
                info!(record = T::RECORD_NAME, %key, "record saved");
                true
            }
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to save record");
                false
            }
        }
    }

    /// Fetch and deserialize the record for `T`, or `None` if it does
    /// not exist, the payload is missing, or it fails to parse. No
    /// fetch is issued when the existence check reports false.
    pub fn load<T, S>(&self, store: &mut S) -> Option<T>
    where
        T: Persisted,
        S: StoreClient + ?Sized,
    {
        let _guard = match self.gate.enter(TypeId::of::<T>(), PersistState::Loading) {
            Ok(guard) => guard,
            Err(busy) => {
                warn!(record = T::RECORD_NAME, state = ?busy, "load short-circuited, persistence in flight");
                return None;
            }
        };

        let key = self.key_for::<T>();
        match store.exists(&key) {
            Ok(true) => {}
            Ok(false) => {
                debug!(record = T::RECORD_NAME, "record not found in store");
                return None;
            }
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to check record existence");
                return None;
            }
        }

        let payload = match store.get(&key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(record = T::RECORD_NAME, "no data for record");
                return None;
            }
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to fetch record");
                return None;
            }
        };

        match serde_json::from_str::<T>(&payload) {
            Ok(record) => {
                info!(record = T::RECORD_NAME, "record loaded");
                Some(record)
            }
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to deserialize record");
                None
            }
        }
    }

    /// Delete the record for `T`. Store failures are logged as `false`.
    pub fn delete<T, S>(&self, store: &mut S) -> bool
    where
        T: Persisted,
        S: StoreClient + ?Sized,
    {
        let key = self.key_for::<T>();
        match store.del(&key) {
            Ok(existed) => {
                info!(record = T::RECORD_NAME, existed, "record deleted");
                true
            }
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to delete record");
                false
            }
        }
    }

    /// Whether a record for `T` exists. Store failures are logged as
    /// `false`.
    pub fn exists<T, S>(&self, store: &mut S) -> bool
    where
        T: Persisted,
        S: StoreClient + ?Sized,
    {
        let key = self.key_for::<T>();
        match store.exists(&key) {
            Ok(exists) => exists,
            Err(e) => {
                error!(record = T::RECORD_NAME, error = %e, "failed to check record existence");
                false
            }
        }
    }
}
