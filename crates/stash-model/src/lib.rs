//! stash-model — singleton registry and store-backed persistence.
//!
//! Domain records live in a per-type [`Registry`] guaranteeing one
//! in-memory instance per type, and persist through the [`Repository`]
//! as JSON documents keyed by type name. The two are independent of
//! process supervision; they only share the [`stash_core::StoreClient`]
//! handle at save/load time.

pub mod credentials;
pub mod record;
pub mod repository;
pub mod singleton;

pub use credentials::{Account, Credentials, MissingField};
pub use record::{Persisted, RecordMeta};
pub use repository::{DEFAULT_PREFIX, Repository};
pub use singleton::{Registry, Singleton, global};
