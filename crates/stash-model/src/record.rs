//! Persisted-record metadata and the [`Persisted`] trait.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Timestamps carried by every persisted record, serialized as
/// ISO-8601 strings. `created_at` is set once at construction and never
/// rewritten; `updated_at` is refreshed immediately before every save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at` to the current instant.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::now()
    }
}

/// A record the [`Repository`](crate::Repository) can persist as one
/// JSON document under a deterministic per-type key.
pub trait Persisted: Serialize + DeserializeOwned + Send + 'static {
    /// Type name used in the storage key; independent of instance
    /// state.
    const RECORD_NAME: &'static str;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;
}
