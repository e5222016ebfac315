//! stash-core — shared foundation for the stash workspace.
//!
//! Holds the pieces every other crate needs: the environment-driven
//! [`StoreConfig`], the [`StoreError`] taxonomy, the [`StoreClient`]
//! trait seam over the key-value store, and data-directory resolution.

pub mod client;
pub mod config;
pub mod error;
pub mod paths;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
