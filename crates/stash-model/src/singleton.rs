//! Per-type singleton registry.
//!
//! Guarantees at most one live instance per declared type. Repeated
//! `get_or_create` calls return the same shared reference, merging any
//! newly supplied fields into the existing instance in place. Entries
//! leave the table only through an explicit [`Registry::reset`].

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::debug;

/// A type with exactly one live instance per registry.
///
/// `Patch` carries the "newly supplied fields" of a construction call:
/// every populated patch field overwrites the corresponding attribute,
/// unpopulated fields leave the current value untouched.
pub trait Singleton: Default + Send + 'static {
    type Patch: Default;

    /// Merge a patch into this instance in place.
    fn apply(&mut self, patch: Self::Patch);
}

/// Instance table mapping type identity to its one live object.
#[derive(Default)]
pub struct Registry {
    instances: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the instance for `T`, creating it from defaults if none
    /// exists, and merge `patch` into it. The returned `Arc` is the
    /// same across calls: object identity is preserved.
    pub fn get_or_create<T: Singleton>(&self, patch: T::Patch) -> Arc<Mutex<T>> {
        let instance = {
            let mut instances = self.instances.lock().unwrap();
            let entry = instances.entry(TypeId::of::<T>()).or_insert_with(|| {
                debug!(ty = type_name::<T>(), "created new singleton instance");
                Arc::new(Mutex::new(T::default())) as Arc<dyn Any + Send + Sync>
            });
            Arc::clone(entry)
        };
        // Entries are only ever inserted under their own TypeId.
        let instance = instance
            .downcast::<Mutex<T>>()
            .expect("registry entry type matches its key");
        instance.lock().unwrap().apply(patch);
        instance
    }

    /// The instance for `T` if one has been created.
    pub fn get<T: Singleton>(&self) -> Option<Arc<Mutex<T>>> {
        let instances = self.instances.lock().unwrap();
        instances
            .get(&TypeId::of::<T>())
            .map(Arc::clone)
            .map(|arc| arc.downcast::<Mutex<T>>().expect("registry entry type matches its key"))
    }

    /// Remove the recorded instance for `T`. Returns whether one was
    /// removed.
    pub fn reset<T: Singleton>(&self) -> bool {
        let removed = self
            .instances
            .lock()
            .unwrap()
            .remove(&TypeId::of::<T>())
            .is_some();
        if removed {
            debug!(ty = type_name::<T>(), "reset singleton instance");
        }
        removed
    }
}

/// The process-wide default registry.
pub fn global() -> &'static Registry {
    static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);
    &GLOBAL
}
