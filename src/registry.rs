//! Name to driver registry.
//!
//! A [`Registry`] maps driver names to driver instances. Callers pick a
//! driver by name, which is how an adapter is opted into: register it under
//! its own name next to the driver it wraps.
//!
//! Registries are plain values so tests can build their own. A process-wide
//! instance is available through [`Registry::global`].

use crate::driver::Driver;
use crate::error::RegistryError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Registry of named drivers.
///
/// Registration never overwrites: a name can be registered once per registry.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use wrapdb_rs::driver::Driver;
/// use wrapdb_rs::registry::Registry;
///
/// # fn example(postgres: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Registry::new();
/// registry.register("postgres", Arc::clone(&postgres))?;
/// assert!(registry.register("postgres", postgres).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Registry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Register `driver` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyName` for an empty name and
    /// `RegistryError::Duplicate` if the name is already taken.
    pub fn register(&self, name: &str, driver: Arc<dyn Driver>) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        if drivers.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        drivers.insert(name.to_string(), driver);

        tracing::debug!(target: "wrapdb::registry", driver = name, "registered driver");
        Ok(())
    }

    /// Look up a driver by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Look up a driver by name, failing for unknown names.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownDriver` if nothing is registered under `name`.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Driver>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownDriver(name.to_string()))
    }

    /// Check if a driver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Sorted names of all registered drivers.
    pub fn drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("drivers", &self.drivers())
            .finish()
    }
}
