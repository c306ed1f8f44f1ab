//! The decorating driver adapter.
//!
//! Every type in this module wraps exactly one delegate implementing the
//! [`driver`](crate::driver) contract and forwards each call to it unchanged.
//! The only thing the adapter touches is the error value: any `Err` coming
//! back from the delegate is wrapped in a [`StackError`](crate::error::StackError)
//! carrying the backtrace of the point where it crossed the adapter.
//!
//! Optional capabilities are probed once when a delegate is wrapped. An
//! adapter advertises exactly the capabilities its delegate advertised, so a
//! generic caller negotiates with the adapter as it would with the delegate.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wrapdb_rs::driver::Driver;
//! use wrapdb_rs::registry::Registry;
//! use wrapdb_rs::wrapper::{self, WrapOptions};
//!
//! # fn example(postgres: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! registry.register("postgres", postgres)?;
//!
//! // Callers opt in by asking for "postgres-wrapper" instead of "postgres".
//! wrapper::register_wrapped(&registry, "postgres", "postgres-wrapper", WrapOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod driver;
pub mod options;
pub mod statement;

pub use connection::WrapConn;
pub use driver::{WrapConnector, WrapDriver};
pub use options::{BacktraceMode, WrapOptions};
pub use statement::WrapStmt;

use crate::driver::Driver;
use crate::error::{BoxError, DriverError, RegistryError};
use crate::registry::Registry;
use std::sync::Arc;

/// Wrap `delegate` and register the adapter under `name`.
///
/// # Errors
///
/// Returns `RegistryError` if `name` is empty or already registered.
pub fn register(
    registry: &Registry,
    name: &str,
    delegate: Arc<dyn Driver>,
    options: WrapOptions,
) -> Result<Arc<WrapDriver>, RegistryError> {
    let driver = Arc::new(WrapDriver::with_options(delegate, options));
    registry.register(name, Arc::clone(&driver) as Arc<dyn Driver>)?;
    Ok(driver)
}

/// Register an adapter around the driver already registered as `base`.
///
/// # Errors
///
/// Returns `RegistryError::UnknownDriver` if `base` is not registered, and
/// `RegistryError::Duplicate` if `name` is taken (including `name == base`).
pub fn register_wrapped(
    registry: &Registry,
    base: &str,
    name: &str,
    options: WrapOptions,
) -> Result<Arc<WrapDriver>, RegistryError> {
    let delegate = registry.require(base)?;
    register(registry, name, delegate, options)
}

/// Error for a capability the delegate advertised at wrap time but no longer offers.
fn withdrawn(capability: &'static str) -> BoxError {
    Box::new(DriverError::CapabilityWithdrawn { capability })
}
