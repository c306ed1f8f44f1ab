//! Generic database API.
//!
//! This layer sits above the driver contract and performs the capability
//! negotiation a caller would otherwise repeat: it prefers context-aware
//! operations, falls back on [`DriverError::Skip`](crate::error::DriverError::Skip),
//! and converts arguments before they reach a statement.
//!
//! It talks to any [`Driver`](crate::driver::Driver), wrapped or not.

pub mod connection;
pub mod database;
pub mod statement;

pub use connection::Connection;
pub use database::Database;
pub use statement::{Rows, Statement};

use crate::error::DriverResult;
use crate::registry::Registry;

/// Open a database through the process-wide registry.
///
/// # Errors
///
/// Returns `RegistryError::UnknownDriver` for an unknown driver name, or the
/// driver's error if it fails to create a connector.
pub async fn open(driver_name: &str, dsn: &str) -> DriverResult<Database> {
    Database::open(Registry::global(), driver_name, dsn).await
}
