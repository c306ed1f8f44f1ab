//! # wrapdb-rs
//!
//! A pass-through database driver adapter that attaches stack context to
//! delegate errors.
//!
//! The adapter wraps any driver implementing the [`driver`] contract. Every
//! call is forwarded unchanged; the only difference a caller observes is that
//! errors come back as [`StackError`]s carrying the backtrace and source
//! location of the point where they crossed the adapter. The optional
//! capabilities of the delegate are mirrored exactly, so a generic caller such
//! as the [`sql`] layer negotiates with the adapter as it would with the
//! delegate.
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use wrapdb_rs::driver::Driver;
//! use wrapdb_rs::context::Context;
//! use wrapdb_rs::registry::Registry;
//! use wrapdb_rs::sql::Database;
//! use wrapdb_rs::wrapper::{self, WrapOptions};
//!
//! # async fn example(postgres: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let registry = Registry::new();
//! wrapper::register(&registry, "postgres-wrapper", postgres, WrapOptions::default())?;
//!
//! // Open the database through the adapter
//! let database = Database::open(&registry, "postgres-wrapper", "host=localhost").await?;
//! let mut connection = database.connect(&Context::background()).await?;
//!
//! if let Err(err) = connection.exec(&Context::background(), "DELETE FROM jobs", &[]).await {
//!     // Alternate formatting includes the stack trace
//!     eprintln!("{:#}", err);
//! }
//!
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod context;
pub mod driver;
pub mod error;
pub mod registry;
pub mod sql;
pub mod wrapper;

#[cfg(test)]
mod testing;

// Re-export public API
pub use context::{CancelHandle, Context};
pub use error::{BoxError, ContextError, DriverError, DriverResult, RegistryError, StackError};
pub use registry::Registry;
pub use wrapper::{BacktraceMode, WrapConn, WrapConnector, WrapDriver, WrapOptions, WrapStmt};
