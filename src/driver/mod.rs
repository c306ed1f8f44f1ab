//! Driver plugin contract.
//!
//! This module defines the traits a database driver implements to plug into
//! the generic [`sql`](crate::sql) layer, and which the [`wrapper`](crate::wrapper)
//! adapter both consumes and implements.
//!
//! # Architecture
//!
//! The contract is organized into four main entities:
//! - [`Driver`] - opens connections from a connection string
//! - [`Connector`] - opens connections from a cancellable context
//! - [`Conn`] - one live connection, used by one caller at a time
//! - [`Stmt`] - a prepared statement bound to the connection that produced it
//!
//! Transactions ([`Tx`]), row cursors ([`Rows`]) and execution results
//! ([`ExecResult`]) are returned as opaque handles.
//!
//! # Optional capabilities
//!
//! Operations a driver may or may not support are separate traits. A driver
//! advertises one by overriding the matching `as_*` accessor, which returns
//! `None` by default:
//!
//! ```
//! use async_trait::async_trait;
//! use wrapdb_rs::driver::{Conn, ExecResult, Execer, Stmt, Tx, Value};
//! use wrapdb_rs::error::DriverResult;
//!
//! struct Session;
//!
//! #[async_trait]
//! impl Conn for Session {
//!     async fn prepare(&mut self, _query: &str) -> DriverResult<Box<dyn Stmt>> {
//!         Err("prepared statements are not supported".into())
//!     }
//!     async fn close(&mut self) -> DriverResult<()> {
//!         Ok(())
//!     }
//!     async fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
//!         Err("transactions are not supported".into())
//!     }
//!     fn as_execer(&mut self) -> Option<&mut dyn Execer> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl Execer for Session {
//!     async fn exec(&mut self, _query: &str, _args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
//!         Err("read-only session".into())
//!     }
//! }
//! ```

pub mod capability;
pub mod value;

pub use capability::{ConnCapabilities, DriverCapabilities, StmtCapabilities};
pub use value::{IsolationLevel, NamedValue, TxOptions, Value};

use crate::context::Context;
use crate::error::DriverResult;
use async_trait::async_trait;
use std::sync::Arc;

/// A database driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a new connection using a driver-specific connection string.
    async fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>>;

    /// Optional: open connectors instead of parsing the name per connection.
    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        None
    }
}

/// Optional driver capability: parse a connection string once into a [`Connector`].
#[async_trait]
pub trait DriverContext: Send + Sync {
    /// Create a connector for the given connection string.
    async fn open_connector(&self, name: &str) -> DriverResult<Arc<dyn Connector>>;
}

/// A fixed connection configuration able to produce connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection, honouring cancellation of `ctx`.
    async fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>>;

    /// The driver this connector belongs to.
    fn driver(&self) -> Arc<dyn Driver>;
}

/// A live connection, used by one caller at a time.
#[async_trait]
pub trait Conn: Send {
    /// Prepare a statement bound to this connection.
    async fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>>;

    /// Close the connection.
    async fn close(&mut self) -> DriverResult<()>;

    /// Start a transaction with default options.
    async fn begin(&mut self) -> DriverResult<Box<dyn Tx>>;

    /// Optional: context-aware prepare.
    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        None
    }

    /// Optional: context-aware begin with transaction options.
    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        None
    }

    /// Optional: execute without preparing.
    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        None
    }

    /// Optional: context-aware execute without preparing.
    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        None
    }

    /// Optional: query without preparing.
    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        None
    }

    /// Optional: context-aware query without preparing.
    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        None
    }
}

/// Optional connection capability: context-aware prepare.
#[async_trait]
pub trait ConnPrepareContext: Send {
    async fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>>;
}

/// Optional connection capability: context-aware begin with options.
#[async_trait]
pub trait ConnBeginTx: Send {
    async fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>>;
}

/// Optional connection capability: execute a statement directly.
///
/// May return [`DriverError::Skip`](crate::error::DriverError::Skip) to make
/// the caller fall back to prepare and execute.
#[async_trait]
pub trait Execer: Send {
    async fn exec(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn ExecResult>>;
}

/// Optional connection capability: context-aware direct execute.
#[async_trait]
pub trait ExecerContext: Send {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>>;
}

/// Optional connection capability: run a query directly.
#[async_trait]
pub trait Queryer: Send {
    async fn query(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn Rows>>;
}

/// Optional connection capability: context-aware direct query.
#[async_trait]
pub trait QueryerContext: Send {
    async fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>>;
}

/// A prepared statement.
#[async_trait]
pub trait Stmt: Send {
    /// Close the statement.
    async fn close(&mut self) -> DriverResult<()>;

    /// Number of placeholders, or `None` if the driver does not know.
    fn num_input(&self) -> Option<usize>;

    /// Execute a statement that does not return rows.
    async fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>>;

    /// Execute a statement that returns rows.
    async fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>>;

    /// Optional: per-column argument conversion.
    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        None
    }

    /// Optional: driver-side argument checking.
    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        None
    }

    /// Optional: context-aware execute.
    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        None
    }

    /// Optional: context-aware query.
    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        None
    }
}

/// Optional statement capability: a converter per placeholder.
pub trait ColumnConverter {
    fn column_converter(&self, index: usize) -> &dyn ValueConverter;
}

/// Optional statement capability: check and convert arguments in place.
///
/// May return [`DriverError::Skip`](crate::error::DriverError::Skip) to fall
/// back to the default conversion, or
/// [`DriverError::RemoveArgument`](crate::error::DriverError::RemoveArgument)
/// to drop the argument.
pub trait NamedValueChecker {
    fn check_named_value(&self, value: &mut NamedValue) -> DriverResult<()>;
}

/// Optional statement capability: context-aware execute.
#[async_trait]
pub trait StmtExecContext: Send {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>>;
}

/// Optional statement capability: context-aware query.
#[async_trait]
pub trait StmtQueryContext: Send {
    async fn query_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>>;
}

/// Converts an argument into a value the driver accepts.
pub trait ValueConverter: Send + Sync {
    fn convert_value(&self, value: Value) -> DriverResult<Value>;
}

/// Converter used when a statement has no column converter of its own.
///
/// Every [`Value`] variant is already a valid driver value, so arguments pass
/// through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn convert_value(&self, value: Value) -> DriverResult<Value> {
        Ok(value)
    }
}

/// A transaction handle.
#[async_trait]
pub trait Tx: Send {
    async fn commit(&mut self) -> DriverResult<()>;
    async fn rollback(&mut self) -> DriverResult<()>;
}

/// Result of a statement that does not return rows.
pub trait ExecResult: Send + Sync {
    /// Id generated by the database for an inserted row.
    fn last_insert_id(&self) -> DriverResult<i64>;

    /// Number of rows changed by the statement.
    fn rows_affected(&self) -> DriverResult<i64>;
}

/// A cursor over query results.
#[async_trait]
pub trait Rows: Send {
    /// Column names of the result.
    fn columns(&self) -> &[String];

    /// Fill `dest` with the next row. Returns `false` once exhausted.
    ///
    /// `dest` has one slot per column.
    async fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool>;

    /// Close the cursor.
    async fn close(&mut self) -> DriverResult<()>;
}
