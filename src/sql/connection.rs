//! Connection handle.
//!
//! This module provides the `Connection` type which owns one driver
//! connection and picks, per call, the best operation the driver supports.

use crate::context::Context;
use crate::driver::{Conn, ConnCapabilities, ExecResult, NamedValue, Tx, TxOptions, Value};
use crate::error::{DriverError, DriverResult};
use crate::sql::{Rows, Statement};
use std::fmt;

/// A connection obtained from a [`Database`](crate::sql::Database).
///
/// Each operation negotiates with the driver connection:
///
/// | Operation | Tried in order |
/// |---|---|
/// | `exec` | `ExecerContext`, `Execer`, prepare + execute |
/// | `query` | `QueryerContext`, `Queryer`, prepare + query |
/// | `prepare` | `ConnPrepareContext`, `Conn::prepare` |
/// | `begin` | `ConnBeginTx`, `Conn::begin` |
///
/// A fast path answering [`DriverError::Skip`] falls through to the next
/// strategy. Strategies that cannot observe cancellation are only attempted
/// while the context is live.
pub struct Connection {
    inner: Box<dyn Conn>,
}

impl Connection {
    /// Wrap a driver connection.
    pub fn new(inner: Box<dyn Conn>) -> Self {
        Self { inner }
    }

    /// Optional capabilities of the driver connection.
    pub fn capabilities(&mut self) -> ConnCapabilities {
        ConnCapabilities::probe(self.inner.as_mut())
    }

    /// Execute a statement that does not return rows.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or a `ContextError` if `ctx` is done
    /// before a cancellation-unaware strategy runs.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use wrapdb_rs::context::Context;
    /// # use wrapdb_rs::sql::Connection;
    /// # async fn example(connection: &mut Connection) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let result = connection
    ///     .exec(&Context::background(), "DELETE FROM users WHERE id = $1", &[1.into()])
    ///     .await?;
    /// println!("Deleted {} rows", result.rows_affected()?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn exec(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> DriverResult<Box<dyn ExecResult>> {
        if let Some(execer) = self.inner.as_execer_context() {
            let named = NamedValue::from_values(args);
            match execer.exec_context(ctx, query, &named).await {
                Err(err) if DriverError::is_skip(&*err) => {}
                other => return other,
            }
        } else if let Some(execer) = self.inner.as_execer() {
            check(ctx)?;
            match execer.exec(query, args).await {
                Err(err) if DriverError::is_skip(&*err) => {}
                other => return other,
            }
        }

        let mut stmt = self.prepare(ctx, query).await?;
        let result = stmt.exec(ctx, args).await;
        let closed = stmt.close().await;
        let result = result?;
        closed?;
        Ok(result)
    }

    /// Run a query and return its rows.
    ///
    /// When the query goes through a prepared statement, the statement is
    /// closed together with the rows.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or a `ContextError` if `ctx` is done
    /// before a cancellation-unaware strategy runs.
    pub async fn query(&mut self, ctx: &Context, query: &str, args: &[Value]) -> DriverResult<Rows> {
        if let Some(queryer) = self.inner.as_queryer_context() {
            let named = NamedValue::from_values(args);
            match queryer.query_context(ctx, query, &named).await {
                Err(err) if DriverError::is_skip(&*err) => {}
                other => return other.map(Rows::new),
            }
        } else if let Some(queryer) = self.inner.as_queryer() {
            check(ctx)?;
            match queryer.query(query, args).await {
                Err(err) if DriverError::is_skip(&*err) => {}
                other => return other.map(Rows::new),
            }
        }

        let mut stmt = self.prepare(ctx, query).await?;
        match stmt.query_raw(ctx, args).await {
            Ok(rows) => Ok(Rows::with_statement(rows, stmt)),
            Err(err) => {
                // The query error wins over a close error.
                let _ = stmt.close().await;
                Err(err)
            }
        }
    }

    /// Prepare a statement.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or a `ContextError` if `ctx` is done and
    /// the driver has no context-aware prepare.
    pub async fn prepare(&mut self, ctx: &Context, query: &str) -> DriverResult<Statement> {
        let stmt = match self.inner.as_prepare_context() {
            Some(conn) => conn.prepare_context(ctx, query).await?,
            None => {
                check(ctx)?;
                self.inner.prepare(query).await?
            }
        };
        Ok(Statement::new(stmt))
    }

    /// Start a transaction.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::UnsupportedTxOptions` for non-default options on
    /// a driver without `ConnBeginTx`, or the driver's error.
    pub async fn begin(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        if let Some(conn) = self.inner.as_begin_tx() {
            return conn.begin_tx(ctx, opts).await;
        }
        if !opts.is_default() {
            return Err(DriverError::UnsupportedTxOptions.into());
        }
        check(ctx)?;
        self.inner.begin().await
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's close error.
    pub async fn close(mut self) -> DriverResult<()> {
        self.inner.close().await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

fn check(ctx: &Context) -> DriverResult<()> {
    match ctx.err() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
