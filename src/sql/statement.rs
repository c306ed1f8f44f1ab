//! Prepared statements and result cursors.
//!
//! This module provides the `Statement` type, which converts caller
//! arguments into driver arguments before executing, and `Rows`, which
//! iterates over a query result.

use crate::context::Context;
use crate::driver::{
    self, ColumnConverter, DefaultConverter, ExecResult, NamedValue, Stmt, StmtCapabilities,
    Value, ValueConverter,
};
use crate::error::{DriverError, DriverResult};
use std::fmt;

/// A prepared statement.
///
/// Arguments go through the statement's `NamedValueChecker` first. A checker
/// answering [`DriverError::Skip`] hands the argument to the
/// `ColumnConverter` (or the identity conversion), and
/// [`DriverError::RemoveArgument`] drops it. The argument count is then
/// checked against [`Statement::num_input`] when the driver knows it.
pub struct Statement {
    inner: Box<dyn Stmt>,
}

impl Statement {
    /// Wrap a driver statement.
    pub fn new(inner: Box<dyn Stmt>) -> Self {
        Self { inner }
    }

    /// Number of placeholders, or `None` if the driver does not know.
    pub fn num_input(&self) -> Option<usize> {
        self.inner.num_input()
    }

    /// Optional capabilities of the driver statement.
    pub fn capabilities(&mut self) -> StmtCapabilities {
        StmtCapabilities::probe(self.inner.as_mut())
    }

    /// Execute the statement.
    ///
    /// # Errors
    ///
    /// Returns the argument conversion error, `DriverError::ArgumentCount`,
    /// or the driver's error.
    pub async fn exec(&mut self, ctx: &Context, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        let args = self.driver_args(args)?;

        match self.inner.as_exec_context() {
            Some(stmt) => stmt.exec_context(ctx, &args).await,
            None => {
                check(ctx)?;
                self.inner.exec(&NamedValue::into_values(args)).await
            }
        }
    }

    /// Run the statement as a query.
    ///
    /// The statement stays open; closing the returned rows does not close it.
    ///
    /// # Errors
    ///
    /// Returns the argument conversion error, `DriverError::ArgumentCount`,
    /// or the driver's error.
    pub async fn query(&mut self, ctx: &Context, args: &[Value]) -> DriverResult<Rows> {
        self.query_raw(ctx, args).await.map(Rows::new)
    }

    pub(crate) async fn query_raw(
        &mut self,
        ctx: &Context,
        args: &[Value],
    ) -> DriverResult<Box<dyn driver::Rows>> {
        let args = self.driver_args(args)?;

        match self.inner.as_query_context() {
            Some(stmt) => stmt.query_context(ctx, &args).await,
            None => {
                check(ctx)?;
                self.inner.query(&NamedValue::into_values(args)).await
            }
        }
    }

    /// Close the statement.
    ///
    /// # Errors
    ///
    /// Returns the driver's close error.
    pub async fn close(mut self) -> DriverResult<()> {
        self.inner.close().await
    }

    fn driver_args(&self, args: &[Value]) -> DriverResult<Vec<NamedValue>> {
        let checker = self.inner.as_named_value_checker();
        let converter = self.inner.as_column_converter();
        let want = self.inner.num_input();

        let mut converted = Vec::with_capacity(args.len());
        for mut arg in NamedValue::from_values(args) {
            if let Some(checker) = checker {
                match checker.check_named_value(&mut arg) {
                    Ok(()) => {
                        converted.push(arg);
                        continue;
                    }
                    Err(err) if DriverError::is_remove_argument(&*err) => continue,
                    Err(err) if DriverError::is_skip(&*err) => {}
                    Err(err) => return Err(err),
                }
            }

            arg.value = match converter {
                Some(converter) => column_convert(converter, want, &arg)?,
                None => DefaultConverter.convert_value(arg.value.clone())?,
            };
            converted.push(arg);
        }

        match want {
            Some(expected) if expected != converted.len() => Err(DriverError::ArgumentCount {
                expected,
                got: converted.len(),
            }
            .into()),
            _ => Ok(converted),
        }
    }
}

/// Convert through the placeholder's converter. Arguments past the known
/// placeholder count are left for the count check to reject.
fn column_convert(
    converter: &dyn ColumnConverter,
    want: Option<usize>,
    arg: &NamedValue,
) -> DriverResult<Value> {
    let index = arg
        .ordinal
        .checked_sub(1)
        .ok_or(DriverError::InvalidOrdinal {
            ordinal: arg.ordinal,
        })?;
    match want {
        Some(want) if index >= want => Ok(arg.value.clone()),
        _ => converter.column_converter(index).convert_value(arg.value.clone()),
    }
}

fn check(ctx: &Context) -> DriverResult<()> {
    match ctx.err() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("num_input", &self.inner.num_input())
            .finish_non_exhaustive()
    }
}

/// A cursor over query results.
///
/// The cursor closes itself once the last row has been read or the driver
/// reports an error. Rows produced by
/// [`Connection::query`](crate::sql::Connection::query) through a prepared
/// statement also close that statement.
///
/// Dropping an open cursor releases nothing on the driver side. Read it to
/// the end or call [`Rows::close`]; a dropped open cursor logs a warning.
pub struct Rows {
    inner: Box<dyn driver::Rows>,
    stmt: Option<Statement>,
    closed: bool,
}

impl Rows {
    pub(crate) fn new(inner: Box<dyn driver::Rows>) -> Self {
        Self {
            inner,
            stmt: None,
            closed: false,
        }
    }

    pub(crate) fn with_statement(inner: Box<dyn driver::Rows>, stmt: Statement) -> Self {
        Self {
            inner,
            stmt: Some(stmt),
            closed: false,
        }
    }

    /// Column names of the result.
    pub fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    /// Check whether the cursor is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read the next row, or `None` once the result is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the driver's error. The cursor is closed afterwards.
    pub async fn next_row(&mut self) -> DriverResult<Option<Vec<Value>>> {
        if self.closed {
            return Ok(None);
        }

        let mut row = vec![Value::Null; self.inner.columns().len()];
        match self.inner.next(&mut row).await {
            Ok(true) => Ok(Some(row)),
            Ok(false) => {
                self.close().await?;
                Ok(None)
            }
            Err(err) => {
                let _ = self.close().await;
                Err(err)
            }
        }
    }

    /// Read all remaining rows and close the cursor.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn fetch_all(mut self) -> DriverResult<Vec<Vec<Value>>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Close the cursor and the statement it owns. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first close error.
    pub async fn close(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let rows = self.inner.close().await;
        let stmt = match self.stmt.take() {
            Some(stmt) => stmt.close().await,
            None => Ok(()),
        };
        rows.and(stmt)
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                target: "wrapdb::sql",
                columns = self.inner.columns().len(),
                owns_statement = self.stmt.is_some(),
                "rows dropped without being closed"
            );
        }
    }
}

impl fmt::Debug for Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("columns", &self.inner.columns())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
