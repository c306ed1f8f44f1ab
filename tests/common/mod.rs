//! Common test utilities for wrapdb-rs integration tests.
//!
//! # Scripted delegates
//!
//! The tests drive the adapter against an in-memory delegate whose behaviour
//! is controlled by a [`Script`]:
//!
//! | Setting | Effect |
//! |---------|--------|
//! | `driver` / `conn` / `stmt` | capabilities the delegate advertises |
//! | `num_input` | placeholder count reported by statements |
//! | `fail(op, message)` | operation `op` returns a [`ScriptedError`] |
//! | `skip(op)` | operation `op` returns `DriverError::Skip` |
//!
//! Every delegate call is appended to the script's journal, so tests can
//! assert which strategy a caller picked.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use wrapdb_rs::context::Context;
use wrapdb_rs::driver::{
    ColumnConverter, Conn, ConnBeginTx, ConnCapabilities, ConnPrepareContext, Connector, Driver,
    DriverCapabilities, DriverContext, ExecResult, Execer, ExecerContext, NamedValue,
    NamedValueChecker, Queryer, QueryerContext, Rows, Stmt, StmtCapabilities, StmtExecContext,
    StmtQueryContext, Tx, TxOptions, Value, ValueConverter,
};
use wrapdb_rs::error::{DriverError, DriverResult};

// ============================================================================
// Constants
// ============================================================================

/// Id reported by every `ExecResult` the delegate returns.
pub const LAST_INSERT_ID: i64 = 42;

/// Columns of every result the delegate returns.
pub const COLUMNS: [&str; 2] = ["id", "name"];

// ============================================================================
// Script
// ============================================================================

/// Error returned by a scripted failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ScriptedError {
    pub operation: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
enum Outcome {
    Fail(String),
    Skip,
}

/// Behaviour of a scripted delegate. Clones share the journal and failures.
#[derive(Clone, Default)]
pub struct Script {
    pub driver: DriverCapabilities,
    pub conn: ConnCapabilities,
    pub stmt: StmtCapabilities,
    pub num_input: Option<usize>,
    outcomes: Arc<Mutex<HashMap<&'static str, Outcome>>>,
    journal: Arc<Mutex<Vec<&'static str>>>,
    last_args: Arc<Mutex<Vec<Value>>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_driver(mut self, driver: DriverCapabilities) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_conn(mut self, conn: ConnCapabilities) -> Self {
        self.conn = conn;
        self
    }

    pub fn with_stmt(mut self, stmt: StmtCapabilities) -> Self {
        self.stmt = stmt;
        self
    }

    pub fn with_num_input(mut self, num_input: usize) -> Self {
        self.num_input = Some(num_input);
        self
    }

    /// Make `operation` fail with `message`.
    pub fn fail(self, operation: &'static str, message: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(operation, Outcome::Fail(message.to_string()));
        self
    }

    /// Make `operation` answer `DriverError::Skip`.
    pub fn skip(self, operation: &'static str) -> Self {
        self.outcomes.lock().unwrap().insert(operation, Outcome::Skip);
        self
    }

    /// Delegate operations called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.journal.lock().unwrap().clone()
    }

    /// Arguments of the last exec or query call.
    pub fn last_args(&self) -> Vec<Value> {
        self.last_args.lock().unwrap().clone()
    }

    /// A driver running this script.
    pub fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(ScriptedDriver {
            script: self.clone(),
        })
    }

    /// A connection running this script.
    pub fn conn(&self) -> Box<dyn Conn> {
        Box::new(ScriptedConn {
            script: self.clone(),
        })
    }

    /// A statement running this script.
    pub fn stmt(&self) -> Box<dyn Stmt> {
        Box::new(ScriptedStmt {
            script: self.clone(),
        })
    }

    fn call(&self, operation: &'static str) -> DriverResult<()> {
        self.journal.lock().unwrap().push(operation);
        match self.outcomes.lock().unwrap().get(operation) {
            Some(Outcome::Fail(message)) => Err(ScriptedError {
                operation,
                message: message.clone(),
            }
            .into()),
            Some(Outcome::Skip) => Err(DriverError::Skip.into()),
            None => Ok(()),
        }
    }

    fn record_args(&self, args: Vec<Value>) {
        *self.last_args.lock().unwrap() = args;
    }

    fn result(&self, args: usize) -> Box<dyn ExecResult> {
        Box::new(ScriptedResult {
            rows_affected: args as i64,
        })
    }

    fn rows(&self) -> Box<dyn Rows> {
        Box::new(ScriptedRows {
            script: self.clone(),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            remaining: vec![
                vec![Value::Int64(2), Value::from("bob")],
                vec![Value::Int64(1), Value::from("alice")],
            ],
        })
    }
}

/// Every capability combination of a connection.
pub fn all_conn_capabilities() -> Vec<ConnCapabilities> {
    (0u8..64)
        .map(|bits| ConnCapabilities {
            prepare_context: bits & 1 != 0,
            begin_tx: bits & 2 != 0,
            execer: bits & 4 != 0,
            execer_context: bits & 8 != 0,
            queryer: bits & 16 != 0,
            queryer_context: bits & 32 != 0,
        })
        .collect()
}

/// Every capability combination of a statement.
pub fn all_stmt_capabilities() -> Vec<StmtCapabilities> {
    (0u8..16)
        .map(|bits| StmtCapabilities {
            column_converter: bits & 1 != 0,
            named_value_checker: bits & 2 != 0,
            exec_context: bits & 4 != 0,
            query_context: bits & 8 != 0,
        })
        .collect()
}

// ============================================================================
// Driver
// ============================================================================

pub struct ScriptedDriver {
    script: Script,
}

#[async_trait]
impl Driver for ScriptedDriver {
    async fn open(&self, _name: &str) -> DriverResult<Box<dyn Conn>> {
        self.script.call("open")?;
        Ok(self.script.conn())
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.script.driver.driver_context {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl DriverContext for ScriptedDriver {
    async fn open_connector(&self, _name: &str) -> DriverResult<Arc<dyn Connector>> {
        self.script.call("open_connector")?;
        Ok(Arc::new(ScriptedConnector {
            script: self.script.clone(),
        }))
    }
}

pub struct ScriptedConnector {
    script: Script,
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        self.script.call("connect")?;
        Ok(self.script.conn())
    }

    fn driver(&self) -> Arc<dyn Driver> {
        self.script.driver()
    }
}

// ============================================================================
// Connection
// ============================================================================

pub struct ScriptedConn {
    script: Script,
}

#[async_trait]
impl Conn for ScriptedConn {
    async fn prepare(&mut self, _query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.script.call("prepare")?;
        Ok(self.script.stmt())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.script.call("close")
    }

    async fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        self.script.call("begin")?;
        Ok(Box::new(ScriptedTx {
            script: self.script.clone(),
        }))
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.script.conn.prepare_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.script.conn.begin_tx {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.script.conn.execer {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.script.conn.execer_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.script.conn.queryer {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.script.conn.queryer_context {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ConnPrepareContext for ScriptedConn {
    async fn prepare_context(&mut self, _ctx: &Context, _query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.script.call("prepare_context")?;
        Ok(self.script.stmt())
    }
}

#[async_trait]
impl ConnBeginTx for ScriptedConn {
    async fn begin_tx(&mut self, _ctx: &Context, _opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        self.script.call("begin_tx")?;
        Ok(Box::new(ScriptedTx {
            script: self.script.clone(),
        }))
    }
}

#[async_trait]
impl Execer for ScriptedConn {
    async fn exec(&mut self, _query: &str, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        self.script.call("exec")?;
        self.script.record_args(args.to_vec());
        Ok(self.script.result(args.len()))
    }
}

#[async_trait]
impl ExecerContext for ScriptedConn {
    async fn exec_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        self.script.call("exec_context")?;
        self.script.record_args(NamedValue::into_values(args.to_vec()));
        Ok(self.script.result(args.len()))
    }
}

#[async_trait]
impl Queryer for ScriptedConn {
    async fn query(&mut self, _query: &str, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        self.script.call("query")?;
        self.script.record_args(args.to_vec());
        Ok(self.script.rows())
    }
}

#[async_trait]
impl QueryerContext for ScriptedConn {
    async fn query_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        self.script.call("query_context")?;
        self.script.record_args(NamedValue::into_values(args.to_vec()));
        Ok(self.script.rows())
    }
}

// ============================================================================
// Statement
// ============================================================================

/// Multiplies integers by ten.
pub struct TimesTen;

impl ValueConverter for TimesTen {
    fn convert_value(&self, value: Value) -> DriverResult<Value> {
        match value {
            Value::Int64(i) => Ok(Value::Int64(i * 10)),
            other => Ok(other),
        }
    }
}

pub struct ScriptedStmt {
    script: Script,
}

#[async_trait]
impl Stmt for ScriptedStmt {
    async fn close(&mut self) -> DriverResult<()> {
        self.script.call("stmt_close")
    }

    fn num_input(&self) -> Option<usize> {
        self.script.num_input
    }

    async fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        self.script.call("stmt_exec")?;
        self.script.record_args(args.to_vec());
        Ok(self.script.result(args.len()))
    }

    async fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        self.script.call("stmt_query")?;
        self.script.record_args(args.to_vec());
        Ok(self.script.rows())
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        if self.script.stmt.column_converter {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        if self.script.stmt.named_value_checker {
            Some(self)
        } else {
            None
        }
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.script.stmt.exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.script.stmt.query_context {
            Some(self)
        } else {
            None
        }
    }
}

impl ColumnConverter for ScriptedStmt {
    fn column_converter(&self, _index: usize) -> &dyn ValueConverter {
        &TimesTen
    }
}

impl NamedValueChecker for ScriptedStmt {
    // Text is accepted, NULL is removed, anything else goes to the converter.
    fn check_named_value(&self, value: &mut NamedValue) -> DriverResult<()> {
        self.script.call("check_named_value")?;
        match value.value {
            Value::Text(_) => Ok(()),
            Value::Null => Err(DriverError::RemoveArgument.into()),
            _ => Err(DriverError::Skip.into()),
        }
    }
}

#[async_trait]
impl StmtExecContext for ScriptedStmt {
    async fn exec_context(
        &mut self,
        _ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        self.script.call("stmt_exec_context")?;
        self.script.record_args(NamedValue::into_values(args.to_vec()));
        Ok(self.script.result(args.len()))
    }
}

#[async_trait]
impl StmtQueryContext for ScriptedStmt {
    async fn query_context(
        &mut self,
        _ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        self.script.call("stmt_query_context")?;
        self.script.record_args(NamedValue::into_values(args.to_vec()));
        Ok(self.script.rows())
    }
}

// ============================================================================
// Results
// ============================================================================

pub struct ScriptedTx {
    script: Script,
}

#[async_trait]
impl Tx for ScriptedTx {
    async fn commit(&mut self) -> DriverResult<()> {
        self.script.call("commit")
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        self.script.call("rollback")
    }
}

pub struct ScriptedResult {
    rows_affected: i64,
}

impl ExecResult for ScriptedResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        Ok(LAST_INSERT_ID)
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        Ok(self.rows_affected)
    }
}

pub struct ScriptedRows {
    script: Script,
    columns: Vec<String>,
    remaining: Vec<Vec<Value>>,
}

#[async_trait]
impl Rows for ScriptedRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next(&mut self, dest: &mut [Value]) -> DriverResult<bool> {
        self.script.call("rows_next")?;
        match self.remaining.pop() {
            Some(row) => {
                for (slot, value) in dest.iter_mut().zip(row) {
                    *slot = value;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.script.call("rows_close")
    }
}
