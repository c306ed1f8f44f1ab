//! Capability tables for optional driver operations.
//!
//! A table is computed once by probing a delegate's `as_*` accessors. The
//! adapter answers its own accessors from the table it computed at wrap time,
//! so it never advertises an operation its delegate lacks.

use crate::driver::{Conn, Driver, Stmt};
use serde::Serialize;
use std::fmt;

/// Optional capabilities of a [`Driver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverCapabilities {
    pub driver_context: bool,
}

impl DriverCapabilities {
    /// Probe a driver.
    pub fn probe(driver: &dyn Driver) -> Self {
        Self {
            driver_context: driver.as_driver_context().is_some(),
        }
    }

    /// Names of the supported capabilities.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.driver_context {
            names.push("driver_context");
        }
        names
    }
}

/// Optional capabilities of a [`Conn`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnCapabilities {
    pub prepare_context: bool,
    pub begin_tx: bool,
    pub execer: bool,
    pub execer_context: bool,
    pub queryer: bool,
    pub queryer_context: bool,
}

impl ConnCapabilities {
    /// Probe a connection.
    pub fn probe(conn: &mut dyn Conn) -> Self {
        Self {
            prepare_context: conn.as_prepare_context().is_some(),
            begin_tx: conn.as_begin_tx().is_some(),
            execer: conn.as_execer().is_some(),
            execer_context: conn.as_execer_context().is_some(),
            queryer: conn.as_queryer().is_some(),
            queryer_context: conn.as_queryer_context().is_some(),
        }
    }

    /// Names of the supported capabilities.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.prepare_context, "prepare_context"),
            (self.begin_tx, "begin_tx"),
            (self.execer, "execer"),
            (self.execer_context, "execer_context"),
            (self.queryer, "queryer"),
            (self.queryer_context, "queryer_context"),
        ]
        .into_iter()
        .filter_map(|(supported, name)| supported.then_some(name))
        .collect()
    }
}

/// Optional capabilities of a [`Stmt`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StmtCapabilities {
    pub column_converter: bool,
    pub named_value_checker: bool,
    pub exec_context: bool,
    pub query_context: bool,
}

impl StmtCapabilities {
    /// Probe a statement.
    pub fn probe(stmt: &mut dyn Stmt) -> Self {
        Self {
            column_converter: stmt.as_column_converter().is_some(),
            named_value_checker: stmt.as_named_value_checker().is_some(),
            exec_context: stmt.as_exec_context().is_some(),
            query_context: stmt.as_query_context().is_some(),
        }
    }

    /// Names of the supported capabilities.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.column_converter, "column_converter"),
            (self.named_value_checker, "named_value_checker"),
            (self.exec_context, "exec_context"),
            (self.query_context, "query_context"),
        ]
        .into_iter()
        .filter_map(|(supported, name)| supported.then_some(name))
        .collect()
    }
}

fn write_names(f: &mut fmt::Formatter<'_>, names: &[&'static str]) -> fmt::Result {
    if names.is_empty() {
        write!(f, "none")
    } else {
        write!(f, "{}", names.join(", "))
    }
}

impl fmt::Display for DriverCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, &self.names())
    }
}

impl fmt::Display for ConnCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, &self.names())
    }
}

impl fmt::Display for StmtCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, &self.names())
    }
}
