//! Adapter around a [`Conn`].

use crate::context::Context;
use crate::driver::{
    Conn, ConnBeginTx, ConnCapabilities, ConnPrepareContext, ExecResult, Execer, ExecerContext,
    NamedValue, Queryer, QueryerContext, Rows, Stmt, Tx, TxOptions, Value,
};
use crate::error::DriverResult;
use crate::wrapper::{withdrawn, WrapOptions, WrapStmt};
use async_trait::async_trait;
use std::fmt;

/// Adapter around one live connection.
///
/// Owns its delegate exclusively. Prepared statements are wrapped in a
/// [`WrapStmt`]; transactions, results and row cursors are the delegate's
/// own handles.
pub struct WrapConn {
    original: Box<dyn Conn>,
    options: WrapOptions,
    capabilities: ConnCapabilities,
}

impl WrapConn {
    /// Wrap `original`, probing its optional capabilities.
    pub fn new(mut original: Box<dyn Conn>, options: WrapOptions) -> Self {
        let capabilities = ConnCapabilities::probe(original.as_mut());
        Self {
            original,
            options,
            capabilities,
        }
    }

    /// Capabilities probed from the delegate.
    pub fn capabilities(&self) -> ConnCapabilities {
        self.capabilities
    }

    fn wrap_stmt(&self, stmt: Box<dyn Stmt>) -> Box<dyn Stmt> {
        Box::new(WrapStmt::new(stmt, self.options))
    }
}

#[async_trait]
impl Conn for WrapConn {
    async fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        let stmt = self.options.annotate("prepare", self.original.prepare(query).await)?;
        Ok(self.wrap_stmt(stmt))
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.options.annotate("close", self.original.close().await)
    }

    async fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        self.options.annotate("begin", self.original.begin().await)
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.capabilities.prepare_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.capabilities.begin_tx {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.capabilities.execer {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.capabilities.execer_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.capabilities.queryer {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.capabilities.queryer_context {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ConnPrepareContext for WrapConn {
    async fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>> {
        let result = match self.original.as_prepare_context() {
            Some(original) => original.prepare_context(ctx, query).await,
            None => Err(withdrawn("prepare_context")),
        };
        let stmt = self.options.annotate("prepare_context", result)?;
        Ok(self.wrap_stmt(stmt))
    }
}

#[async_trait]
impl ConnBeginTx for WrapConn {
    async fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        let result = match self.original.as_begin_tx() {
            Some(original) => original.begin_tx(ctx, opts).await,
            None => Err(withdrawn("begin_tx")),
        };
        self.options.annotate("begin_tx", result)
    }
}

#[async_trait]
impl Execer for WrapConn {
    async fn exec(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        let result = match self.original.as_execer() {
            Some(original) => original.exec(query, args).await,
            None => Err(withdrawn("execer")),
        };
        self.options.annotate("exec", result)
    }
}

#[async_trait]
impl ExecerContext for WrapConn {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        let result = match self.original.as_execer_context() {
            Some(original) => original.exec_context(ctx, query, args).await,
            None => Err(withdrawn("execer_context")),
        };
        self.options.annotate("exec_context", result)
    }
}

#[async_trait]
impl Queryer for WrapConn {
    async fn query(&mut self, query: &str, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        let result = match self.original.as_queryer() {
            Some(original) => original.query(query, args).await,
            None => Err(withdrawn("queryer")),
        };
        self.options.annotate("query", result)
    }
}

#[async_trait]
impl QueryerContext for WrapConn {
    async fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        let result = match self.original.as_queryer_context() {
            Some(original) => original.query_context(ctx, query, args).await,
            None => Err(withdrawn("queryer_context")),
        };
        self.options.annotate("query_context", result)
    }
}

impl fmt::Debug for WrapConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapConn")
            .field("options", &self.options)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
