//! Adapter around a [`Stmt`].

use crate::context::Context;
use crate::driver::{
    ColumnConverter, ExecResult, NamedValue, NamedValueChecker, Rows, Stmt,
    StmtCapabilities, StmtExecContext, StmtQueryContext, Value, ValueConverter,
};
use crate::error::DriverResult;
use crate::wrapper::{withdrawn, WrapOptions};
use async_trait::async_trait;
use std::fmt;

/// Adapter around one prepared statement.
pub struct WrapStmt {
    original: Box<dyn Stmt>,
    options: WrapOptions,
    capabilities: StmtCapabilities,
    withdrawn_converter: WithdrawnConverter,
}

/// Converter handed out when the delegate stops offering its own.
struct WithdrawnConverter {
    options: WrapOptions,
}

impl ValueConverter for WithdrawnConverter {
    fn convert_value(&self, _value: Value) -> DriverResult<Value> {
        self.options
            .annotate("column_converter", Err(withdrawn("column_converter")))
    }
}

impl WrapStmt {
    /// Wrap `original`, probing its optional capabilities.
    pub fn new(mut original: Box<dyn Stmt>, options: WrapOptions) -> Self {
        let capabilities = StmtCapabilities::probe(original.as_mut());
        Self {
            original,
            options,
            capabilities,
            withdrawn_converter: WithdrawnConverter { options },
        }
    }

    /// Capabilities probed from the delegate.
    pub fn capabilities(&self) -> StmtCapabilities {
        self.capabilities
    }
}

#[async_trait]
impl Stmt for WrapStmt {
    async fn close(&mut self) -> DriverResult<()> {
        self.options.annotate("stmt_close", self.original.close().await)
    }

    fn num_input(&self) -> Option<usize> {
        self.original.num_input()
    }

    async fn exec(&mut self, args: &[Value]) -> DriverResult<Box<dyn ExecResult>> {
        self.options.annotate("stmt_exec", self.original.exec(args).await)
    }

    async fn query(&mut self, args: &[Value]) -> DriverResult<Box<dyn Rows>> {
        self.options.annotate("stmt_query", self.original.query(args).await)
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        if self.capabilities.column_converter {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        if self.capabilities.named_value_checker {
            Some(self)
        } else {
            None
        }
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.capabilities.exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.capabilities.query_context {
            Some(self)
        } else {
            None
        }
    }
}

impl ColumnConverter for WrapStmt {
    fn column_converter(&self, index: usize) -> &dyn ValueConverter {
        match self.original.as_column_converter() {
            Some(original) => original.column_converter(index),
            None => &self.withdrawn_converter,
        }
    }
}

impl NamedValueChecker for WrapStmt {
    fn check_named_value(&self, value: &mut NamedValue) -> DriverResult<()> {
        let result = match self.original.as_named_value_checker() {
            Some(original) => original.check_named_value(value),
            None => Err(withdrawn("named_value_checker")),
        };
        self.options.annotate("check_named_value", result)
    }
}

#[async_trait]
impl StmtExecContext for WrapStmt {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn ExecResult>> {
        let result = match self.original.as_exec_context() {
            Some(original) => original.exec_context(ctx, args).await,
            None => Err(withdrawn("exec_context")),
        };
        self.options.annotate("stmt_exec_context", result)
    }
}

#[async_trait]
impl StmtQueryContext for WrapStmt {
    async fn query_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> DriverResult<Box<dyn Rows>> {
        let result = match self.original.as_query_context() {
            Some(original) => original.query_context(ctx, args).await,
            None => Err(withdrawn("query_context")),
        };
        self.options.annotate("stmt_query_context", result)
    }
}

impl fmt::Debug for WrapStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapStmt")
            .field("num_input", &self.original.num_input())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
