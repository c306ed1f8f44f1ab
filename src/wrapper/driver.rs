//! Adapter around a [`Driver`] and a [`Connector`].

use crate::context::Context;
use crate::driver::{Conn, Connector, Driver, DriverCapabilities, DriverContext};
use crate::error::DriverResult;
use crate::wrapper::{withdrawn, WrapConn, WrapOptions};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Adapter around a driver.
///
/// Connections opened through the adapter are themselves wrapped in a
/// [`WrapConn`], so their errors are annotated too.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use wrapdb_rs::driver::Driver;
/// use wrapdb_rs::wrapper::WrapDriver;
///
/// # async fn example(postgres: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let driver = WrapDriver::new(postgres);
/// match driver.open("host=localhost user=app").await {
///     Ok(_conn) => {}
///     Err(err) => eprintln!("{:#}", err), // message plus stack frames
/// }
/// # Ok(())
/// # }
/// ```
pub struct WrapDriver {
    original: Arc<dyn Driver>,
    options: WrapOptions,
    capabilities: DriverCapabilities,
}

impl WrapDriver {
    /// Wrap `original` with default options.
    pub fn new(original: Arc<dyn Driver>) -> Self {
        Self::with_options(original, WrapOptions::default())
    }

    /// Wrap `original` with the given options.
    pub fn with_options(original: Arc<dyn Driver>, options: WrapOptions) -> Self {
        let capabilities = DriverCapabilities::probe(&*original);
        Self {
            original,
            options,
            capabilities,
        }
    }

    /// Options applied to everything opened through this driver.
    pub fn options(&self) -> WrapOptions {
        self.options
    }

    /// Capabilities probed from the delegate.
    pub fn capabilities(&self) -> DriverCapabilities {
        self.capabilities
    }
}

#[async_trait]
impl Driver for WrapDriver {
    async fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>> {
        let conn = self.options.annotate("open", self.original.open(name).await)?;
        Ok(Box::new(WrapConn::new(conn, self.options)))
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.capabilities.driver_context {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl DriverContext for WrapDriver {
    async fn open_connector(&self, name: &str) -> DriverResult<Arc<dyn Connector>> {
        let result = match self.original.as_driver_context() {
            Some(original) => original.open_connector(name).await,
            None => Err(withdrawn("driver_context")),
        };
        let connector = self.options.annotate("open_connector", result)?;
        Ok(Arc::new(WrapConnector::with_options(connector, self.options)))
    }
}

impl fmt::Debug for WrapDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapDriver")
            .field("options", &self.options)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Adapter around a connector.
pub struct WrapConnector {
    original: Arc<dyn Connector>,
    options: WrapOptions,
}

impl WrapConnector {
    /// Wrap `original` with default options.
    pub fn new(original: Arc<dyn Connector>) -> Self {
        Self::with_options(original, WrapOptions::default())
    }

    /// Wrap `original` with the given options.
    pub fn with_options(original: Arc<dyn Connector>, options: WrapOptions) -> Self {
        Self { original, options }
    }

    /// Options applied to connections produced by this connector.
    pub fn options(&self) -> WrapOptions {
        self.options
    }
}

#[async_trait]
impl Connector for WrapConnector {
    async fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        let conn = self.options.annotate("connect", self.original.connect(ctx).await)?;
        Ok(Box::new(WrapConn::new(conn, self.options)))
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(WrapDriver::with_options(self.original.driver(), self.options))
    }
}

impl fmt::Debug for WrapConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapConnector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
