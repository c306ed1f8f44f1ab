//! Database handle.
//!
//! This module provides the `Database` type which resolves a driver by name
//! and acts as a factory for connections.

use crate::context::Context;
use crate::driver::{Connector, Driver};
use crate::error::DriverResult;
use crate::registry::Registry;
use crate::sql::Connection;
use std::fmt;
use std::sync::Arc;

/// Connection factory bound to one driver and connection string.
///
/// When the driver offers a [`Connector`](crate::driver::Connector) through
/// `DriverContext`, the connection string is parsed once at open time and
/// every connection goes through the connector. Otherwise each connection
/// calls `Driver::open` with the connection string.
///
/// # Example
///
/// ```no_run
/// use wrapdb_rs::context::Context;
/// use wrapdb_rs::registry::Registry;
/// use wrapdb_rs::sql::Database;
///
/// # async fn example(registry: &Registry) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let database = Database::open(registry, "postgres-wrapper", "host=localhost user=app").await?;
/// let mut connection = database.connect(&Context::background()).await?;
/// connection.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Database {
    driver: Arc<dyn Driver>,
    connector: Option<Arc<dyn Connector>>,
    driver_name: Option<String>,
    dsn: String,
}

impl Database {
    /// Resolve `driver_name` in `registry` and prepare to connect with `dsn`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownDriver` for an unknown driver name, or
    /// the driver's error if it fails to create a connector.
    pub async fn open(registry: &Registry, driver_name: &str, dsn: &str) -> DriverResult<Self> {
        let driver = registry.require(driver_name)?;
        let connector = match driver.as_driver_context() {
            Some(context) => Some(context.open_connector(dsn).await?),
            None => None,
        };

        Ok(Self {
            driver,
            connector,
            driver_name: Some(driver_name.to_string()),
            dsn: dsn.to_string(),
        })
    }

    /// Create a database from a connector, bypassing the registry.
    pub fn from_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            driver: connector.driver(),
            connector: Some(connector),
            driver_name: None,
            dsn: String::new(),
        }
    }

    /// The driver backing this database.
    pub fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }

    /// The registry name the driver was resolved from, if any.
    pub fn driver_name(&self) -> Option<&str> {
        self.driver_name.as_deref()
    }

    /// Check whether connections go through a connector.
    pub fn uses_connector(&self) -> bool {
        self.connector.is_some()
    }

    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or a `ContextError` if `ctx` is already
    /// done and the driver cannot observe cancellation itself.
    pub async fn connect(&self, ctx: &Context) -> DriverResult<Connection> {
        let conn = match &self.connector {
            Some(connector) => connector.connect(ctx).await?,
            None => {
                if let Some(err) = ctx.err() {
                    return Err(err.into());
                }
                self.driver.open(&self.dsn).await?
            }
        };
        Ok(Connection::new(conn))
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database({})", self.driver_name.as_deref().unwrap_or("<connector>"))
    }
}

impl fmt::Debug for Database {
    // The connection string may carry credentials.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver_name", &self.driver_name)
            .field("uses_connector", &self.connector.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Conn, Stmt, Tx};
    use crate::error::{ContextError, RegistryError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        opened: Mutex<Vec<String>>,
    }

    struct Idle;

    #[async_trait]
    impl Conn for Idle {
        async fn prepare(&mut self, _query: &str) -> DriverResult<Box<dyn Stmt>> {
            Err("unsupported".into())
        }
        async fn close(&mut self) -> DriverResult<()> {
            Ok(())
        }
        async fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
            Err("unsupported".into())
        }
    }

    #[async_trait]
    impl Driver for Recorder {
        async fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>> {
            self.opened.lock().unwrap().push(name.to_string());
            Ok(Box::new(Idle))
        }
    }

    fn registry_with_recorder() -> (Registry, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            opened: Mutex::new(Vec::new()),
        });
        let registry = Registry::new();
        registry
            .register("recorder", Arc::clone(&recorder) as Arc<dyn Driver>)
            .unwrap();
        (registry, recorder)
    }

    #[tokio::test]
    async fn test_open_unknown_driver() {
        let registry = Registry::new();
        let err = Database::open(&registry, "nope", "").await.err().unwrap();
        assert_eq!(
            err.downcast_ref::<RegistryError>(),
            Some(&RegistryError::UnknownDriver("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_connect_uses_dsn() {
        let (registry, recorder) = registry_with_recorder();
        let database = Database::open(&registry, "recorder", "host=db").await.unwrap();

        assert!(!database.uses_connector());
        assert_eq!(database.driver_name(), Some("recorder"));

        database.connect(&Context::background()).await.unwrap();
        assert_eq!(*recorder.opened.lock().unwrap(), vec!["host=db".to_string()]);
    }

    #[tokio::test]
    async fn test_connect_checks_context() {
        let (registry, recorder) = registry_with_recorder();
        let database = Database::open(&registry, "recorder", "host=db").await.unwrap();

        let (ctx, cancel) = Context::with_cancel();
        cancel.cancel();

        let err = database.connect(&ctx).await.err().unwrap();
        assert_eq!(err.downcast_ref::<ContextError>(), Some(&ContextError::Canceled));
        assert!(recorder.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_display_hides_dsn() {
        let (registry, _recorder) = registry_with_recorder();
        let database = Database::open(&registry, "recorder", "password=secret")
            .await
            .unwrap();

        assert_eq!(database.to_string(), "Database(recorder)");
        assert!(!format!("{:?}", database).contains("secret"));
    }
}
