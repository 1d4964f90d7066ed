//! The database handle.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use jazzdb_core::schema::Schema;
use jazzdb_core::{Connection, Fragment};
use tracing::info;

use crate::backend::BackendRegistry;
use crate::error::{ConfigError, Result};
use crate::executor::{Executor, RawMode};
use crate::manager::ModelHandle;
use crate::transaction::{run_in_transaction, Transaction};
use crate::values::{Row, Values};

/// Names a model may not use.
pub const RESERVED_NAMES: [&str; 3] = ["sql", "databaseType", "transaction"];

/// A connection pool plus the schemas registered on it.
///
/// Cheap to clone; clones share the pool and see schemas added through any
/// of them.
#[derive(Clone)]
pub struct Database {
    connection: Arc<dyn Connection>,
    schema: Arc<RwLock<Arc<Schema>>>,
}

impl Database {
    /// Wraps a connection with an empty schema.
    #[must_use]
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            schema: Arc::new(RwLock::new(Arc::new(Schema::new()))),
        }
    }

    /// Connects with the first backend in `registry` that accepts the string.
    pub fn connect(registry: &BackendRegistry, connection_string: &str) -> Result<Self> {
        let connection = registry.connect(connection_string)?;
        info!(database = connection.name(), "Database created");
        Ok(Self::new(connection))
    }

    /// Registers the models of `schema`.
    ///
    /// Fails if a model uses a reserved name, collides with a registered
    /// model, or the combined schema does not validate. Nothing is registered
    /// on failure.
    pub fn add_schema(&self, schema: Schema) -> Result<()> {
        if let Some(name) = schema
            .model_names()
            .find(|name| RESERVED_NAMES.contains(name))
        {
            return Err(ConfigError::ReservedName(name.to_string()).into());
        }

        let mut current = self.schema.write().unwrap_or_else(PoisonError::into_inner);
        let merged = current.merge(&schema)?;
        merged.validate()?;
        *current = Arc::new(merged);
        Ok(())
    }

    /// The schema in effect.
    #[must_use]
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Database type, e.g. `sqlite`.
    #[must_use]
    pub fn database_type(&self) -> &'static str {
        self.connection.name()
    }

    fn executor(&self) -> Executor {
        Executor::Database(Arc::clone(&self.connection))
    }

    /// Returns a handle for one model.
    pub fn model(&self, name: &str) -> Result<ModelHandle> {
        ModelHandle::new(name, self.schema(), self.executor())
    }

    /// Runs raw SQL, returning rows keyed by column name.
    ///
    /// ```ignore
    /// let rows = db.sql(sql!("SELECT * FROM \"class\" WHERE \"teacher\" = {}", teacher)?).await?;
    /// ```
    pub async fn sql(&self, fragment: Fragment) -> Result<Vec<Row>> {
        self.executor().rows(&fragment).await
    }

    /// Runs raw SQL, shaping rows as requested.
    pub async fn sql_as(&self, fragment: Fragment, mode: RawMode) -> Result<Values> {
        self.executor().raw(&fragment, mode).await
    }

    /// Runs raw SQL, returning the number of affected rows.
    pub async fn execute(&self, fragment: Fragment) -> Result<u64> {
        self.executor().affected(&fragment).await
    }

    /// Opens a transaction on its own connection.
    pub async fn begin(&self) -> Result<Transaction> {
        Transaction::open(Arc::clone(&self.connection), self.schema()).await
    }

    /// Runs `callback` in a transaction.
    ///
    /// Commits when the callback succeeds and rolls back when it fails,
    /// however many checkpoints are still open. The callback's error is
    /// returned unchanged.
    pub async fn transaction<F, Fut, T>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let transaction = self.begin().await?;
        run_in_transaction(transaction, callback).await
    }

    /// Closes the pool.
    pub async fn end(&self) {
        self.connection.close().await;
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("type", &self.connection.name())
            .field("schema", &self.schema())
            .finish()
    }
}
