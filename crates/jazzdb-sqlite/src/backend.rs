//! sqlx-backed implementation of the connection capability.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use jazzdb_core::connection::{BoxFuture, ConnectionResult};
use jazzdb_core::{Connection, ConnectionError, Dialect, ResultSet, RowMode, Session, Statement};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tracing::{debug, info};

use crate::config::{is_in_memory, SqliteConfig};
use crate::dialect::SqliteDialect;
use crate::row::{bind_param, column_names, decode_row};

const SCHEME: &str = "sqlite:";

fn driver_error(err: sqlx::Error) -> ConnectionError {
    ConnectionError::with_source(err.to_string(), err)
}

/// Runs a statement on any sqlx executor: the pool or a checked-out connection.
async fn run<'c, E>(executor: E, statement: &Statement, mode: RowMode) -> ConnectionResult<ResultSet>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    debug!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");

    let query = statement
        .params
        .iter()
        .cloned()
        .fold(sqlx::query(&statement.sql), bind_param);

    if mode == RowMode::Count {
        let result = query.execute(executor).await.map_err(driver_error)?;
        return Ok(ResultSet::affected(result.rows_affected()));
    }

    let rows = query.fetch_all(executor).await.map_err(driver_error)?;
    let columns = rows.first().map(column_names).unwrap_or_default();
    let rows = rows.iter().map(decode_row).collect::<ConnectionResult<Vec<_>>>()?;
    Ok(ResultSet {
        columns,
        rows,
        rows_affected: 0,
    })
}

/// A SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a pool that connects on first use.
    ///
    /// Accepts `sqlite::memory:`, `sqlite://path.db` and `sqlite:path.db`,
    /// with the scheme matched case-insensitively. The connection string is
    /// never included in errors. Must be called from within a Tokio runtime.
    pub fn connect_lazy(connection_string: &str, config: &SqliteConfig) -> ConnectionResult<Self> {
        let rest = connection_string
            .get(..SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
            .map(|_| &connection_string[SCHEME.len()..])
            .ok_or_else(|| ConnectionError::new("expected a sqlite: connection string"))?;

        let options = SqliteConnectOptions::from_str(&format!("{SCHEME}{rest}"))
            .map_err(|_| ConnectionError::new("invalid sqlite connection string"))?
            .create_if_missing(config.create_if_missing);

        let pool = if is_in_memory(connection_string) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_lazy_with(options)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_lazy_with(options)
        };

        info!(
            in_memory = is_in_memory(connection_string),
            "Created sqlite pool"
        );
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Connection for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn execute<'a>(
        &'a self,
        statement: &'a Statement,
        mode: RowMode,
    ) -> BoxFuture<'a, ConnectionResult<ResultSet>> {
        Box::pin(run(&self.pool, statement, mode))
    }

    fn acquire(&self) -> BoxFuture<'_, ConnectionResult<Box<dyn Session>>> {
        Box::pin(async move {
            let conn = self.pool.acquire().await.map_err(driver_error)?;
            Ok(Box::new(SqliteSession { conn }) as Box<dyn Session>)
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.pool.close().await;
            info!("Closed sqlite pool");
        })
    }
}

/// One pooled SQLite connection held for exclusive use.
pub struct SqliteSession {
    conn: PoolConnection<Sqlite>,
}

impl Session for SqliteSession {
    fn execute<'a>(
        &'a mut self,
        statement: &'a Statement,
        mode: RowMode,
    ) -> BoxFuture<'a, ConnectionResult<ResultSet>> {
        Box::pin(run(&mut *self.conn, statement, mode))
    }

    fn release(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            drop(self.conn);
        })
    }
}

/// Claims `sqlite:` connection strings for a backend registry.
///
/// Returns `None` for any other scheme.
pub fn matcher(connection_string: &str) -> Option<ConnectionResult<Arc<dyn Connection>>> {
    let claimed = connection_string
        .get(..SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(SCHEME));
    if !claimed {
        return None;
    }

    Some(
        SqliteBackend::connect_lazy(connection_string, &SqliteConfig::default())
            .map(|backend| Arc::new(backend) as Arc<dyn Connection>),
    )
}
