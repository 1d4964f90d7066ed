//! The capability a database driver provides.
//!
//! Drivers implement [`Connection`] for a pool and [`Session`] for one
//! checked-out physical connection. Transactions hold a session for their
//! whole lifetime; everything else goes through the pool.

use std::future::Future;
use std::pin::Pin;

use crate::dialect::Dialect;
use crate::error::ConnectionError;
use crate::fragment::Statement;
use crate::value::SqlValue;

/// A boxed future, as returned by the object-safe driver traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Driver result type.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

/// How the caller wants the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowMode {
    /// Rows keyed by column name.
    #[default]
    Object,
    /// Rows as positional arrays.
    Array,
    /// Only the number of affected rows.
    Count,
}

/// Rows returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names, in row order.
    pub columns: Vec<String>,
    /// Row values, one vector per row.
    pub rows: Vec<Vec<SqlValue>>,
    /// Rows changed by the statement.
    pub rows_affected: u64,
}

impl ResultSet {
    /// Creates a result holding only an affected-row count.
    #[must_use]
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    /// Returns the first value of the first row.
    #[must_use]
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// A pool of connections to one database.
pub trait Connection: Send + Sync {
    /// Database type, e.g. `sqlite`.
    fn name(&self) -> &'static str;

    /// SQL dialect used to render statements for this connection.
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a statement on any pooled connection.
    fn execute<'a>(
        &'a self,
        statement: &'a Statement,
        mode: RowMode,
    ) -> BoxFuture<'a, ConnectionResult<ResultSet>>;

    /// Checks out a connection for exclusive use.
    fn acquire(&self) -> BoxFuture<'_, ConnectionResult<Box<dyn Session>>>;

    /// Closes the pool.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// One physical connection checked out of a pool.
pub trait Session: Send {
    /// Runs a statement on this connection.
    fn execute<'a>(
        &'a mut self,
        statement: &'a Statement,
        mode: RowMode,
    ) -> BoxFuture<'a, ConnectionResult<ResultSet>>;

    /// Returns the connection to its pool.
    fn release(self: Box<Self>) -> BoxFuture<'static, ()>;
}
