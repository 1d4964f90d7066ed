//! # jazzdb-sqlite
//!
//! SQLite backend for JazzDb.
//!
//! Provides a sqlx pool implementing [`jazzdb_core::Connection`], the
//! SQLite [`Dialect`](jazzdb_core::Dialect) and a [`matcher`] that claims
//! `sqlite:` connection strings.
//!
//! # How SQLite differs from other dialects
//!
//! - **[UPSERT]**: `INSERT ... ON CONFLICT DO UPDATE SET ...` is available
//!   since SQLite 3.24.0; saves rely on it.
//! - **[RETURNING]**: available on INSERT since SQLite 3.35.0; saves read
//!   the primary key back through it.
//! - **Placeholders**: numbered `?1, ?2, ...`.
//! - **[Type affinity]**: any column can store any value, so rows are decoded
//!   by the storage class of each value rather than the declared column type.
//!   Booleans come back as integers.
//!
//! [UPSERT]: https://www.sqlite.org/lang_upsert.html
//! [RETURNING]: https://www.sqlite.org/lang_returning.html
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//!
//! ## Example
//!
//! ```rust,no_run
//! use jazzdb_core::{Connection, RowMode, Statement};
//! use jazzdb_sqlite::{SqliteBackend, SqliteConfig};
//!
//! # async fn example() -> Result<(), jazzdb_core::ConnectionError> {
//! let backend = SqliteBackend::connect_lazy("sqlite::memory:", &SqliteConfig::default())?;
//! let statement = Statement {
//!     sql: "SELECT 1 AS \"one\"".to_string(),
//!     params: Vec::new(),
//! };
//! let result = backend.execute(&statement, RowMode::Object).await?;
//! assert_eq!(result.columns, vec!["one".to_string()]);
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod dialect;
mod row;

pub use backend::{matcher, SqliteBackend, SqliteSession};
pub use config::{is_in_memory, SqliteConfig};
pub use dialect::SqliteDialect;
