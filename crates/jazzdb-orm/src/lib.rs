//! # jazzdb-orm
//!
//! A schema-driven ORM over the query descriptors of `jazzdb-core`.
//!
//! This crate provides:
//! - [`Database`] handles, opened through a [`BackendRegistry`]
//! - [`ModelHandle`] for saving records and starting queries
//! - [`QuerySet`] for lazy, chainable queries
//! - [`Record`]s whose relationships resolve lazily through [`Relation`]
//! - Nested [`Transaction`]s built on savepoints
//!
//! ## Quick Start
//!
//! ```no_run
//! use jazzdb_core::filter;
//! use jazzdb_core::query::ValuesOptions;
//! use jazzdb_core::schema::{FieldDescriptor, ModelSchema, Schema};
//! use jazzdb_orm::{BackendRegistry, Database, Record};
//!
//! # async fn example() -> jazzdb_orm::Result<()> {
//! let db = Database::connect(&BackendRegistry::with_defaults(), "sqlite://school.db")?;
//! db.add_schema(Schema::new().model(
//!     "class",
//!     ModelSchema::new()
//!         .field("id", FieldDescriptor::primary_key())
//!         .field("name", FieldDescriptor::text().required())
//!         .field("teacher", FieldDescriptor::text()),
//! ))?;
//!
//! let classes = db.model("class")?;
//! let mut year3 = Record::new("class").with("name", "Year 3").with("teacher", "Sam");
//! classes.save(&mut year3).await?;
//!
//! let names = classes
//!     .all()
//!     .filter([filter! { "teacher" => "Sam" }, filter! { "teacher" => "Sally" }])?
//!     .order(["-name"])?
//!     .values(["name"], ValuesOptions { flat: true, distinct: false })
//!     .await?;
//! # let _ = names;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transactions
//!
//! ```no_run
//! # use jazzdb_orm::{Database, Record};
//! # async fn example(db: Database) -> jazzdb_orm::Result<()> {
//! db.transaction(|tx| async move {
//!     let mut sally = Record::new("class").with("name", "Year 5");
//!     tx.model("class")?.save(&mut sally).await?;
//!
//!     // Only the inner save is undone if the inner callback fails.
//!     let _ = tx
//!         .transaction(|inner| async move {
//!             let mut sam = Record::new("class").with("name", "Year 6");
//!             inner.model("class")?.save(&mut sam).await?;
//!             Err::<(), _>(jazzdb_orm::OrmError::TransactionFinalized)
//!         })
//!         .await;
//!     Ok::<_, jazzdb_orm::OrmError>(())
//! })
//! .await
//! # }
//! ```

mod backend;
mod database;
mod databases;
mod error;
mod executor;
mod manager;
mod queryset;
mod record;
mod relation;
mod transaction;
mod validate;
mod values;

pub use backend::{BackendRegistry, Matcher};
pub use database::{Database, RESERVED_NAMES};
pub use databases::{Databases, DEFAULT_DATABASE};
pub use error::{ConfigError, OrmError, Result, ValidationError};
pub use executor::RawMode;
pub use manager::ModelHandle;
pub use queryset::QuerySet;
pub use record::{flatten_for_saving, FieldValue, Record};
pub use relation::{Related, Relation};
pub use transaction::Transaction;
pub use validate::validate;
pub use values::{Row, Values};

// Re-export commonly used types from jazzdb-core
pub use jazzdb_core::query::{
    average, count, count_all, max, min, sum, Direction, Filter, FilterInput, OrderBy,
    Projection, ValuesOptions,
};
pub use jazzdb_core::schema::{FieldDescriptor, ModelSchema, Schema, ValueType};
pub use jazzdb_core::{filter, sql, Fragment, SqlValue, ToSqlValue};
