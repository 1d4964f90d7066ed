//! # jazzdb-core
//!
//! Query descriptors and parameterized SQL for JazzDb.
//!
//! This crate provides:
//! - A runtime [`Schema`] of models, scalar fields and relationships
//! - An immutable [`Query`] descriptor built from filter maps, orderings and
//!   projections, with `a__b__c` paths resolved into joins
//! - Rendering of descriptors into SQL [`Fragment`]s with bound values
//! - The [`Connection`] capability drivers implement
//!
//! No I/O happens here; see `jazzdb-sqlite` for a driver and `jazzdb-orm`
//! for the developer-facing API.
//!
//! ## Building a query
//!
//! ```rust
//! use std::sync::Arc;
//! use jazzdb_core::{filter, render, GenericDialect, Query};
//! use jazzdb_core::schema::{FieldDescriptor, ModelSchema, Schema};
//!
//! let schema = Arc::new(
//!     Schema::new()
//!         .model(
//!             "class",
//!             ModelSchema::new()
//!                 .field("id", FieldDescriptor::primary_key())
//!                 .field("name", FieldDescriptor::text())
//!                 .field("students", FieldDescriptor::has_many("student", "class")),
//!         )
//!         .model(
//!             "student",
//!             ModelSchema::new()
//!                 .field("id", FieldDescriptor::primary_key())
//!                 .field("age", FieldDescriptor::integer())
//!                 .field("class", FieldDescriptor::has_one("class")),
//!         ),
//! );
//!
//! let query = Query::start("class", schema)?
//!     .filter(filter! { "students__age__gte" => 10 })?;
//! let statement = render::render_select(&query).to_statement(&GenericDialect);
//!
//! assert_eq!(
//!     statement.sql,
//!     "SELECT \"class\".* FROM \"class\" \
//!      INNER JOIN \"student\" ON \"class\".\"id\" = \"student\".\"class\" \
//!      WHERE \"student\".\"age\" >= $1"
//! );
//! # Ok::<(), jazzdb_core::QueryError>(())
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are never formatted into SQL text, including raw SQL written with
//! the [`sql!`] macro:
//!
//! ```rust
//! use jazzdb_core::{sql, GenericDialect};
//!
//! let user_input = "'; DROP TABLE class; --";
//! let statement = sql!("SELECT * FROM \"class\" WHERE \"name\" = {}", user_input)?
//!     .to_statement(&GenericDialect);
//!
//! assert_eq!(statement.sql, "SELECT * FROM \"class\" WHERE \"name\" = $1");
//! # Ok::<(), jazzdb_core::QueryError>(())
//! ```

pub mod connection;
pub mod dialect;
mod error;
pub mod fragment;
pub mod query;
pub mod render;
pub mod schema;
mod value;

pub use connection::{BoxFuture, Connection, ResultSet, RowMode, Session};
pub use dialect::{Dialect, GenericDialect};
pub use error::{ConnectionError, QueryError, Result, SchemaError};
pub use fragment::{quote_identifier, Fragment, Statement};
pub use query::Query;
pub use schema::{FieldDescriptor, ModelSchema, Schema, ValueType};
pub use value::{SqlValue, ToSqlValue};
