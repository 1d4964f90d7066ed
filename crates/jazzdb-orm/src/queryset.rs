//! Chainable queries bound to an executor.
//!
//! A [`QuerySet`] pairs a query descriptor with the database or transaction
//! it runs on. Builder methods return new query sets; nothing runs until a
//! terminal method is awaited.

use jazzdb_core::query::{FilterInput, OrderBy, Projection, Query, ValuesOptions};
use jazzdb_core::{render, ConnectionError, RowMode, SqlValue, ToSqlValue};

use crate::error::Result;
use crate::executor::Executor;
use crate::record::Record;
use crate::relation::materialize;
use crate::values::{self, Values};

/// A lazy query on one model.
///
/// # Example
///
/// ```ignore
/// use jazzdb_core::filter;
///
/// let names = db
///     .model("class")?
///     .all()
///     .filter(filter! { "teacher" => "Sam" })?
///     .order(["-name"])?
///     .values(["name"], ValuesOptions { flat: true, ..Default::default() })
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct QuerySet {
    query: Query,
    executor: Executor,
}

impl QuerySet {
    pub(crate) fn new(query: Query, executor: Executor) -> Self {
        Self { query, executor }
    }

    /// The underlying descriptor.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    fn with_query(&self, query: Query) -> Self {
        Self {
            query,
            executor: self.executor.clone(),
        }
    }

    /// Adds a filter, ANDed onto the existing ones.
    ///
    /// A list of filters is ORed together first.
    pub fn filter(&self, input: impl Into<FilterInput>) -> Result<Self> {
        Ok(self.with_query(self.query.filter(input)?))
    }

    /// Adds several filters, ANDed together.
    pub fn filter_all<I>(&self, inputs: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<FilterInput>,
    {
        Ok(self.with_query(self.query.filter_all(inputs)?))
    }

    /// Replaces the ordering. Use a `-` prefix for descending order.
    pub fn order<I>(&self, specs: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<OrderBy>,
    {
        Ok(self.with_query(self.query.order(specs, false)?))
    }

    /// Appends to the ordering.
    pub fn order_append<I>(&self, specs: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<OrderBy>,
    {
        Ok(self.with_query(self.query.order(specs, true)?))
    }

    /// Limits the number of results.
    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        self.with_query(self.query.limit(limit))
    }

    /// Rows of the model with joins, deduplicated.
    fn records_query(&self) -> Query {
        if self.query.has_joins() && self.query.projection().is_empty() {
            self.query.distinct(true)
        } else {
            self.query.clone()
        }
    }

    /// Fetches every matching record with its relations attached.
    pub async fn fetch(&self) -> Result<Vec<Record>> {
        let query = self.records_query();
        let rows = self.executor.rows(&render::render_select(&query)).await?;
        rows.into_iter()
            .map(|row| materialize(query.primary_model(), row, query.schema(), &self.executor))
            .collect()
    }

    /// Fetches the first matching record.
    pub async fn single(&self) -> Result<Option<Record>> {
        Ok(self.limit(1).fetch().await?.into_iter().next())
    }

    /// Fetches projected fields and aggregates.
    ///
    /// Flat results come back as arrays, or as plain values when a single
    /// field is projected.
    pub async fn values<I>(&self, fields: I, options: ValuesOptions) -> Result<Values>
    where
        I: IntoIterator,
        I::Item: Into<Projection>,
    {
        let query = self.query.values(fields, options)?;
        let fragment = render::render_select(&query);
        if query.is_flat() {
            let result = self.executor.run(&fragment, RowMode::Array).await?;
            Ok(values::flat(result))
        } else {
            Ok(Values::Objects(self.executor.rows(&fragment).await?))
        }
    }

    /// Counts matching records.
    pub async fn count(&self) -> Result<u64> {
        let fragment = render::render_count(&self.records_query());
        let result = self.executor.run(&fragment, RowMode::Array).await?;
        result
            .scalar()
            .and_then(SqlValue::as_i64)
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| {
                ConnectionError::new(format!(
                    "expected a row count but got {}",
                    result.scalar().map_or("no rows", SqlValue::kind)
                ))
                .into()
            })
    }

    /// Sets fields on every matching record, returning the number changed.
    ///
    /// An empty update issues no SQL and returns 0.
    pub async fn update<I, K, V>(&self, updates: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        let updates: Vec<(String, SqlValue)> = updates
            .into_iter()
            .map(|(field, value)| (field.into(), value.to_sql_value()))
            .collect();
        match render::render_update(&self.query, &updates)? {
            Some(fragment) => self.executor.affected(&fragment).await,
            None => Ok(0),
        }
    }

    /// Deletes every matching record, returning the number removed.
    pub async fn delete(&self) -> Result<u64> {
        let fragment = render::render_delete(&self.query)?;
        self.executor.affected(&fragment).await
    }
}
