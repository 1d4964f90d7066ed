//! Per-model access to a database or transaction.

use std::sync::Arc;

use jazzdb_core::query::Query;
use jazzdb_core::schema::Schema;
use jazzdb_core::{render, RowMode, SqlValue};
use tracing::debug;

use crate::error::Result;
use crate::executor::Executor;
use crate::queryset::QuerySet;
use crate::record::{flatten_for_saving, Record};
use crate::validate::validate;

/// Entry point for querying and saving one model.
///
/// # Example
///
/// ```ignore
/// let classes = db.model("class")?;
///
/// let mut year3 = Record::new("class").with("name", "Year 3");
/// let id = classes.save(&mut year3).await?;
///
/// let found = classes.all().filter(filter! { "id" => id })?.single().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ModelHandle {
    name: String,
    schema: Arc<Schema>,
    root: Query,
    executor: Executor,
}

impl ModelHandle {
    pub(crate) fn new(name: &str, schema: Arc<Schema>, executor: Executor) -> Result<Self> {
        let root = Query::start(name, Arc::clone(&schema))?;
        Ok(Self {
            name: name.to_string(),
            schema,
            root,
            executor,
        })
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a query set over every record of the model.
    #[must_use]
    pub fn all(&self) -> QuerySet {
        QuerySet::new(self.root.clone(), self.executor.clone())
    }

    /// Inserts or updates a record, returning its primary key.
    ///
    /// The key is written back onto `record`, so it is populated afterwards
    /// whether the row was inserted or updated.
    pub async fn save(&self, record: &mut Record) -> Result<SqlValue> {
        validate(record, &self.schema, &self.name)?;

        let primary_key = self.schema.primary_key(&self.name)?;
        let mut columns = flatten_for_saving(record, &self.schema, &self.name)?;
        columns.retain(|(field, value)| field != primary_key || !value.is_null());

        debug!(model = %self.name, fields = columns.len(), "Saving record");
        let fragment = render::render_upsert(&self.name, primary_key, &columns);
        let result = self.executor.run(&fragment, RowMode::Array).await?;
        let key = result.scalar().cloned().unwrap_or(SqlValue::Null);

        record.set(primary_key, key.clone());
        Ok(key)
    }
}
