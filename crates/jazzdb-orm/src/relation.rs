//! Lazily fetched relationships on fetched records.
//!
//! Every relationship field of a fetched record holds a [`Relation`]. The
//! first [`Relation::resolve`] runs one query through the executor that
//! fetched the record; later calls return the memoized result.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use jazzdb_core::query::{Filter, Query};
use jazzdb_core::schema::{FieldDescriptor, Schema};
use jazzdb_core::SqlValue;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::executor::Executor;
use crate::queryset::QuerySet;
use crate::record::{FieldValue, Record};
use crate::values::Row;

/// The resolved value of a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// A hasOne target, `None` when the key points nowhere.
    One(Option<Arc<Record>>),
    /// Every record of a hasMany relation.
    Many(Vec<Arc<Record>>),
}

impl From<Record> for Related {
    fn from(record: Record) -> Self {
        Self::One(Some(Arc::new(record)))
    }
}

impl From<Option<Record>> for Related {
    fn from(record: Option<Record>) -> Self {
        Self::One(record.map(Arc::new))
    }
}

impl From<Vec<Record>> for Related {
    fn from(records: Vec<Record>) -> Self {
        Self::Many(records.into_iter().map(Arc::new).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    One,
    Many,
}

struct Inner {
    kind: Kind,
    /// Related model.
    model: String,
    /// Field on the related model matched against `key`.
    field: String,
    /// Primary key of the related model.
    related_key: String,
    key: SqlValue,
    schema: Arc<Schema>,
    executor: Executor,
    cache: RwLock<Option<Related>>,
    fetching: Mutex<()>,
}

/// A relationship of a fetched record.
///
/// Clones share the memoized value.
#[derive(Clone)]
pub struct Relation {
    inner: Arc<Inner>,
}

impl Relation {
    fn new(
        kind: Kind,
        model: &str,
        field: &str,
        key: SqlValue,
        schema: &Arc<Schema>,
        executor: &Executor,
    ) -> Result<Self> {
        let related_key = schema.primary_key(model)?.to_string();
        Ok(Self {
            inner: Arc::new(Inner {
                kind,
                model: model.to_string(),
                field: field.to_string(),
                related_key,
                key,
                schema: Arc::clone(schema),
                executor: executor.clone(),
                cache: RwLock::new(None),
                fetching: Mutex::new(()),
            }),
        })
    }

    /// Related model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Returns true for a hasMany relation.
    #[must_use]
    pub fn is_many(&self) -> bool {
        self.inner.kind == Kind::Many
    }

    /// Returns true once resolved or overridden.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    /// The key this relation currently points at, without fetching.
    ///
    /// For hasOne this is the foreign key, or the primary key of the record
    /// it was overridden with. For hasMany it is the owner's primary key.
    #[must_use]
    pub fn key(&self) -> SqlValue {
        if self.inner.kind == Kind::One {
            if let Some(Related::One(target)) = self.cached() {
                return target
                    .and_then(|record| record.value(&self.inner.related_key).cloned())
                    .unwrap_or(SqlValue::Null);
            }
        }
        self.inner.key.clone()
    }

    /// Fetches the related records once and memoizes them.
    pub async fn resolve(&self) -> Result<Related> {
        if let Some(related) = self.cached() {
            return Ok(related);
        }

        let _fetching = self.inner.fetching.lock().await;
        if let Some(related) = self.cached() {
            return Ok(related);
        }

        let related = self.fetch().await?;
        *self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(related.clone());
        Ok(related)
    }

    /// Resolves a hasOne relation.
    ///
    /// On a hasMany relation this returns the first related record.
    pub async fn one(&self) -> Result<Option<Arc<Record>>> {
        Ok(match self.resolve().await? {
            Related::One(record) => record,
            Related::Many(records) => records.into_iter().next(),
        })
    }

    /// Resolves a hasMany relation.
    pub async fn many(&self) -> Result<Vec<Arc<Record>>> {
        Ok(match self.resolve().await? {
            Related::One(record) => record.into_iter().collect(),
            Related::Many(records) => records,
        })
    }

    /// Replaces the relation in memory without querying.
    ///
    /// A hasOne relation saved afterwards points at the new record.
    pub fn override_with(&self, related: impl Into<Related>) {
        *self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(related.into());
    }

    fn cached(&self) -> Option<Related> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn fetch(&self) -> Result<Related> {
        let inner = &self.inner;
        if inner.key.is_null() {
            return Ok(match inner.kind {
                Kind::One => Related::One(None),
                Kind::Many => Related::Many(Vec::new()),
            });
        }

        debug!(model = %inner.model, field = %inner.field, "Resolving relation");
        let query = Query::start(&inner.model, Arc::clone(&inner.schema))?
            .filter(Filter::new().with(&inner.field, inner.key.clone()))?;
        let records = QuerySet::new(query, inner.executor.clone()).fetch().await?;

        let mut records = records.into_iter().map(Arc::new);
        Ok(match inner.kind {
            Kind::One => Related::One(records.next()),
            Kind::Many => Related::Many(records.collect()),
        })
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.inner.kind == other.inner.kind
            && self.inner.model == other.inner.model
            && self.inner.field == other.inner.field
            && self.key() == other.key()
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("model", &self.inner.model)
            .field("field", &self.inner.field)
            .field("key", &self.key())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Builds a record from a fetched row, wrapping relationships.
pub(crate) fn materialize(
    model: &str,
    mut row: Row,
    schema: &Arc<Schema>,
    executor: &Executor,
) -> Result<Record> {
    let model_schema = schema.model_schema(model)?;
    let own_key = row
        .get(schema.primary_key(model)?)
        .cloned()
        .unwrap_or(SqlValue::Null);

    let mut record = Record::new(model);
    for (name, descriptor) in model_schema.fields() {
        let relation = match descriptor {
            FieldDescriptor::Scalar(_) => continue,
            FieldDescriptor::HasOne(field) => {
                let key = row.remove(name).unwrap_or(SqlValue::Null);
                let related_key = schema.primary_key(&field.related_model)?;
                Relation::new(
                    Kind::One,
                    &field.related_model,
                    related_key,
                    key,
                    schema,
                    executor,
                )?
            }
            FieldDescriptor::HasMany(field) => Relation::new(
                Kind::Many,
                &field.related_model,
                &field.related_field,
                own_key.clone(),
                schema,
                executor,
            )?,
        };
        record.set(name, FieldValue::Relation(relation));
    }

    for (name, value) in row {
        record.set(&name, value);
    }
    Ok(record)
}
