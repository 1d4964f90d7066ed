//! Records read from and written to a model.

use std::collections::BTreeMap;
use std::sync::Arc;

use jazzdb_core::query::FilterValue;
use jazzdb_core::schema::{FieldDescriptor, Schema};
use jazzdb_core::SqlValue;

use crate::relation::Relation;

/// The value of one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A column value, or a raw foreign key on a hasOne field.
    Value(SqlValue),
    /// A related record on a hasOne field.
    Object(Arc<Record>),
    /// Related records on a hasMany field.
    Objects(Vec<Arc<Record>>),
    /// A lazily fetched relation, as found on fetched records.
    Relation(Relation),
}

jazzdb_core::impl_from_scalars!(FieldValue, FieldValue::Value);

impl From<Record> for FieldValue {
    fn from(record: Record) -> Self {
        Self::Object(Arc::new(record))
    }
}

impl From<Arc<Record>> for FieldValue {
    fn from(record: Arc<Record>) -> Self {
        Self::Object(record)
    }
}

impl From<Vec<Record>> for FieldValue {
    fn from(records: Vec<Record>) -> Self {
        Self::Objects(records.into_iter().map(Arc::new).collect())
    }
}

impl From<Relation> for FieldValue {
    fn from(relation: Relation) -> Self {
        Self::Relation(relation)
    }
}

/// A row of a model.
///
/// ```
/// use jazzdb_orm::Record;
///
/// let class = Record::new("class").with("name", "Year 3").with("teacher", "Sam");
/// assert_eq!(class.value("name").and_then(|v| v.as_str()), Some("Year 3"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record of `model`.
    #[must_use]
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field in place.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Model the record belongs to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns a plain value field.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&SqlValue> {
        match self.fields.get(field) {
            Some(FieldValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a relation field of a fetched record.
    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&Relation> {
        match self.fields.get(field) {
            Some(FieldValue::Relation(relation)) => Some(relation),
            _ => None,
        }
    }

    /// Iterates over fields by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns only the plain value fields.
    #[must_use]
    pub fn scalars(&self) -> BTreeMap<String, SqlValue> {
        self.fields
            .iter()
            .filter_map(|(name, value)| match value {
                FieldValue::Value(value) => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }
}

impl From<&Record> for FilterValue {
    fn from(record: &Record) -> Self {
        FilterValue::Object(record.scalars())
    }
}

/// The foreign key a hasOne field currently points at.
///
/// Reads relations without fetching them. Returns `None` when the value has
/// no key to offer, such as a related record without a primary key.
pub(crate) fn foreign_key(value: &FieldValue, related_key: &str) -> Option<SqlValue> {
    match value {
        FieldValue::Value(value) => Some(value.clone()),
        FieldValue::Object(record) => record.value(related_key).cloned(),
        FieldValue::Relation(relation) => Some(relation.key()),
        FieldValue::Objects(_) => None,
    }
}

/// Reduces a record to the columns written by a save.
///
/// hasMany fields are dropped since they own no column. hasOne fields become
/// the primary key of whatever they point at. Fields the model does not
/// declare are dropped.
pub fn flatten_for_saving(
    record: &Record,
    schema: &Schema,
    model: &str,
) -> jazzdb_core::Result<Vec<(String, SqlValue)>> {
    let model_schema = schema.model_schema(model)?;
    let mut columns = Vec::with_capacity(record.fields.len());

    for (name, value) in &record.fields {
        let Some(descriptor) = model_schema.get(name) else {
            continue;
        };
        match descriptor {
            FieldDescriptor::Scalar(_) => {
                if let FieldValue::Value(value) = value {
                    columns.push((name.clone(), value.clone()));
                }
            }
            FieldDescriptor::HasOne(field) => {
                let related_key = schema.primary_key(&field.related_model)?;
                if let Some(key) = foreign_key(value, related_key) {
                    columns.push((name.clone(), key));
                }
            }
            FieldDescriptor::HasMany(_) => {}
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jazzdb_core::schema::ModelSchema;

    fn schema() -> Schema {
        Schema::new()
            .model(
                "class",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("name", FieldDescriptor::text())
                    .field("students", FieldDescriptor::has_many("student", "class")),
            )
            .model(
                "student",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("name", FieldDescriptor::text())
                    .field("class", FieldDescriptor::has_one("class")),
            )
    }

    #[test]
    fn test_flatten_replaces_related_object_with_key() {
        let class = Record::new("class").with("id", 3).with("name", "Year 3");
        let student = Record::new("student")
            .with("name", "Alice")
            .with("class", class)
            .with("nickname", "Al");

        let columns = flatten_for_saving(&student, &schema(), "student").expect("flatten");
        assert_eq!(
            columns,
            vec![
                ("class".to_string(), SqlValue::Int(3)),
                ("name".to_string(), SqlValue::Text("Alice".into())),
            ]
        );
    }

    #[test]
    fn test_flatten_drops_has_many() {
        let class = Record::new("class")
            .with("name", "Year 3")
            .with("students", vec![Record::new("student").with("id", 1)]);

        let columns = flatten_for_saving(&class, &schema(), "class").expect("flatten");
        assert_eq!(columns, vec![("name".to_string(), SqlValue::Text("Year 3".into()))]);
    }

    #[test]
    fn test_record_as_filter_value() {
        let class = Record::new("class").with("id", 5).with("name", "Year 5");
        let FilterValue::Object(object) = FilterValue::from(&class) else {
            panic!("expected an object");
        };
        assert_eq!(object.get("id"), Some(&SqlValue::Int(5)));
    }
}
