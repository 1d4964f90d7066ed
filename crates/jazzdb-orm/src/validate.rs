//! Field-level checks run before a record is saved.

use std::collections::HashSet;
use std::sync::Arc;

use jazzdb_core::schema::{FieldDescriptor, Schema, ValueType};
use jazzdb_core::SqlValue;

use crate::error::{OrmError, ValidationError};
use crate::record::{FieldValue, Record};

fn matches_type(value: &SqlValue, value_type: ValueType) -> bool {
    match (value_type, value) {
        (_, SqlValue::Null) | (ValueType::Any, _) => true,
        (ValueType::Text, SqlValue::Text(_))
        | (ValueType::Integer, SqlValue::Int(_))
        | (ValueType::Real, SqlValue::Int(_) | SqlValue::Float(_))
        | (ValueType::Boolean, SqlValue::Bool(_)) => true,
        (ValueType::Boolean, SqlValue::Int(n)) => *n == 0 || *n == 1,
        _ => false,
    }
}

fn type_name(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Text => "text",
        ValueType::Integer => "an integer",
        ValueType::Real => "a number",
        ValueType::Boolean => "a boolean",
        ValueType::Any => "any value",
    }
}

/// Walks a record graph, visiting each shared record once.
struct Validator<'a> {
    schema: &'a Schema,
    visited: HashSet<*const Record>,
}

impl Validator<'_> {
    fn nested(
        &mut self,
        record: &Arc<Record>,
        model: &str,
        path: &str,
    ) -> Result<(), ValidationError> {
        if self.visited.insert(Arc::as_ptr(record)) {
            self.record(record, model, path)
        } else {
            Ok(())
        }
    }

    fn record(
        &mut self,
        record: &Record,
        model: &str,
        path: &str,
    ) -> Result<(), ValidationError> {
        let model_schema = self
            .schema
            .get(model)
            .ok_or_else(|| ValidationError::new(path, format!("unknown model `{model}`")))?;

        for (name, descriptor) in model_schema.fields() {
            let field_path = if path.is_empty() {
                name.to_string()
            } else {
                format!("{path}.{name}")
            };
            let value = record.get(name);

            match descriptor {
                FieldDescriptor::Scalar(field) => match value {
                    None | Some(FieldValue::Value(SqlValue::Null)) => {
                        if field.required {
                            return Err(ValidationError::new(field_path, "is required"));
                        }
                    }
                    Some(FieldValue::Value(value)) => {
                        if !matches_type(value, field.value_type) {
                            return Err(ValidationError::new(
                                field_path,
                                format!(
                                    "expected {} but got {}",
                                    type_name(field.value_type),
                                    value.kind()
                                ),
                            ));
                        }
                    }
                    Some(_) => {
                        return Err(ValidationError::new(field_path, "expected a plain value"));
                    }
                },
                FieldDescriptor::HasOne(field) => match value {
                    Some(FieldValue::Value(SqlValue::Blob(_))) => {
                        return Err(ValidationError::new(field_path, "expected a key"));
                    }
                    Some(FieldValue::Object(related)) => {
                        if related.value(self.key(&field.related_model, &field_path)?).is_none() {
                            return Err(ValidationError::new(
                                field_path,
                                "related record has no primary key",
                            ));
                        }
                        self.nested(related, &field.related_model, &field_path)?;
                    }
                    Some(FieldValue::Objects(_)) => {
                        return Err(ValidationError::new(field_path, "expected a single record"));
                    }
                    None | Some(FieldValue::Value(_) | FieldValue::Relation(_)) => {}
                },
                FieldDescriptor::HasMany(field) => {
                    if let Some(FieldValue::Objects(related)) = value {
                        for (index, item) in related.iter().enumerate() {
                            let item_path = format!("{field_path}.{index}");
                            self.nested(item, &field.related_model, &item_path)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn key(&self, model: &str, path: &str) -> Result<&str, ValidationError> {
        self.schema
            .primary_key(model)
            .map_err(|err| ValidationError::new(path, err.to_string()))
    }
}

/// Validates a record against `model` and every related record it embeds.
///
/// Fields the model does not declare are ignored; saving drops them.
pub fn validate(record: &Record, schema: &Schema, model: &str) -> Result<(), OrmError> {
    let mut validator = Validator {
        schema,
        visited: HashSet::new(),
    };
    validator.record(record, model, "")?;
    Ok(())
}
