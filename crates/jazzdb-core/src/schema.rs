//! Runtime schema: model name to field name to field descriptor.
//!
//! Schemas are plain data. They can be built in code or loaded from JSON:
//!
//! ```json
//! {
//!   "class": {
//!     "id": { "kind": "scalar", "valueType": "integer", "primaryKey": true },
//!     "name": { "kind": "scalar", "valueType": "text" },
//!     "students": { "kind": "hasMany", "relatedModel": "student", "relatedField": "class" }
//!   },
//!   "student": {
//!     "id": { "kind": "scalar", "valueType": "integer", "primaryKey": true },
//!     "class": { "kind": "hasOne", "relatedModel": "class" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, SchemaError};

/// Value type of a scalar field, checked before a record is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Text column.
    Text,
    /// Integer column.
    Integer,
    /// Floating point column; integers are accepted too.
    Real,
    /// Boolean column.
    Boolean,
    /// Any value is accepted.
    #[default]
    Any,
}

/// A column stored on the model's own table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalarField {
    /// Type accepted on save.
    pub value_type: ValueType,
    /// Whether this field is the model's primary key.
    pub primary_key: bool,
    /// Whether the field must be present on save.
    pub required: bool,
}

/// A foreign key stored locally, pointing at another model's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasOneField {
    /// Model the key points at.
    pub related_model: String,
}

/// The inverse of a [`HasOneField`]. Has no local column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasManyField {
    /// Model holding the foreign key.
    pub related_model: String,
    /// The `hasOne` field on the related model that points back here.
    pub related_field: String,
}

/// Describes one field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldDescriptor {
    /// Plain column.
    Scalar(ScalarField),
    /// Many-to-one relationship.
    HasOne(HasOneField),
    /// One-to-many relationship.
    HasMany(HasManyField),
}

impl FieldDescriptor {
    fn scalar(value_type: ValueType) -> Self {
        Self::Scalar(ScalarField {
            value_type,
            ..ScalarField::default()
        })
    }

    /// Text field.
    #[must_use]
    pub fn text() -> Self {
        Self::scalar(ValueType::Text)
    }

    /// Integer field.
    #[must_use]
    pub fn integer() -> Self {
        Self::scalar(ValueType::Integer)
    }

    /// Real field.
    #[must_use]
    pub fn real() -> Self {
        Self::scalar(ValueType::Real)
    }

    /// Boolean field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::scalar(ValueType::Boolean)
    }

    /// Untyped field.
    #[must_use]
    pub fn any() -> Self {
        Self::scalar(ValueType::Any)
    }

    /// Integer primary key.
    #[must_use]
    pub fn primary_key() -> Self {
        Self::Scalar(ScalarField {
            value_type: ValueType::Integer,
            primary_key: true,
            required: false,
        })
    }

    /// Foreign key to `related_model`.
    #[must_use]
    pub fn has_one(related_model: &str) -> Self {
        Self::HasOne(HasOneField {
            related_model: related_model.to_string(),
        })
    }

    /// Rows of `related_model` whose `related_field` points back here.
    #[must_use]
    pub fn has_many(related_model: &str, related_field: &str) -> Self {
        Self::HasMany(HasManyField {
            related_model: related_model.to_string(),
            related_field: related_field.to_string(),
        })
    }

    /// Marks a scalar field as required. No effect on relationships.
    #[must_use]
    pub fn required(mut self) -> Self {
        if let Self::Scalar(field) = &mut self {
            field.required = true;
        }
        self
    }

    /// Returns true for `hasOne` and `hasMany` fields.
    #[must_use]
    pub const fn is_relationship(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    /// Returns true if the field is stored in a column of the model's table.
    #[must_use]
    pub const fn has_column(&self) -> bool {
        !matches!(self, Self::HasMany(_))
    }

    /// Returns true for the primary key field.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        matches!(self, Self::Scalar(ScalarField { primary_key: true, .. }))
    }

    /// Returns the related model for relationship fields.
    #[must_use]
    pub fn related_model(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::HasOne(field) => Some(&field.related_model),
            Self::HasMany(field) => Some(&field.related_model),
        }
    }
}

/// Fields of one model, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSchema {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl ModelSchema {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: &str, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.to_string(), descriptor);
        self
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Iterates over all fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Iterates over `hasOne` and `hasMany` fields.
    pub fn relationships(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields().filter(|(_, field)| field.is_relationship())
    }

    /// Returns the name of the first primary key field.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.fields()
            .find(|(_, field)| field.is_primary_key())
            .map(|(name, _)| name)
    }
}

/// A set of models, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    models: BTreeMap<String, ModelSchema>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model.
    #[must_use]
    pub fn model(mut self, name: &str, model: ModelSchema) -> Self {
        self.models.insert(name.to_string(), model);
        self
    }

    /// Parses a schema document.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Looks up a model.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }

    /// Returns true if the schema declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Iterates over model names.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Returns true when no models are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Looks up a model or fails with `UnknownModel`.
    pub fn model_schema(&self, name: &str) -> Result<&ModelSchema, QueryError> {
        self.get(name)
            .ok_or_else(|| QueryError::UnknownModel(name.to_string()))
    }

    /// Looks up a field or fails with `UnknownModel` / `UnknownField`.
    pub fn field(&self, model: &str, field: &str) -> Result<&FieldDescriptor, QueryError> {
        self.model_schema(model)?
            .get(field)
            .ok_or_else(|| QueryError::UnknownField {
                model: model.to_string(),
                field: field.to_string(),
            })
    }

    /// Returns the primary key of `model`.
    pub fn primary_key(&self, model: &str) -> Result<&str, QueryError> {
        self.model_schema(model)?
            .primary_key()
            .ok_or_else(|| QueryError::MissingPrimaryKey(model.to_string()))
    }

    /// Prefixes every model name with `<namespace>_`, relationship targets included.
    #[must_use]
    pub fn namespaced(&self, namespace: &str) -> Self {
        let rename = |name: &str| format!("{namespace}_{name}");
        let models = self
            .models
            .iter()
            .map(|(name, model)| {
                let fields = model
                    .fields
                    .iter()
                    .map(|(field_name, field)| {
                        let field = match field {
                            FieldDescriptor::Scalar(scalar) => {
                                FieldDescriptor::Scalar(scalar.clone())
                            }
                            FieldDescriptor::HasOne(has_one) => {
                                FieldDescriptor::HasOne(HasOneField {
                                    related_model: rename(&has_one.related_model),
                                })
                            }
                            FieldDescriptor::HasMany(has_many) => {
                                FieldDescriptor::HasMany(HasManyField {
                                    related_model: rename(&has_many.related_model),
                                    related_field: has_many.related_field.clone(),
                                })
                            }
                        };
                        (field_name.clone(), field)
                    })
                    .collect();
                (rename(name), ModelSchema { fields })
            })
            .collect();
        Self { models }
    }

    /// Combines two schemas. Fails if any model name appears in both.
    pub fn merge(&self, other: &Schema) -> Result<Self, SchemaError> {
        let intersecting: Vec<String> = other
            .models
            .keys()
            .filter(|name| self.models.contains_key(*name))
            .cloned()
            .collect();
        if !intersecting.is_empty() {
            return Err(SchemaError::DuplicateModel(intersecting));
        }

        let mut models = self.models.clone();
        models.extend(other.models.clone());
        Ok(Self { models })
    }

    /// Checks primary keys and relationship targets.
    ///
    /// Every model needs exactly one primary key. Every relationship must
    /// target a declared model, and every `hasMany` must name a `hasOne` on
    /// the related model that points back.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (name, model) in &self.models {
            let keys: Vec<String> = model
                .fields()
                .filter(|(_, field)| field.is_primary_key())
                .map(|(field_name, _)| field_name.to_string())
                .collect();
            match keys.len() {
                0 => return Err(SchemaError::MissingPrimaryKey(name.clone())),
                1 => {}
                _ => {
                    return Err(SchemaError::MultiplePrimaryKeys {
                        model: name.clone(),
                        fields: keys,
                    })
                }
            }

            for (field_name, field) in model.relationships() {
                let Some(related) = field.related_model() else {
                    continue;
                };
                let Some(related_schema) = self.get(related) else {
                    return Err(SchemaError::UnknownRelatedModel {
                        model: name.clone(),
                        field: field_name.to_string(),
                        related: related.to_string(),
                    });
                };

                if let FieldDescriptor::HasMany(has_many) = field {
                    let points_back = matches!(
                        related_schema.get(&has_many.related_field),
                        Some(FieldDescriptor::HasOne(back)) if back.related_model == *name
                    );
                    if !points_back {
                        return Err(SchemaError::InvalidRelatedField {
                            model: name.clone(),
                            field: field_name.to_string(),
                            related: related.to_string(),
                            related_field: has_many.related_field.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
