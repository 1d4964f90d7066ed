//! Error types for schema registration, query building and execution.

use thiserror::Error;

use crate::query::Operator;

/// Errors raised while building or rendering a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The model is not part of the schema.
    #[error("unknown model `{0}`")]
    UnknownModel(String),

    /// The field does not exist on the model.
    #[error("key `{field}` does not exist on model `{model}`")]
    UnknownField {
        /// Model the lookup ran against.
        model: String,
        /// Field that was not found.
        field: String,
    },

    /// A non-terminal path segment is not a relationship field.
    #[error("expected field `{field}` on model `{model}` to be a related field")]
    NotARelationship {
        /// Model owning the field.
        model: String,
        /// Scalar field used as a path segment.
        field: String,
    },

    /// The model has no primary key, so relations to it cannot be resolved.
    #[error("model `{0}` has no primary key")]
    MissingPrimaryKey(String),

    /// The operator is not allowed on a relationship field.
    #[error("operator `{operator}` is not allowed on relationship `{path}`")]
    InvalidFilterOperator {
        /// Filter key as written by the caller.
        path: String,
        /// Offending operator.
        operator: Operator,
    },

    /// The value cannot be used with the operator.
    #[error("invalid value for `{path}`: {reason}")]
    InvalidFilterValue {
        /// Filter key as written by the caller.
        path: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A query option combination is not allowed.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Sort order other than `asc` / `desc`.
    #[error("expected sort order of 'asc' or 'desc' but got `{0}`")]
    InvalidOrderDirection(String),

    /// An update targets a field with no column of its own.
    #[error("field `{field}` on model `{model}` cannot be written")]
    NotWritable {
        /// Model being updated.
        model: String,
        /// Field without a column.
        field: String,
    },

    /// A SQL template has a different number of `{}` markers than values.
    #[error("sql template has {placeholders} placeholders but {values} values were given")]
    PlaceholderMismatch {
        /// Number of `{}` markers in the template.
        placeholders: usize,
        /// Number of values supplied.
        values: usize,
    },
}

/// Errors raised when a schema is built, loaded or registered.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two schemas declare the same model.
    #[error("failed to add schema, the intersecting keys are {}", .0.join(", "))]
    DuplicateModel(Vec<String>),

    /// A model declares no primary key.
    #[error("failed to find primary key on model `{0}`")]
    MissingPrimaryKey(String),

    /// A model declares more than one primary key.
    #[error("model `{model}` declares more than one primary key: {}", .fields.join(", "))]
    MultiplePrimaryKeys {
        /// Model with the conflict.
        model: String,
        /// All fields marked as primary key.
        fields: Vec<String>,
    },

    /// A relationship points at a model that does not exist.
    #[error("field `{model}.{field}` relates to unknown model `{related}`")]
    UnknownRelatedModel {
        /// Model owning the relationship.
        model: String,
        /// Relationship field.
        field: String,
        /// Missing target model.
        related: String,
    },

    /// A `hasMany` relation names a field that is not a `hasOne` pointing back.
    #[error("field `{model}.{field}` expects `{related}.{related_field}` to be a hasOne relation back to `{model}`")]
    InvalidRelatedField {
        /// Model owning the `hasMany` field.
        model: String,
        /// The `hasMany` field.
        field: String,
        /// Target model.
        related: String,
        /// Declared foreign-key field on the target model.
        related_field: String,
    },

    /// The schema document could not be parsed.
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a database driver.
///
/// The message comes from the driver; callers receive it unchanged and no
/// retry is attempted.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConnectionError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping a driver error.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type alias for query building.
pub type Result<T> = std::result::Result<T, QueryError>;
