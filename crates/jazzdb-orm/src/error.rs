//! Error types for the ORM.

use jazzdb_core::{ConnectionError, QueryError, SchemaError};
use thiserror::Error;

/// Setup-time failures, raised when a database or schema is registered.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A model name collides with a name the database handle reserves.
    #[error("model name `{0}` is reserved")]
    ReservedName(String),

    /// A database was already created under this name.
    #[error("a database named `{0}` already exists")]
    DuplicateDatabase(String),

    /// No database was created under this name.
    #[error("no database named `{0}`")]
    UnknownDatabase(String),

    /// No registered backend claimed the connection string.
    #[error("no backend found for the given connection string")]
    NoBackendFound,

    /// The schema is inconsistent or collides with a registered one.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A record failed field-level validation before saving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value at `{path}`: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, starting at the saved model.
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Setup error.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The query could not be built or rendered.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// A record failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transaction already committed or rolled back.
    #[error("transaction has already been committed or rolled back")]
    TransactionFinalized,

    /// The backend failed to run a statement.
    #[error("database error: {0}")]
    Backend(#[from] ConnectionError),
}

impl From<SchemaError> for OrmError {
    fn from(err: SchemaError) -> Self {
        Self::Configuration(ConfigError::Schema(err))
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
