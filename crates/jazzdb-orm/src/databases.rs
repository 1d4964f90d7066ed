//! Named database handles.

use std::collections::HashMap;

use jazzdb_core::schema::Schema;

use crate::backend::BackendRegistry;
use crate::database::Database;
use crate::error::{ConfigError, Result};

/// Name used when none is given.
pub const DEFAULT_DATABASE: &str = "default";

/// A set of databases addressed by name.
///
/// Create one per application (or per test) and pass it to whatever needs a
/// database.
///
/// ```ignore
/// let mut databases = Databases::new(BackendRegistry::with_defaults());
/// databases.create("sqlite::memory:", None)?;
/// databases.add_schema(schema, Some("school"), None)?;
/// let db = databases.get(None)?;
/// ```
#[derive(Debug, Default)]
pub struct Databases {
    registry: BackendRegistry,
    databases: HashMap<String, Database>,
}

impl Databases {
    /// Creates an empty set using `registry` to open connections.
    #[must_use]
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry,
            databases: HashMap::new(),
        }
    }

    /// Connects and stores a database under `name`.
    pub fn create(&mut self, connection_string: &str, name: Option<&str>) -> Result<Database> {
        let name = name.unwrap_or(DEFAULT_DATABASE);
        if self.databases.contains_key(name) {
            return Err(ConfigError::DuplicateDatabase(name.to_string()).into());
        }

        let database = Database::connect(&self.registry, connection_string)?;
        self.databases.insert(name.to_string(), database.clone());
        Ok(database)
    }

    /// Registers a schema on the named database.
    ///
    /// With a namespace, every model is registered as `<namespace>_<model>`.
    pub fn add_schema(
        &self,
        schema: Schema,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<()> {
        let schema = match namespace {
            Some(namespace) => schema.namespaced(namespace),
            None => schema,
        };
        self.get(name)?.add_schema(schema)
    }

    /// Returns the named database.
    pub fn get(&self, name: Option<&str>) -> Result<Database> {
        let name = name.unwrap_or(DEFAULT_DATABASE);
        self.databases
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDatabase(name.to_string()).into())
    }

    /// Closes every database and forgets them.
    pub async fn end(&mut self) {
        for (_, database) in self.databases.drain() {
            database.end().await;
        }
    }
}
