//! Pool configuration.

/// Options applied when a SQLite pool is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Pool size for file databases. In-memory databases always use one
    /// connection so every query sees the same data.
    pub max_connections: u32,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

impl SqliteConfig {
    /// Sets the pool size.
    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets whether a missing database file is created.
    #[must_use]
    pub fn create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }
}

/// Returns true for connection strings naming an in-memory database.
#[must_use]
pub fn is_in_memory(connection_string: &str) -> bool {
    let lower = connection_string.to_ascii_lowercase();
    lower.contains(":memory:") || lower.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SqliteConfig::default();
        assert_eq!(config.max_connections, 5);
        assert!(config.create_if_missing);
        assert_eq!(config.max_connections(1).max_connections, 1);
    }

    #[test]
    fn test_is_in_memory() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://school.db"));
    }
}
