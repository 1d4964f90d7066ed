//! SQL Dialect support.
//!
//! Rendered queries only differ between databases in how parameters are
//! written. Identifiers are always double-quoted, which every supported
//! database accepts.

mod generic;

pub use generic::GenericDialect;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the placeholder for the parameter at `index` (zero-based).
    fn placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }
}
