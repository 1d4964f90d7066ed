//! Projections and aggregate functions for `values()` queries.

use super::path::ColumnRef;

/// Aggregate function applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// COUNT
    Count,
    /// MIN
    Min,
    /// MAX
    Max,
    /// AVG
    Average,
    /// SUM
    Sum,
}

impl AggregateFunction {
    /// Name used in default result names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Average => "average",
            Self::Sum => "sum",
        }
    }

    /// SQL function name.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Average => "AVG",
            Self::Sum => "SUM",
        }
    }
}

/// An aggregate over a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Function to apply.
    pub function: AggregateFunction,
    /// Path to aggregate; `None` only for `COUNT(*)`.
    pub path: Option<String>,
    /// Result column name; defaults to `<path>__<function>`.
    pub name: Option<String>,
}

impl Aggregate {
    fn on(function: AggregateFunction, path: &str) -> Self {
        Self {
            function,
            path: Some(path.to_string()),
            name: None,
        }
    }

    /// Creates a COUNT(*) aggregate.
    #[must_use]
    pub fn count_all() -> Self {
        Self {
            function: AggregateFunction::Count,
            path: None,
            name: None,
        }
    }

    /// Creates a COUNT(path) aggregate.
    #[must_use]
    pub fn count(path: &str) -> Self {
        Self::on(AggregateFunction::Count, path)
    }

    /// Creates a MIN(path) aggregate.
    #[must_use]
    pub fn min(path: &str) -> Self {
        Self::on(AggregateFunction::Min, path)
    }

    /// Creates a MAX(path) aggregate.
    #[must_use]
    pub fn max(path: &str) -> Self {
        Self::on(AggregateFunction::Max, path)
    }

    /// Creates an AVG(path) aggregate.
    #[must_use]
    pub fn average(path: &str) -> Self {
        Self::on(AggregateFunction::Average, path)
    }

    /// Creates a SUM(path) aggregate.
    #[must_use]
    pub fn sum(path: &str) -> Self {
        Self::on(AggregateFunction::Sum, path)
    }

    /// Sets the result column name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Returns the result column name.
    #[must_use]
    pub fn result_name(&self) -> String {
        match (&self.name, &self.path) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => format!("{path}__{}", self.function.name()),
            (None, None) => self.function.name().to_string(),
        }
    }
}

/// Convenience function to create a COUNT(*) aggregate.
#[must_use]
pub fn count_all() -> Aggregate {
    Aggregate::count_all()
}

/// Convenience function to create a COUNT(path) aggregate.
#[must_use]
pub fn count(path: &str) -> Aggregate {
    Aggregate::count(path)
}

/// Convenience function to create a MIN(path) aggregate.
#[must_use]
pub fn min(path: &str) -> Aggregate {
    Aggregate::min(path)
}

/// Convenience function to create a MAX(path) aggregate.
#[must_use]
pub fn max(path: &str) -> Aggregate {
    Aggregate::max(path)
}

/// Convenience function to create an AVG(path) aggregate.
#[must_use]
pub fn average(path: &str) -> Aggregate {
    Aggregate::average(path)
}

/// Convenience function to create a SUM(path) aggregate.
#[must_use]
pub fn sum(path: &str) -> Aggregate {
    Aggregate::sum(path)
}

/// An item requested from `values()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// A field path, returned under the path itself.
    Field(String),
    /// An aggregate; plain fields next to it form the GROUP BY set.
    Aggregate(Aggregate),
}

impl Projection {
    /// Creates a field projection.
    #[must_use]
    pub fn field(path: &str) -> Self {
        Self::Field(path.to_string())
    }
}

impl From<&str> for Projection {
    fn from(path: &str) -> Self {
        Self::field(path)
    }
}

impl From<String> for Projection {
    fn from(path: String) -> Self {
        Self::Field(path)
    }
}

impl From<Aggregate> for Projection {
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}

/// A projection resolved against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// A column, returned as `alias`.
    Field {
        /// Column to read.
        column: ColumnRef,
        /// Result name (the requested path).
        alias: String,
    },
    /// An aggregate, returned as `name`.
    Aggregate {
        /// Function to apply.
        function: AggregateFunction,
        /// Column, or `None` for `COUNT(*)`.
        column: Option<ColumnRef>,
        /// Result name.
        name: String,
    },
}

impl SelectItem {
    /// Returns true for aggregates.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate { .. })
    }
}

/// Result shaping options for `values()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValuesOptions {
    /// Return arrays instead of objects; single columns become a flat list.
    pub flat: bool,
    /// SELECT DISTINCT.
    pub distinct: bool,
}
