//! Ordering specifications.

use std::str::FromStr;

use super::path::ColumnRef;
use crate::error::QueryError;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending order (ASC)
    #[default]
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(QueryError::InvalidOrderDirection(s.to_string())),
        }
    }
}

/// An ordering request on a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field path.
    pub path: String,
    /// Direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    #[must_use]
    pub fn asc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            direction: Direction::Asc,
        }
    }

    /// Creates a new descending order specification.
    #[must_use]
    pub fn desc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            direction: Direction::Desc,
        }
    }

    /// Creates an order specification from a direction string (`asc` / `desc`).
    pub fn with_direction(path: &str, direction: &str) -> Result<Self, QueryError> {
        Ok(Self {
            path: path.to_string(),
            direction: direction.parse()?,
        })
    }

    /// Parses an order specification; a `-` prefix means descending.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(path) => Self::desc(path),
            None => Self::asc(spec),
        }
    }
}

impl From<&str> for OrderBy {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl From<(&str, Direction)> for OrderBy {
    fn from((path, direction): (&str, Direction)) -> Self {
        Self {
            path: path.to_string(),
            direction,
        }
    }
}

/// An ordering resolved against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    /// Column to sort on.
    pub column: ColumnRef,
    /// Direction.
    pub direction: Direction,
}
