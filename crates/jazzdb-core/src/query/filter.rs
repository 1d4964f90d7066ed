//! Filter maps.
//!
//! A [`Filter`] maps `path[__operator]` keys to values and holds when every
//! entry holds. A list of filters holds when any of them does.
//!
//! ```
//! use jazzdb_core::{filter, query::Filter};
//!
//! let older = filter! { "age__gte" => 10, "class__name" => "Year 3" };
//! let same = Filter::new().with("age__gte", 10).with("class__name", "Year 3");
//! assert_eq!(older, same);
//! ```

use std::collections::BTreeMap;

use crate::value::SqlValue;

/// Right-hand side of a filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A plain value.
    Value(SqlValue),
    /// A record; its primary key is compared.
    Object(BTreeMap<String, SqlValue>),
}

crate::impl_from_scalars!(FilterValue, FilterValue::Value);

impl From<BTreeMap<String, SqlValue>> for FilterValue {
    fn from(object: BTreeMap<String, SqlValue>) -> Self {
        Self::Object(object)
    }
}

/// Ordered `key -> value` entries combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, FilterValue)>,
}

impl Filter {
    /// Creates an empty filter, which matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<FilterValue>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    /// Returns true when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Argument of a single `filter()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    /// Every entry must hold.
    All(Filter),
    /// Any of the filters must hold.
    Any(Vec<Filter>),
}

impl From<Filter> for FilterInput {
    fn from(filter: Filter) -> Self {
        Self::All(filter)
    }
}

impl From<Vec<Filter>> for FilterInput {
    fn from(filters: Vec<Filter>) -> Self {
        Self::Any(filters)
    }
}

impl<const N: usize> From<[Filter; N]> for FilterInput {
    fn from(filters: [Filter; N]) -> Self {
        Self::Any(filters.into())
    }
}

impl FilterInput {
    pub(crate) fn into_filters(self) -> Vec<Filter> {
        match self {
            Self::All(filter) => vec![filter],
            Self::Any(filters) => filters,
        }
    }
}

/// Builds a [`Filter`](crate::query::Filter) from `key => value` pairs.
#[macro_export]
macro_rules! filter {
    () => {
        $crate::query::Filter::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::query::Filter::new()$(.with($key, $value))+
    };
}
