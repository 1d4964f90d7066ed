//! Shaping of result sets into the forms callers ask for.

use std::collections::BTreeMap;

use jazzdb_core::{ResultSet, SqlValue};

/// One row keyed by column name.
pub type Row = BTreeMap<String, SqlValue>;

/// Rows returned by a projection or a raw statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Rows keyed by column name.
    Objects(Vec<Row>),
    /// Rows as positional arrays.
    Arrays(Vec<Vec<SqlValue>>),
    /// One value per row, for single-column flat results.
    Flat(Vec<SqlValue>),
}

impl Values {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Objects(rows) => rows.len(),
            Self::Arrays(rows) => rows.len(),
            Self::Flat(values) => values.len(),
        }
    }

    /// Returns true when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the rows when they are keyed by column name.
    #[must_use]
    pub fn into_objects(self) -> Option<Vec<Row>> {
        match self {
            Self::Objects(rows) => Some(rows),
            _ => None,
        }
    }

    /// Returns the values of a single-column flat result.
    #[must_use]
    pub fn into_flat(self) -> Option<Vec<SqlValue>> {
        match self {
            Self::Flat(values) => Some(values),
            _ => None,
        }
    }
}

/// Pairs every row with the column names.
pub(crate) fn objects(result: ResultSet) -> Vec<Row> {
    let ResultSet { columns, rows, .. } = result;
    rows.into_iter()
        .map(|row| columns.iter().cloned().zip(row).collect())
        .collect()
}

/// Shapes an array-mode result; single-column results become flat.
pub(crate) fn flat(result: ResultSet) -> Values {
    if result.rows.iter().all(|row| row.len() == 1) {
        Values::Flat(
            result
                .rows
                .into_iter()
                .filter_map(|row| row.into_iter().next())
                .collect(),
        )
    } else {
        Values::Arrays(result.rows)
    }
}
