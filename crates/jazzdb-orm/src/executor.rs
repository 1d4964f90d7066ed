//! Where statements run: the pool or an open transaction.

use std::fmt;
use std::sync::Arc;

use jazzdb_core::{Connection, Fragment, ResultSet, RowMode};

use crate::error::Result;
use crate::transaction::Transaction;
use crate::values::{self, Row, Values};

/// Result shape for raw SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawMode {
    /// Rows keyed by column name.
    #[default]
    Object,
    /// Rows as positional arrays.
    Array,
    /// Arrays, flattened to values when each row has one column.
    Flat,
}

#[derive(Clone)]
pub(crate) enum Executor {
    Database(Arc<dyn Connection>),
    Transaction(Transaction),
}

impl Executor {
    pub(crate) async fn run(&self, fragment: &Fragment, mode: RowMode) -> Result<ResultSet> {
        match self {
            Self::Database(connection) => {
                let statement = fragment.to_statement(connection.dialect());
                Ok(connection.execute(&statement, mode).await?)
            }
            Self::Transaction(transaction) => transaction.run(fragment, mode).await,
        }
    }

    pub(crate) async fn rows(&self, fragment: &Fragment) -> Result<Vec<Row>> {
        let result = self.run(fragment, RowMode::Object).await?;
        Ok(values::objects(result))
    }

    pub(crate) async fn raw(&self, fragment: &Fragment, mode: RawMode) -> Result<Values> {
        Ok(match mode {
            RawMode::Object => Values::Objects(self.rows(fragment).await?),
            RawMode::Array => Values::Arrays(self.run(fragment, RowMode::Array).await?.rows),
            RawMode::Flat => values::flat(self.run(fragment, RowMode::Array).await?),
        })
    }

    pub(crate) async fn affected(&self, fragment: &Fragment) -> Result<u64> {
        Ok(self.run(fragment, RowMode::Count).await?.rows_affected)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(connection) => f
                .debug_tuple("Database")
                .field(&connection.name())
                .finish(),
            Self::Transaction(transaction) => {
                f.debug_tuple("Transaction").field(transaction).finish()
            }
        }
    }
}
