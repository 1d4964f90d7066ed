//! Nested transactions over one checked-out connection.
//!
//! A transaction starts at level 1 with `BEGIN`. Each checkpoint issues
//! `SAVEPOINT save_<level>` and raises the level. Commit and rollback lower
//! it again; at level 0 the physical transaction ends and the connection is
//! released. Every later call fails with [`OrmError::TransactionFinalized`].
//!
//! | level | commit | rollback |
//! |-------|--------|----------|
//! | 1 | `COMMIT`, release | `ROLLBACK`, release |
//! | n > 1 | no SQL | `ROLLBACK TO save_<n-1>` |

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use jazzdb_core::schema::Schema;
use jazzdb_core::{Connection, Fragment, ResultSet, RowMode, Session, Statement};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{OrmError, Result};
use crate::executor::{Executor, RawMode};
use crate::manager::ModelHandle;
use crate::values::{Row, Values};

struct State {
    level: u32,
    /// `None` once finalized.
    session: Option<Box<dyn Session>>,
}

impl State {
    fn session(&mut self) -> Result<&mut Box<dyn Session>> {
        self.session.as_mut().ok_or(OrmError::TransactionFinalized)
    }

    async fn control(&mut self, sql: &str) -> Result<()> {
        let statement = Statement {
            sql: sql.to_string(),
            params: Vec::new(),
        };
        self.session()?.execute(&statement, RowMode::Count).await?;
        Ok(())
    }

    async fn finish(&mut self, sql: &str) -> Result<()> {
        self.control(sql).await?;
        self.level = 0;
        if let Some(session) = self.session.take() {
            session.release().await;
        }
        Ok(())
    }
}

struct Inner {
    connection: Arc<dyn Connection>,
    schema: Arc<Schema>,
    /// Serializes statements on the shared connection.
    state: Mutex<State>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let Some(mut session) = state.session.take() else {
            return;
        };
        warn!(level = state.level, "Transaction dropped while open, rolling back");

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let statement = Statement {
                    sql: "ROLLBACK".to_string(),
                    params: Vec::new(),
                };
                if let Err(err) = session.execute(&statement, RowMode::Count).await {
                    warn!(error = %err, "Rollback of dropped transaction failed");
                }
                session.release().await;
            });
        }
    }
}

/// An open transaction.
///
/// Clones share the transaction; a checkpoint made through one clone is
/// visible through all of them.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Inner>,
}

impl Transaction {
    /// Checks out a connection and issues `BEGIN`.
    pub(crate) async fn open(connection: Arc<dyn Connection>, schema: Arc<Schema>) -> Result<Self> {
        let mut session = connection.acquire().await?;
        let begin = Statement {
            sql: "BEGIN".to_string(),
            params: Vec::new(),
        };
        if let Err(err) = session.execute(&begin, RowMode::Count).await {
            session.release().await;
            return Err(err.into());
        }

        info!(database = connection.name(), "Transaction started");
        Ok(Self {
            inner: Arc::new(Inner {
                connection,
                schema,
                state: Mutex::new(State {
                    level: 1,
                    session: Some(session),
                }),
            }),
        })
    }

    pub(crate) async fn run(&self, fragment: &Fragment, mode: RowMode) -> Result<ResultSet> {
        let statement = fragment.to_statement(self.inner.connection.dialect());
        let mut state = self.inner.state.lock().await;
        Ok(state.session()?.execute(&statement, mode).await?)
    }

    fn executor(&self) -> Executor {
        Executor::Transaction(self.clone())
    }

    /// Current nesting level; 0 once finalized.
    pub async fn level(&self) -> u32 {
        self.inner.state.lock().await.level
    }

    /// Returns true once committed or rolled back to level 0.
    pub async fn is_complete(&self) -> bool {
        self.inner.state.lock().await.session.is_none()
    }

    /// Returns a handle for one model, running inside this transaction.
    pub fn model(&self, name: &str) -> Result<ModelHandle> {
        ModelHandle::new(name, Arc::clone(&self.inner.schema), self.executor())
    }

    /// Runs raw SQL, returning rows keyed by column name.
    pub async fn sql(&self, fragment: Fragment) -> Result<Vec<Row>> {
        self.executor().rows(&fragment).await
    }

    /// Runs raw SQL, shaping rows as requested.
    pub async fn sql_as(&self, fragment: Fragment, mode: RawMode) -> Result<Values> {
        self.executor().raw(&fragment, mode).await
    }

    /// Runs raw SQL, returning the number of affected rows.
    pub async fn execute(&self, fragment: Fragment) -> Result<u64> {
        self.executor().affected(&fragment).await
    }

    /// Creates a savepoint and raises the level.
    ///
    /// Returns a handle to the same transaction.
    pub async fn checkpoint(&self) -> Result<Self> {
        let mut state = self.inner.state.lock().await;
        let savepoint = format!("SAVEPOINT save_{}", state.level);
        state.control(&savepoint).await?;
        state.level += 1;
        Ok(self.clone())
    }

    /// Lowers the level, committing at level 1.
    pub async fn commit(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.session()?;
        if state.level > 1 {
            state.level -= 1;
            return Ok(());
        }
        state.finish("COMMIT").await?;
        info!("Transaction committed");
        Ok(())
    }

    /// Lowers the level, undoing work since the last checkpoint.
    ///
    /// At level 1 the whole transaction is rolled back.
    pub async fn rollback(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.session()?;
        if state.level > 1 {
            let level = state.level - 1;
            state.control(&format!("ROLLBACK TO save_{level}")).await?;
            state.level = level;
            return Ok(());
        }
        state.finish("ROLLBACK").await?;
        info!("Transaction rolled back");
        Ok(())
    }

    /// Commits regardless of the current level.
    pub async fn commit_all(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.finish("COMMIT").await?;
        info!("Transaction committed");
        Ok(())
    }

    /// Rolls back regardless of the current level.
    pub async fn rollback_all(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.finish("ROLLBACK").await?;
        info!("Transaction rolled back");
        Ok(())
    }

    /// Runs `callback` inside a checkpoint.
    ///
    /// The checkpoint is committed when the callback succeeds and rolled back
    /// when it fails, in which case the callback's error is returned. If the
    /// callback already closed the checkpoint itself, nothing more is done.
    pub async fn transaction<F, Fut, T>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let nested = self.checkpoint().await?;
        let level = nested.level().await;
        match callback(nested).await {
            Ok(value) => {
                self.close_checkpoint(level, true).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.close_checkpoint(level, false).await {
                    warn!(error = %rollback, "Rollback after failed callback failed");
                }
                Err(err)
            }
        }
    }

    /// Returns to the level below `level` if the transaction is still at or
    /// above it, committing or rolling back everything since that savepoint.
    async fn close_checkpoint(&self, level: u32, commit: bool) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.session.is_none() || state.level < level {
            return Ok(());
        }
        let below = level.saturating_sub(1);
        if !commit {
            state.control(&format!("ROLLBACK TO save_{below}")).await?;
        }
        state.level = below;
        Ok(())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("database", &self.inner.connection.name())
            .finish_non_exhaustive()
    }
}

/// Runs `callback` in a new transaction, then commits or rolls back fully.
pub(crate) async fn run_in_transaction<F, Fut, T>(transaction: Transaction, callback: F) -> Result<T>
where
    F: FnOnce(Transaction) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match callback(transaction.clone()).await {
        Ok(value) => {
            if !transaction.is_complete().await {
                transaction.commit_all().await?;
            }
            Ok(value)
        }
        Err(err) => {
            if !transaction.is_complete().await {
                if let Err(rollback) = transaction.rollback_all().await {
                    warn!(error = %rollback, "Rollback after failed callback failed");
                }
            }
            Err(err)
        }
    }
}
