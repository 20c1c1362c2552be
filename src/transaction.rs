//! Transaction-scoped execution with automatic commit or rollback.
//!
//! One call runs one unit of work on one connection:
//!
//! ```text
//! Acquired -> InProgress -> Committed | RolledBack -> Released
//! ```
//!
//! Auto-commit is switched off before the unit of work runs and switched back on
//! before the connection is released, whatever the outcome. A panicking unit of
//! work is rolled back by the scope guard while the panic unwinds.

use tracing::{debug, warn};

use crate::connection::{ConnectionProvider, DbConnection};
use crate::error::{SqlFacadeError, UnitOfWorkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    InProgress,
    Committed,
    RolledBack,
}

/// Owns the InProgress..RolledBack/Committed span for one connection.
struct TransactionScope<'c, C: DbConnection> {
    conn: &'c mut C,
    state: TxState,
    restored: bool,
}

impl<'c, C: DbConnection> TransactionScope<'c, C> {
    fn begin(conn: &'c mut C) -> Result<Self, SqlFacadeError> {
        conn.set_auto_commit(false)?;
        Ok(Self {
            conn,
            state: TxState::InProgress,
            restored: false,
        })
    }

    fn connection(&mut self) -> &mut C {
        self.conn
    }

    fn commit(&mut self) -> Result<(), SqlFacadeError> {
        self.conn.commit()?;
        self.state = TxState::Committed;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlFacadeError> {
        // one attempt, even if it fails
        self.state = TxState::RolledBack;
        self.conn.rollback()
    }

    fn restore_auto_commit(mut self) -> Result<(), SqlFacadeError> {
        self.restored = true;
        self.conn.set_auto_commit(true)
    }
}

impl<C: DbConnection> Drop for TransactionScope<'_, C> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if self.state == TxState::InProgress {
            if let Err(err) = self.conn.rollback() {
                warn!(error = %err, "rollback during unwind failed");
            }
        }
        if let Err(err) = self.conn.set_auto_commit(true) {
            warn!(error = %err, "restoring auto-commit during unwind failed");
        }
    }
}

/// Run `work` inside a transaction on an already acquired connection.
///
/// On success the transaction is committed and `work`'s value returned. If `work` or
/// the commit fails, the transaction is rolled back and the failure returned: database
/// errors as they are, anything else wrapped in [`SqlFacadeError::Transaction`]. If the
/// rollback fails too, [`SqlFacadeError::RollbackFailed`] carries both errors; if
/// auto-commit then cannot be switched back on, [`SqlFacadeError::AutoCommitNotRestored`]
/// wraps that as well. Restoring auto-commit is attempted on every path.
///
/// # Errors
/// See above; also fails if auto-commit cannot be disabled (nothing ran) or, after a
/// successful commit, cannot be re-enabled.
pub fn run_in_transaction<C, T, F>(conn: &mut C, work: F) -> Result<T, SqlFacadeError>
where
    C: DbConnection,
    F: FnOnce(&mut C) -> Result<T, UnitOfWorkError>,
{
    let mut scope = TransactionScope::begin(conn)?;
    let outcome = work(scope.connection()).and_then(|value| {
        scope.commit()?;
        Ok(value)
    });

    match outcome {
        Ok(value) => {
            debug!("transaction committed");
            scope.restore_auto_commit()?;
            Ok(value)
        }
        Err(failure) => {
            let original = failure.into_database_error();
            let rolled_back = scope.rollback();
            let restored = scope.restore_auto_commit();
            let err = match rolled_back {
                Ok(()) => {
                    debug!(error = %original, "transaction rolled back");
                    original
                }
                Err(rollback_err) => {
                    warn!(error = %rollback_err, original = %original, "rollback failed");
                    SqlFacadeError::RollbackFailed {
                        original: Box::new(original),
                        source: Box::new(rollback_err),
                    }
                }
            };
            match restored {
                Ok(()) => Err(err),
                Err(restore_err) => {
                    warn!(error = %restore_err, "restoring auto-commit after rollback failed");
                    Err(SqlFacadeError::AutoCommitNotRestored {
                        original: Box::new(err),
                        source: Box::new(restore_err),
                    })
                }
            }
        }
    }
}

/// Acquire a connection from `provider` and run a side-effecting unit of work in a
/// transaction.
///
/// # Errors
/// A connectivity error if no connection can be acquired; otherwise as
/// [`run_in_transaction`].
pub fn execute_void_transaction<P, F>(provider: &P, work: F) -> Result<(), SqlFacadeError>
where
    P: ConnectionProvider,
    F: FnOnce(&mut P::Connection) -> Result<(), UnitOfWorkError>,
{
    let mut conn = provider.acquire()?;
    run_in_transaction(&mut conn, work)
}

/// Acquire a connection from `provider` and run a value-producing unit of work in a
/// transaction, returning exactly the value it produced.
///
/// # Errors
/// A connectivity error if no connection can be acquired; otherwise as
/// [`run_in_transaction`].
pub fn execute_return_transaction<P, T, F>(provider: &P, work: F) -> Result<T, SqlFacadeError>
where
    P: ConnectionProvider,
    F: FnOnce(&mut P::Connection) -> Result<T, UnitOfWorkError>,
{
    let mut conn = provider.acquire()?;
    run_in_transaction(&mut conn, work)
}
