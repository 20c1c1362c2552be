use std::fmt;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use r2d2_sqlite::rusqlite;
use tracing::{trace, warn};

use crate::connection::{DbConnection, KeyMode};
use crate::error::SqlFacadeError;

use super::prepared::SqliteStatement;

/// Pooled `SQLite` connection with driver-style auto-commit.
///
/// Auto-commit off does not open a transaction by itself: `BEGIN` is issued lazily
/// when the next statement is prepared. Turning auto-commit back on while a
/// transaction is open commits it, unless the last rollback failed: then the
/// transaction is rolled back instead and never committed. Dropping the connection
/// with a transaction still open rolls it back before the connection goes back to
/// the pool.
pub struct SqliteConnection {
    conn: PooledConnection<SqliteConnectionManager>,
    auto_commit: bool,
    rollback_pending: bool,
}

impl SqliteConnection {
    pub(crate) fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self {
            conn,
            auto_commit: true,
            rollback_pending: false,
        }
    }

    /// Whether a transaction is currently open on the underlying connection.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Run one or more `;`-separated statements without parameters (DDL, pragmas).
    ///
    /// # Errors
    /// Returns `SqlFacadeError::SqliteError` if any statement fails.
    pub fn execute_script(&mut self, sql: &str) -> Result<(), SqlFacadeError> {
        self.begin_if_needed()?;
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the raw `rusqlite` connection for features the facade does not expose.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    fn begin_if_needed(&mut self) -> Result<(), SqlFacadeError> {
        if !self.auto_commit && self.conn.is_autocommit() {
            trace!("BEGIN");
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn ensure_manual_commit(&self, op: &str) -> Result<(), SqlFacadeError> {
        if self.auto_commit {
            return Err(SqlFacadeError::ExecutionError(format!(
                "cannot {op} while auto-commit is enabled"
            )));
        }
        Ok(())
    }
}

impl DbConnection for SqliteConnection {
    type Statement<'c> = SqliteStatement<'c>;

    fn prepare(&mut self, sql: &str, keys: KeyMode) -> Result<SqliteStatement<'_>, SqlFacadeError> {
        self.begin_if_needed()?;
        let conn: &rusqlite::Connection = &self.conn;
        let stmt = conn.prepare(sql)?;
        Ok(SqliteStatement::new(stmt, conn, keys))
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlFacadeError> {
        if enabled && self.in_transaction() {
            if self.rollback_pending {
                trace!("ROLLBACK (auto-commit re-enabled after failed rollback)");
                self.conn.execute_batch("ROLLBACK")?;
            } else {
                trace!("COMMIT (auto-commit re-enabled)");
                self.conn.execute_batch("COMMIT")?;
            }
        }
        self.rollback_pending = false;
        self.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlFacadeError> {
        self.ensure_manual_commit("commit")?;
        if self.in_transaction() {
            trace!("COMMIT");
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlFacadeError> {
        self.ensure_manual_commit("roll back")?;
        if self.in_transaction() {
            trace!("ROLLBACK");
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                // the open transaction must not be committed later
                self.rollback_pending = true;
                return Err(err.into());
            }
        }
        self.rollback_pending = false;
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if self.in_transaction() {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "rollback of abandoned transaction failed");
            }
        }
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("auto_commit", &self.auto_commit)
            .field("in_transaction", &self.in_transaction())
            .field("rollback_pending", &self.rollback_pending)
            .finish()
    }
}
