//! Capabilities the facade consumes from a driver.
//!
//! A [`ConnectionProvider`] hands out connections; a [`DbConnection`] prepares
//! statements and carries the auto-commit flag; a [`PreparedStatement`] accepts
//! positional bindings and executes. Release is `Drop`: a statement borrows its
//! connection, so it is always dropped first.

use crate::error::SqlFacadeError;
use crate::params::ParameterSink;
use crate::results::ResultSnapshot;

/// Whether a statement should make database-generated keys available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    #[default]
    NoGeneratedKeys,
    ReturnGeneratedKeys,
}

/// A prepared statement with positional placeholders.
pub trait PreparedStatement: ParameterSink {
    /// Execute as a query and copy every row into a snapshot before returning.
    ///
    /// # Errors
    /// Returns `SqlFacadeError` if execution or reading a row fails.
    fn execute_query(&mut self) -> Result<ResultSnapshot, SqlFacadeError>;

    /// Execute as an update and return the driver-reported affected row count.
    ///
    /// # Errors
    /// Returns `SqlFacadeError` if execution fails.
    fn execute_update(&mut self) -> Result<u64, SqlFacadeError>;

    /// Keys generated by the last update, as a snapshot.
    ///
    /// # Errors
    /// Returns `SqlFacadeError` if the statement was not prepared with
    /// [`KeyMode::ReturnGeneratedKeys`] or the keys cannot be read.
    fn generated_keys(&mut self) -> Result<ResultSnapshot, SqlFacadeError>;

    /// Queue the currently bound parameters as one batch entry.
    ///
    /// # Errors
    /// Returns `SqlFacadeError` if the statement cannot accept batch entries.
    fn add_batch(&mut self) -> Result<(), SqlFacadeError>;

    /// Execute every queued entry in order and return their update counts.
    ///
    /// # Errors
    /// Returns the first failure the driver reports.
    fn execute_batch(&mut self) -> Result<Vec<u64>, SqlFacadeError>;
}

/// A live, single-owner database session.
pub trait DbConnection {
    type Statement<'c>: PreparedStatement
    where
        Self: 'c;

    /// # Errors
    /// Returns `SqlFacadeError` if the SQL cannot be prepared.
    fn prepare(&mut self, sql: &str, keys: KeyMode)
    -> Result<Self::Statement<'_>, SqlFacadeError>;

    fn auto_commit(&self) -> bool;

    /// # Errors
    /// Returns `SqlFacadeError` if the driver rejects the mode change.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlFacadeError>;

    /// # Errors
    /// Returns `SqlFacadeError` if auto-commit is on or the commit fails.
    fn commit(&mut self) -> Result<(), SqlFacadeError>;

    /// # Errors
    /// Returns `SqlFacadeError` if auto-commit is on or the rollback fails.
    fn rollback(&mut self) -> Result<(), SqlFacadeError>;
}

/// Source of connections, typically a pool.
pub trait ConnectionProvider: Send + Sync {
    type Connection: DbConnection;

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns a connectivity error when no connection can be obtained.
    fn acquire(&self) -> Result<Self::Connection, SqlFacadeError>;
}
