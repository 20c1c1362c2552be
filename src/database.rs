use tracing::trace;

use crate::connection::ConnectionProvider;
use crate::error::{SqlFacadeError, UnitOfWorkError};
use crate::executor;
use crate::results::ResultSnapshot;
use crate::transaction;
use crate::types::SqlParam;

/// Database facade over a connection provider.
///
/// Every self-acquiring operation checks out one connection, uses it serially and
/// releases it before returning. Build one at startup and share it by reference; the
/// facade holds no mutable state of its own.
///
/// ```rust,no_run
/// use sql_facade::prelude::*;
///
/// # fn demo() -> Result<(), SqlFacadeError> {
/// let config = DataSourceConfig::builder()
///     .driver("sqlite")
///     .connection_string("app.db")
///     .build()?;
/// let db = Database::from_config(&config)?;
///
/// let name = db.execute_query(
///     "SELECT name FROM users WHERE id = ?",
///     |rows| {
///         Ok(rows
///             .first()
///             .and_then(|row| row.get("name"))
///             .and_then(SqlValue::as_text)
///             .unwrap_or("unknown")
///             .to_string())
///     },
///     &params![7],
/// )?;
/// # let _ = name;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Database<P> {
    provider: P,
}

impl<P: ConnectionProvider> Database<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Check out a connection from the provider. Dropping it releases it.
    ///
    /// # Errors
    /// Returns a connectivity error if no connection can be obtained.
    pub fn get_connection(&self) -> Result<P::Connection, SqlFacadeError> {
        trace!("acquiring connection");
        self.provider.acquire()
    }

    /// See [`executor::execute_query`]; runs on its own connection, released before
    /// `processor` is invoked.
    ///
    /// # Errors
    /// Connectivity errors, plus those of [`executor::execute_query`].
    pub fn execute_query<T, F>(
        &self,
        sql: &str,
        processor: F,
        params: &[SqlParam],
    ) -> Result<T, SqlFacadeError>
    where
        F: FnOnce(ResultSnapshot) -> Result<T, SqlFacadeError>,
    {
        let snapshot = {
            let mut conn = self.get_connection()?;
            executor::execute_query(&mut conn, sql, Ok, params)?
        };
        processor(snapshot)
    }

    /// See [`executor::execute_update`].
    ///
    /// # Errors
    /// Connectivity errors, plus those of [`executor::execute_update`].
    pub fn execute_update(&self, sql: &str, params: &[SqlParam]) -> Result<u64, SqlFacadeError> {
        let mut conn = self.get_connection()?;
        executor::execute_update(&mut conn, sql, params)
    }

    /// See [`executor::execute_update_return_keys`]; the connection is released before
    /// `processor` is invoked.
    ///
    /// # Errors
    /// Connectivity errors, plus those of [`executor::execute_update_return_keys`].
    pub fn execute_update_return_keys<T, F>(
        &self,
        sql: &str,
        processor: F,
        params: &[SqlParam],
    ) -> Result<T, SqlFacadeError>
    where
        F: FnOnce(ResultSnapshot) -> Result<T, SqlFacadeError>,
    {
        let keys = {
            let mut conn = self.get_connection()?;
            executor::execute_update_return_keys(&mut conn, sql, Ok, params)?
        };
        processor(keys)
    }

    /// Batch update on a caller-supplied connection, usually one handed to a unit of
    /// work. See [`executor::execute_batch_update`].
    ///
    /// # Errors
    /// As [`executor::execute_batch_update`].
    pub fn db_execute_batch_update<S>(
        &self,
        conn: &mut P::Connection,
        sql: &str,
        batch: &[S],
    ) -> Result<Vec<u64>, SqlFacadeError>
    where
        S: AsRef<[SqlParam]>,
    {
        executor::execute_batch_update(conn, sql, batch)
    }

    /// See [`transaction::execute_void_transaction`].
    ///
    /// # Errors
    /// As [`transaction::execute_void_transaction`].
    pub fn execute_void_transaction<F>(&self, work: F) -> Result<(), SqlFacadeError>
    where
        F: FnOnce(&mut P::Connection) -> Result<(), UnitOfWorkError>,
    {
        transaction::execute_void_transaction(&self.provider, work)
    }

    /// See [`transaction::execute_return_transaction`].
    ///
    /// # Errors
    /// As [`transaction::execute_return_transaction`].
    pub fn execute_return_transaction<T, F>(&self, work: F) -> Result<T, SqlFacadeError>
    where
        F: FnOnce(&mut P::Connection) -> Result<T, UnitOfWorkError>,
    {
        transaction::execute_return_transaction(&self.provider, work)
    }
}

#[cfg(feature = "sqlite")]
mod instance {
    use std::sync::{Mutex, OnceLock, PoisonError};

    use tracing::debug;

    use super::Database;
    use crate::config::DataSourceConfig;
    use crate::error::SqlFacadeError;
    use crate::sqlite::SqlitePool;

    static INSTANCE: OnceLock<Database<SqlitePool>> = OnceLock::new();
    static INIT_LOCK: Mutex<()> = Mutex::new(());

    impl Database<SqlitePool> {
        /// Build a facade from a data source configuration.
        ///
        /// # Errors
        /// `ConfigError` for a missing or unknown driver or connection string,
        /// `InitializationError` if the pool cannot be created.
        pub fn from_config(config: &DataSourceConfig) -> Result<Self, SqlFacadeError> {
            Ok(Self::new(SqlitePool::from_config(config)?))
        }

        /// The process-wide facade, built from `config` by the first caller.
        ///
        /// Later calls return the existing instance and ignore their `config`.
        /// Concurrent first callers serialize on the construction; once built, lookups
        /// take no lock.
        ///
        /// # Errors
        /// As [`Database::from_config`]; a failed construction leaves no instance behind
        /// so a later call may retry.
        pub fn instance(config: &DataSourceConfig) -> Result<&'static Self, SqlFacadeError> {
            if let Some(db) = INSTANCE.get() {
                return Ok(db);
            }
            let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(db) = INSTANCE.get() {
                return Ok(db);
            }
            debug!(driver = %config.driver, "building process-wide database facade");
            let db = Self::from_config(config)?;
            Ok(INSTANCE.get_or_init(|| db))
        }
    }
}
