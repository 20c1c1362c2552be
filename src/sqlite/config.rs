use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, trace};

use crate::config::DataSourceConfig;
use crate::connection::ConnectionProvider;
use crate::error::SqlFacadeError;
use crate::types::DatabaseType;

use super::connection::SqliteConnection;

/// Pragmas applied to every connection the pool opens.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

/// Distinguishes the shared-cache databases behind separate in-memory pools.
static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

/// `:memory:` and anonymous `file::memory:` URIs open a private database per connection.
fn is_private_memory(path: &str) -> bool {
    path == ":memory:" || path.starts_with("file::memory:")
}

/// r2d2 pool of `SQLite` connections; the crate's [`ConnectionProvider`].
#[derive(Clone)]
pub struct SqlitePool {
    pool: r2d2::Pool<SqliteConnectionManager>,
    path: String,
}

impl SqlitePool {
    /// Open a pool on `path`: a file path, a `file:` URI or `:memory:`.
    ///
    /// An in-memory path is turned into a named shared-cache database, unique to this
    /// pool, so every pooled connection sees the same tables. Its connections are never
    /// retired while the pool lives, since the database goes away with the last one.
    /// Shared-cache locking is table-level: a connection reading a table another
    /// connection is writing in an open transaction fails with `SQLITE_LOCKED`.
    ///
    /// # Errors
    /// Returns `SqlFacadeError::ConfigError` for an empty path and
    /// `SqlFacadeError::InitializationError` if the pool cannot be built.
    pub fn open(path: &str) -> Result<Self, SqlFacadeError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(SqlFacadeError::ConfigError(
                "driver and connection string must be provided".into(),
            ));
        }
        let (target, builder) = if is_private_memory(path) {
            let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
            let uri = format!("file:sql-facade-memory-{seq}?mode=memory&cache=shared");
            let builder = r2d2::Pool::builder().idle_timeout(None).max_lifetime(None);
            (uri, builder)
        } else {
            (path.to_owned(), r2d2::Pool::builder())
        };
        let manager = SqliteConnectionManager::file(&target)
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
        let pool = builder.build(manager).map_err(|e| {
            SqlFacadeError::InitializationError(format!("Error creating data source: {e}"))
        })?;
        debug!(path, target = %target, "sqlite pool created");
        Ok(Self {
            pool,
            path: path.to_owned(),
        })
    }

    /// Validate `config` and open a pool for it.
    ///
    /// # Errors
    /// As [`DataSourceConfig::validate`] and [`SqlitePool::open`].
    pub fn from_config(config: &DataSourceConfig) -> Result<Self, SqlFacadeError> {
        config.validate()?;
        match config.database_type()? {
            DatabaseType::Sqlite => Self::open(config.database_path()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Connections currently open / idle in the pool.
    #[must_use]
    pub fn state(&self) -> (u32, u32) {
        let state = self.pool.state();
        (state.connections, state.idle_connections)
    }
}

impl ConnectionProvider for SqlitePool {
    type Connection = SqliteConnection;

    fn acquire(&self) -> Result<SqliteConnection, SqlFacadeError> {
        let conn = self.pool.get()?;
        trace!(path = %self.path, "sqlite connection checked out");
        Ok(SqliteConnection::new(conn))
    }
}

impl fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("SqlitePool")
            .field("path", &self.path)
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_anonymous_memory_paths_are_rewritten() {
        assert!(is_private_memory(":memory:"));
        assert!(is_private_memory("file::memory:?cache=private"));
        assert!(!is_private_memory("file:app.db?mode=ro"));
        assert!(!is_private_memory("memory.db"));
    }

    #[test]
    fn blank_path_is_a_config_error() {
        assert!(matches!(
            SqlitePool::open("  "),
            Err(SqlFacadeError::ConfigError(_))
        ));
    }
}
