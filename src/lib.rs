//! Synchronous facade over pooled SQL connections.
//!
//! - positional parameter binding over a closed set of value kinds ([`SqlParam`]),
//!   including typed nulls ([`NullParam`])
//! - queries whose rows are copied into a [`ResultSnapshot`] before the statement and
//!   connection are released
//! - updates, key-returning updates and batch updates
//! - transaction scopes that commit on success, roll back on failure and always
//!   restore auto-commit
//!
//! The core is generic over a [`ConnectionProvider`]; the `sqlite` feature (on by
//! default) provides one backed by an r2d2 pool.
//!
//! ```rust,no_run
//! use sql_facade::prelude::*;
//!
//! # fn demo() -> Result<(), SqlFacadeError> {
//! let db = Database::new(SqlitePool::open("app.db")?);
//!
//! db.execute_void_transaction(|conn| {
//!     execute_update(conn, "UPDATE accounts SET balance = balance - ? WHERE id = ?", &params![10, 1])?;
//!     execute_update(conn, "UPDATE accounts SET balance = balance + ? WHERE id = ?", &params![10, 2])?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod executor;
pub mod params;
pub mod prelude;
pub mod results;
pub mod transaction;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{DataSourceConfig, DataSourceConfigBuilder};
pub use connection::{ConnectionProvider, DbConnection, KeyMode, PreparedStatement};
pub use database::Database;
pub use error::{SqlFacadeError, UnitOfWorkError};
pub use params::{ParameterSink, bind_parameters};
pub use results::{ResultSnapshot, SnapshotRow};
pub use types::{
    Blob, Clob, DatabaseType, NullParam, ParamKind, SqlArray, SqlParam, SqlValue, sql_type,
};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqlitePool};
