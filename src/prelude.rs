//! Convenient imports for common functionality.
//!
//! Brings in the facade, the parameter and result types, the executor functions for
//! use inside a unit of work, and the `params!` macro.

pub use crate::config::{DataSourceConfig, DataSourceConfigBuilder};
pub use crate::connection::{ConnectionProvider, DbConnection, KeyMode, PreparedStatement};
pub use crate::database::Database;
pub use crate::error::{SqlFacadeError, UnitOfWorkError};
pub use crate::executor::{
    execute_batch_update, execute_query, execute_update, execute_update_return_keys,
};
pub use crate::params;
pub use crate::results::{ResultSnapshot, SnapshotRow};
pub use crate::types::{
    Blob, Clob, DatabaseType, NullParam, ParamKind, SqlArray, SqlParam, SqlValue, sql_type,
};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{GENERATED_KEY_COLUMN, SqliteConnection, SqlitePool};
