use thiserror::Error;

#[cfg(feature = "sqlite")]
use r2d2_sqlite::rusqlite;

/// Boxed foreign error carried through a unit of work.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single database-access error surfaced by every facade operation.
#[derive(Debug, Error)]
pub enum SqlFacadeError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    PoolError(#[from] r2d2::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// A non-database failure raised inside a unit of work, wrapped after rollback.
    #[error("{message}")]
    Transaction {
        message: String,
        #[source]
        source: BoxedError,
    },

    /// Rolling back after a failed unit of work failed as well.
    #[error("rollback failed ({source}) after: {original}")]
    RollbackFailed {
        original: Box<SqlFacadeError>,
        #[source]
        source: Box<SqlFacadeError>,
    },

    /// Auto-commit could not be switched back on after a failed unit of work.
    #[error("restoring auto-commit failed ({source}) after: {original}")]
    AutoCommitNotRestored {
        original: Box<SqlFacadeError>,
        #[source]
        source: Box<SqlFacadeError>,
    },
}

impl SqlFacadeError {
    /// True for errors raised while acquiring a connection.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::PoolError(_) => true,
            Self::ConnectionError(_) => true,
            _ => false,
        }
    }

    /// The failure a transaction was rolled back for, looking through failed cleanup.
    #[must_use]
    pub fn original(&self) -> &SqlFacadeError {
        match self {
            Self::RollbackFailed { original, .. } | Self::AutoCommitNotRestored { original, .. } => {
                original.original()
            }
            other => other,
        }
    }
}

/// Outcome tag for a failed unit of work.
///
/// Database failures pass through the transaction coordinator unchanged; anything
/// else is wrapped into [`SqlFacadeError::Transaction`] once the rollback ran.
///
/// ```rust
/// use sql_facade::{SqlFacadeError, UnitOfWorkError};
///
/// let db: UnitOfWorkError = SqlFacadeError::ExecutionError("boom".into()).into();
/// assert!(matches!(db.into_database_error(), SqlFacadeError::ExecutionError(_)));
///
/// let other = UnitOfWorkError::other("quota exceeded");
/// assert_eq!(other.into_database_error().to_string(), "quota exceeded");
/// ```
#[derive(Debug, Error)]
pub enum UnitOfWorkError {
    #[error(transparent)]
    Database(#[from] SqlFacadeError),

    #[error("{0}")]
    Other(BoxedError),
}

impl UnitOfWorkError {
    /// Tag a failure that did not come from the database layer.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::Other(err.into())
    }

    /// Convert into the database-access error the coordinator reports.
    #[must_use]
    pub fn into_database_error(self) -> SqlFacadeError {
        match self {
            Self::Database(err) => err,
            Self::Other(source) => SqlFacadeError::Transaction {
                message: source.to_string(),
                source,
            },
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for UnitOfWorkError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(SqlFacadeError::SqliteError(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn foreign_failures_keep_message_and_cause() {
        let io = std::io::Error::other("disk on fire");
        let wrapped = UnitOfWorkError::other(io).into_database_error();

        assert_eq!(wrapped.to_string(), "disk on fire");
        let cause = wrapped.source().expect("wrapped cause");
        assert_eq!(cause.to_string(), "disk on fire");
    }

    #[test]
    fn database_failures_pass_through_unwrapped() {
        let err: UnitOfWorkError = SqlFacadeError::ParameterError("bad".into()).into();
        let surfaced = err.into_database_error();
        assert!(matches!(surfaced, SqlFacadeError::ParameterError(ref m) if m == "bad"));
    }

    #[test]
    fn rollback_failure_exposes_original() {
        let err = SqlFacadeError::RollbackFailed {
            original: Box::new(SqlFacadeError::ExecutionError("second update".into())),
            source: Box::new(SqlFacadeError::ConnectionError("gone".into())),
        };
        assert!(matches!(err.original(), SqlFacadeError::ExecutionError(_)));
        assert!(err.to_string().contains("second update"));
        assert!(!err.is_connectivity());
    }

    #[test]
    fn original_looks_through_nested_cleanup_failures() {
        let err = SqlFacadeError::AutoCommitNotRestored {
            original: Box::new(SqlFacadeError::RollbackFailed {
                original: Box::new(SqlFacadeError::ParameterError("first".into())),
                source: Box::new(SqlFacadeError::ConnectionError("rollback".into())),
            }),
            source: Box::new(SqlFacadeError::ConnectionError("restore".into())),
        };
        assert!(matches!(err.original(), SqlFacadeError::ParameterError(m) if m == "first"));
        let rendered = err.to_string();
        assert!(rendered.contains("restore") && rendered.contains("first"), "{rendered}");
    }
}
