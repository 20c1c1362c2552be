//! Statement and batch execution against a caller-supplied connection.
//!
//! These are the building blocks both for the self-acquiring methods on
//! [`Database`](crate::Database) and for work composed inside a transaction.

use tracing::{debug, trace};

use crate::connection::{DbConnection, KeyMode, PreparedStatement};
use crate::error::SqlFacadeError;
use crate::params::bind_parameters;
use crate::results::ResultSnapshot;
use crate::types::SqlParam;

/// Run a query and hand a detached snapshot of its rows to `processor`.
///
/// The statement is dropped before `processor` runs; the snapshot does not depend on it.
/// Errors returned by `processor` are surfaced unchanged.
///
/// # Errors
/// Returns `SqlFacadeError` on prepare, bind, execute or row-copy failure, or whatever
/// `processor` returns.
pub fn execute_query<C, T, F>(
    conn: &mut C,
    sql: &str,
    processor: F,
    params: &[SqlParam],
) -> Result<T, SqlFacadeError>
where
    C: DbConnection,
    F: FnOnce(ResultSnapshot) -> Result<T, SqlFacadeError>,
{
    let snapshot = {
        let mut stmt = conn.prepare(sql, KeyMode::NoGeneratedKeys)?;
        bind_parameters(&mut stmt, params)?;
        stmt.execute_query()?
    };
    trace!(rows = snapshot.len(), "query snapshot taken");
    processor(snapshot)
}

/// Run an INSERT/UPDATE/DELETE and return the affected row count.
///
/// # Errors
/// Returns `SqlFacadeError` on prepare, bind or execute failure.
pub fn execute_update<C>(conn: &mut C, sql: &str, params: &[SqlParam]) -> Result<u64, SqlFacadeError>
where
    C: DbConnection,
{
    let mut stmt = conn.prepare(sql, KeyMode::NoGeneratedKeys)?;
    bind_parameters(&mut stmt, params)?;
    let affected = stmt.execute_update()?;
    trace!(affected, "update executed");
    Ok(affected)
}

/// Run an update that generates keys and hand a snapshot of those keys to `processor`.
///
/// # Errors
/// Returns `SqlFacadeError` on prepare, bind, execute or key-read failure, or whatever
/// `processor` returns.
pub fn execute_update_return_keys<C, T, F>(
    conn: &mut C,
    sql: &str,
    processor: F,
    params: &[SqlParam],
) -> Result<T, SqlFacadeError>
where
    C: DbConnection,
    F: FnOnce(ResultSnapshot) -> Result<T, SqlFacadeError>,
{
    let keys = {
        let mut stmt = conn.prepare(sql, KeyMode::ReturnGeneratedKeys)?;
        bind_parameters(&mut stmt, params)?;
        let affected = stmt.execute_update()?;
        trace!(affected, "update executed, reading generated keys");
        stmt.generated_keys()?
    };
    processor(keys)
}

/// Bind every parameter set in order onto one prepared statement and execute them as a
/// single batch. Returns the per-entry update counts the driver reports.
///
/// Which entries persist after a partial failure is up to the driver and any
/// surrounding transaction.
///
/// # Errors
/// Returns `SqlFacadeError` if any bind fails or the batch execution fails.
pub fn execute_batch_update<C, P>(
    conn: &mut C,
    sql: &str,
    batch: &[P],
) -> Result<Vec<u64>, SqlFacadeError>
where
    C: DbConnection,
    P: AsRef<[SqlParam]>,
{
    let mut stmt = conn.prepare(sql, KeyMode::NoGeneratedKeys)?;
    for params in batch {
        bind_parameters(&mut stmt, params.as_ref())?;
        stmt.add_batch()?;
    }
    let counts = stmt.execute_batch()?;
    debug!(entries = counts.len(), "batch executed");
    Ok(counts)
}
