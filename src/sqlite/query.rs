use r2d2_sqlite::rusqlite::{self, Statement, types::Value};

use crate::error::SqlFacadeError;
use crate::results::ResultSnapshot;
use crate::types::SqlValue;

/// Read one column of the current row.
///
/// # Errors
///
/// Returns `SqlFacadeError` if the value cannot be read.
pub fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<SqlValue, SqlFacadeError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(i),
        Value::Real(f) => SqlValue::Real(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    })
}

/// Step through the statement with its current bindings and copy every row.
///
/// # Errors
/// Returns `SqlFacadeError` if stepping or reading a value fails.
pub fn build_snapshot(stmt: &mut Statement<'_>) -> Result<ResultSnapshot, SqlFacadeError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let column_count = column_names.len();
    let mut snapshot = ResultSnapshot::new(column_names);

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(row, idx)?);
        }
        snapshot.push_row(values);
    }
    Ok(snapshot)
}
