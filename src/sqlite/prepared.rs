use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use r2d2_sqlite::rusqlite::{self, types::Value};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::connection::{KeyMode, PreparedStatement};
use crate::error::SqlFacadeError;
use crate::params::ParameterSink;
use crate::results::ResultSnapshot;
use crate::types::{Blob, Clob, SqlArray, SqlValue};

use super::params::{array_value, date_value, decimal_value, object_value, time_value, timestamp_value};
use super::query::build_snapshot;

/// Column label of the generated-keys snapshot.
pub const GENERATED_KEY_COLUMN: &str = "generated_key";

/// A prepared `SQLite` statement borrowed from a [`SqliteConnection`](super::SqliteConnection).
///
/// Bound values are tracked alongside the driver bindings so batch entries can be
/// replayed in order by [`PreparedStatement::execute_batch`].
pub struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    conn: &'c rusqlite::Connection,
    key_mode: KeyMode,
    bound: Vec<Value>,
    batch: Vec<Vec<Value>>,
    last_changes: Option<u64>,
}

impl<'c> SqliteStatement<'c> {
    pub(crate) fn new(
        stmt: rusqlite::Statement<'c>,
        conn: &'c rusqlite::Connection,
        key_mode: KeyMode,
    ) -> Self {
        Self {
            stmt,
            conn,
            key_mode,
            bound: Vec::new(),
            batch: Vec::new(),
            last_changes: None,
        }
    }

    /// Number of `?` placeholders in the statement.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    /// Entries queued by `add_batch` and not yet executed.
    #[must_use]
    pub fn pending_batch_len(&self) -> usize {
        self.batch.len()
    }

    fn bind_value(&mut self, index: usize, value: Value) -> Result<(), SqlFacadeError> {
        self.stmt.raw_bind_parameter(index, &value)?;
        if self.bound.len() < index {
            self.bound.resize(index, Value::Null);
        }
        self.bound[index - 1] = value;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("parameter_count", &self.stmt.parameter_count())
            .field("key_mode", &self.key_mode)
            .field("pending_batch", &self.batch.len())
            .finish_non_exhaustive()
    }
}

impl ParameterSink for SqliteStatement<'_> {
    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Real(value))
    }

    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Integer(i64::from(value)))
    }

    fn bind_float(&mut self, index: usize, value: f32) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Real(f64::from(value)))
    }

    fn bind_string(&mut self, index: usize, value: &str) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Text(value.to_owned()))
    }

    fn bind_date(&mut self, index: usize, value: NaiveDate) -> Result<(), SqlFacadeError> {
        self.bind_value(index, date_value(value))
    }

    fn bind_boolean(&mut self, index: usize, value: bool) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Integer(i64::from(value)))
    }

    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Blob(value.to_vec()))
    }

    fn bind_timestamp(
        &mut self,
        index: usize,
        value: NaiveDateTime,
    ) -> Result<(), SqlFacadeError> {
        self.bind_value(index, timestamp_value(value))
    }

    fn bind_array(&mut self, index: usize, value: &SqlArray) -> Result<(), SqlFacadeError> {
        let encoded = array_value(value)?;
        self.bind_value(index, encoded)
    }

    fn bind_decimal(&mut self, index: usize, value: &Decimal) -> Result<(), SqlFacadeError> {
        self.bind_value(index, decimal_value(value))
    }

    fn bind_long(&mut self, index: usize, value: i64) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Integer(value))
    }

    fn bind_time(&mut self, index: usize, value: NaiveTime) -> Result<(), SqlFacadeError> {
        self.bind_value(index, time_value(value))
    }

    fn bind_clob(&mut self, index: usize, value: &Clob) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Text(value.as_str().to_owned()))
    }

    fn bind_blob(&mut self, index: usize, value: &Blob) -> Result<(), SqlFacadeError> {
        self.bind_value(index, Value::Blob(value.as_bytes().to_vec()))
    }

    fn bind_null(&mut self, index: usize, sql_type: i32) -> Result<(), SqlFacadeError> {
        // storage is untyped; the code only matters to drivers with typed nulls
        trace!(index, sql_type, "binding typed null");
        self.bind_value(index, Value::Null)
    }

    fn bind_object(
        &mut self,
        index: usize,
        value: Option<&JsonValue>,
    ) -> Result<(), SqlFacadeError> {
        self.bind_value(index, object_value(value))
    }
}

impl PreparedStatement for SqliteStatement<'_> {
    fn execute_query(&mut self) -> Result<ResultSnapshot, SqlFacadeError> {
        build_snapshot(&mut self.stmt)
    }

    fn execute_update(&mut self) -> Result<u64, SqlFacadeError> {
        let changed = self.stmt.raw_execute()? as u64;
        self.last_changes = Some(changed);
        Ok(changed)
    }

    fn generated_keys(&mut self) -> Result<ResultSnapshot, SqlFacadeError> {
        if self.key_mode != KeyMode::ReturnGeneratedKeys {
            return Err(SqlFacadeError::ExecutionError(
                "statement was not prepared to return generated keys".into(),
            ));
        }
        let mut keys = ResultSnapshot::new(vec![GENERATED_KEY_COLUMN.to_string()]);
        if self.last_changes.unwrap_or(0) > 0 {
            keys.push_row(vec![SqlValue::Integer(self.conn.last_insert_rowid())]);
        }
        Ok(keys)
    }

    fn add_batch(&mut self) -> Result<(), SqlFacadeError> {
        let expected = self.stmt.parameter_count();
        if self.bound.len() < expected {
            return Err(SqlFacadeError::ParameterError(format!(
                "batch entry binds {} of {expected} parameters",
                self.bound.len()
            )));
        }
        self.batch.push(std::mem::take(&mut self.bound));
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>, SqlFacadeError> {
        let entries = std::mem::take(&mut self.batch);
        let mut counts = Vec::with_capacity(entries.len());
        for values in &entries {
            for (offset, value) in values.iter().enumerate() {
                self.stmt.raw_bind_parameter(offset + 1, value)?;
            }
            counts.push(self.stmt.raw_execute()? as u64);
        }
        Ok(counts)
    }
}
