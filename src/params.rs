use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::error::SqlFacadeError;
use crate::types::{Blob, Clob, SqlArray, SqlParam};

/// Positional binding calls a driver statement exposes.
///
/// `index` is always 1-based. Each method mutates the statement's bound-parameter
/// state and fails if the driver rejects the value or the statement is unusable.
pub trait ParameterSink {
    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), SqlFacadeError>;
    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), SqlFacadeError>;
    fn bind_float(&mut self, index: usize, value: f32) -> Result<(), SqlFacadeError>;
    fn bind_string(&mut self, index: usize, value: &str) -> Result<(), SqlFacadeError>;
    fn bind_date(&mut self, index: usize, value: NaiveDate) -> Result<(), SqlFacadeError>;
    fn bind_boolean(&mut self, index: usize, value: bool) -> Result<(), SqlFacadeError>;
    fn bind_bytes(&mut self, index: usize, value: &[u8]) -> Result<(), SqlFacadeError>;
    fn bind_timestamp(&mut self, index: usize, value: NaiveDateTime)
    -> Result<(), SqlFacadeError>;
    fn bind_array(&mut self, index: usize, value: &SqlArray) -> Result<(), SqlFacadeError>;
    fn bind_decimal(&mut self, index: usize, value: &Decimal) -> Result<(), SqlFacadeError>;
    fn bind_long(&mut self, index: usize, value: i64) -> Result<(), SqlFacadeError>;
    fn bind_time(&mut self, index: usize, value: NaiveTime) -> Result<(), SqlFacadeError>;
    fn bind_clob(&mut self, index: usize, value: &Clob) -> Result<(), SqlFacadeError>;
    fn bind_blob(&mut self, index: usize, value: &Blob) -> Result<(), SqlFacadeError>;
    /// Bind an explicit null of the given SQL type code.
    fn bind_null(&mut self, index: usize, sql_type: i32) -> Result<(), SqlFacadeError>;
    /// Generic binder: the driver infers the storage type. `None` is the absent value.
    fn bind_object(
        &mut self,
        index: usize,
        value: Option<&JsonValue>,
    ) -> Result<(), SqlFacadeError>;
}

/// Bind `params` to `sink`, the value at slice index `i` going to placeholder `i + 1`.
///
/// Stops at the first rejected value.
///
/// # Errors
///
/// Returns whatever the sink reports for the first value it rejects.
pub fn bind_parameters<S>(sink: &mut S, params: &[SqlParam]) -> Result<(), SqlFacadeError>
where
    S: ParameterSink + ?Sized,
{
    for (offset, param) in params.iter().enumerate() {
        let index = offset + 1;
        trace!(index, kind = %param.kind(), "binding parameter");
        match param {
            SqlParam::Double(v) => sink.bind_double(index, *v)?,
            SqlParam::Int(v) => sink.bind_int(index, *v)?,
            SqlParam::Float(v) => sink.bind_float(index, *v)?,
            SqlParam::Text(v) => sink.bind_string(index, v)?,
            SqlParam::Date(v) => sink.bind_date(index, *v)?,
            SqlParam::Bool(v) => sink.bind_boolean(index, *v)?,
            SqlParam::Bytes(v) => sink.bind_bytes(index, v)?,
            SqlParam::Timestamp(v) => sink.bind_timestamp(index, *v)?,
            SqlParam::Array(v) => sink.bind_array(index, v)?,
            SqlParam::Decimal(v) => sink.bind_decimal(index, v)?,
            SqlParam::Long(v) => sink.bind_long(index, *v)?,
            SqlParam::Time(v) => sink.bind_time(index, *v)?,
            SqlParam::Clob(v) => sink.bind_clob(index, v)?,
            SqlParam::Blob(v) => sink.bind_blob(index, v)?,
            SqlParam::Null(descriptor) => sink.bind_null(index, descriptor.sql_type)?,
            SqlParam::Object(v) => sink.bind_object(index, v.as_ref())?,
        }
    }
    Ok(())
}
