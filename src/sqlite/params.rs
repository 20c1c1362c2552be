use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use r2d2_sqlite::rusqlite::types::Value;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::error::SqlFacadeError;
use crate::types::SqlArray;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

// SQLite has no date/time storage class; values are stored as sortable text.

#[must_use]
pub fn date_value(value: NaiveDate) -> Value {
    Value::Text(value.format(DATE_FORMAT).to_string())
}

#[must_use]
pub fn time_value(value: NaiveTime) -> Value {
    Value::Text(value.format(TIME_FORMAT).to_string())
}

#[must_use]
pub fn timestamp_value(value: NaiveDateTime) -> Value {
    Value::Text(value.format(TIMESTAMP_FORMAT).to_string())
}

/// Decimals keep their exact digits as text.
#[must_use]
pub fn decimal_value(value: &Decimal) -> Value {
    Value::Text(value.to_string())
}

/// Arrays are stored as a JSON array of their elements.
///
/// # Errors
/// Returns `SqlFacadeError::ParameterError` if the elements cannot be serialized.
pub fn array_value(value: &SqlArray) -> Result<Value, SqlFacadeError> {
    serde_json::to_string(&value.elements)
        .map(Value::Text)
        .map_err(|e| {
            SqlFacadeError::ParameterError(format!(
                "cannot encode {} array as JSON: {e}",
                value.base_type
            ))
        })
}

/// Best-effort mapping used by the generic binder.
#[must_use]
pub fn object_value(value: Option<&JsonValue>) -> Value {
    match value {
        None | Some(JsonValue::Null) => Value::Null,
        Some(JsonValue::Bool(b)) => Value::Integer(i64::from(*b)),
        Some(JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or_else(|| Value::Text(n.to_string()), Value::Real),
        },
        Some(JsonValue::String(s)) => Value::Text(s.clone()),
        Some(other) => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn temporal_values_are_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(date_value(date), Value::Text("2024-03-09".into()));
        assert_eq!(
            time_value(NaiveTime::from_hms_milli_opt(7, 5, 3, 120).unwrap()),
            Value::Text("07:05:03.120".into())
        );
        assert_eq!(
            timestamp_value(date.and_hms_opt(10, 0, 0).unwrap()),
            Value::Text("2024-03-09 10:00:00".into())
        );
    }

    #[test]
    fn arrays_become_json() {
        let array = SqlArray::new("INTEGER", vec![json!(1), json!(2), json!(3)]);
        assert_eq!(array_value(&array).unwrap(), Value::Text("[1,2,3]".into()));
    }

    #[test]
    fn generic_binder_infers_storage_class() {
        assert_eq!(object_value(None), Value::Null);
        assert_eq!(object_value(Some(&json!(null))), Value::Null);
        assert_eq!(object_value(Some(&json!(true))), Value::Integer(1));
        assert_eq!(object_value(Some(&json!(42))), Value::Integer(42));
        assert_eq!(object_value(Some(&json!(0.5))), Value::Real(0.5));
        assert_eq!(object_value(Some(&json!("s"))), Value::Text("s".into()));
        assert_eq!(
            object_value(Some(&json!({"a": 1}))),
            Value::Text(r#"{"a":1}"#.into())
        );
    }
}
