use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Standard SQL type codes, numerically compatible with `java.sql.Types`.
///
/// Some drivers need one of these to bind a null; see [`NullParam`].
pub mod sql_type {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const CHAR: i32 = 1;
    pub const VARCHAR: i32 = 12;
    pub const LONGVARCHAR: i32 = -1;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const BINARY: i32 = -2;
    pub const VARBINARY: i32 = -3;
    pub const LONGVARBINARY: i32 = -4;
    pub const NULL: i32 = 0;
    pub const OTHER: i32 = 1111;
    pub const ARRAY: i32 = 2003;
    pub const BLOB: i32 = 2004;
    pub const CLOB: i32 = 2005;
    pub const BOOLEAN: i32 = 16;
}

/// Describes a null that must be bound with an explicit SQL type.
///
/// ```rust
/// use sql_facade::prelude::*;
///
/// let params = [SqlParam::from("alice"), NullParam::new(sql_type::INTEGER).into()];
/// assert_eq!(params[1].kind(), ParamKind::TypedNull);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NullParam {
    pub sql_type: i32,
}

impl NullParam {
    #[must_use]
    pub const fn new(sql_type: i32) -> Self {
        Self { sql_type }
    }

    #[must_use]
    pub const fn sql_type(&self) -> i32 {
        self.sql_type
    }
}

/// An SQL array value: the element type name plus its elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlArray {
    pub base_type: String,
    pub elements: Vec<JsonValue>,
}

impl SqlArray {
    #[must_use]
    pub fn new(base_type: impl Into<String>, elements: Vec<JsonValue>) -> Self {
        Self {
            base_type: base_type.into(),
            elements,
        }
    }
}

/// Character large object, bound with the driver's clob binder rather than as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clob(pub String);

impl Clob {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Binary large object, bound with the driver's blob binder rather than as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A positional statement parameter.
///
/// Variant order is the binding precedence; the binder maps each variant to
/// exactly one driver binding call.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Double(f64),
    Int(i32),
    Float(f32),
    Text(String),
    Date(NaiveDate),
    Bool(bool),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Array(SqlArray),
    Decimal(Decimal),
    Long(i64),
    Time(NaiveTime),
    Clob(Clob),
    Blob(Blob),
    /// Null with an explicit SQL type.
    Null(NullParam),
    /// Anything else, including an absent value (`None`); bound by the driver's generic binder.
    Object(Option<JsonValue>),
}

/// Which binding rule a [`SqlParam`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Double,
    Int,
    Float,
    Text,
    Date,
    Bool,
    Bytes,
    Timestamp,
    Array,
    Decimal,
    Long,
    Time,
    Clob,
    Blob,
    TypedNull,
    Object,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Double => "double",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "string",
            Self::Date => "date",
            Self::Bool => "boolean",
            Self::Bytes => "bytes",
            Self::Timestamp => "timestamp",
            Self::Array => "array",
            Self::Decimal => "decimal",
            Self::Long => "long",
            Self::Time => "time",
            Self::Clob => "clob",
            Self::Blob => "blob",
            Self::TypedNull => "null",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

impl SqlParam {
    /// The absent value.
    pub const NONE: SqlParam = SqlParam::Object(None);

    #[must_use]
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Double(_) => ParamKind::Double,
            Self::Int(_) => ParamKind::Int,
            Self::Float(_) => ParamKind::Float,
            Self::Text(_) => ParamKind::Text,
            Self::Date(_) => ParamKind::Date,
            Self::Bool(_) => ParamKind::Bool,
            Self::Bytes(_) => ParamKind::Bytes,
            Self::Timestamp(_) => ParamKind::Timestamp,
            Self::Array(_) => ParamKind::Array,
            Self::Decimal(_) => ParamKind::Decimal,
            Self::Long(_) => ParamKind::Long,
            Self::Time(_) => ParamKind::Time,
            Self::Clob(_) => ParamKind::Clob,
            Self::Blob(_) => ParamKind::Blob,
            Self::Null(_) => ParamKind::TypedNull,
            Self::Object(_) => ParamKind::Object,
        }
    }

    /// True for a typed null or an absent value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Null(_) | Self::Object(None) | Self::Object(Some(JsonValue::Null))
        )
    }
}

macro_rules! impl_from_for_param {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlParam {
                fn from(value: $ty) -> Self {
                    SqlParam::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_param! {
    f64 => Double,
    i32 => Int,
    f32 => Float,
    String => Text,
    &str => Text,
    NaiveDate => Date,
    bool => Bool,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    NaiveDateTime => Timestamp,
    SqlArray => Array,
    Decimal => Decimal,
    i64 => Long,
    NaiveTime => Time,
    Clob => Clob,
    Blob => Blob,
    NullParam => Null,
}

impl From<JsonValue> for SqlParam {
    fn from(value: JsonValue) -> Self {
        SqlParam::Object(Some(value))
    }
}

impl<T> From<Option<T>> for SqlParam
where
    T: Into<SqlParam>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlParam::NONE, Into::into)
    }
}

/// Build a `Vec<SqlParam>` from heterogeneous values.
///
/// ```rust
/// use sql_facade::{params, SqlParam};
///
/// let p = params![42, "bob", 1.5_f64, None::<i64>];
/// assert_eq!(p.len(), 4);
/// assert_eq!(p[3], SqlParam::NONE);
/// ```
#[macro_export]
macro_rules! params {
    () => { ::std::vec::Vec::<$crate::SqlParam>::new() };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::SqlParam::from($value)),+]
    };
}

/// A value read back from a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let SqlValue::Integer(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Real(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_int() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            SqlValue::Integer(value) => Some(Decimal::from(*value)),
            SqlValue::Real(value) => Decimal::try_from(*value).ok(),
            SqlValue::Text(value) => value.parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_text()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    #[must_use]
    pub fn as_time(&self) -> Option<NaiveTime> {
        self.as_text()
            .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok())
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        let s = self.as_text()?;
        // "YYYY-MM-DD HH:MM:SS" with optional fraction, or the ISO 'T' separator
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

/// Database engines a data source can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `SQLite`, pooled with r2d2
    Sqlite,
}
