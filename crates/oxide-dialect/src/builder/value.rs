//! SQL values and parameter handling.
//!
//! Values travel either as bound parameters or, when a dialect renders
//! inline, through the dialect's type mapper. [`SqlValue::to_sql_inline`]
//! is the vendor-neutral rendering used when no dialect is at hand.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A SQL value that can be used as a parameter.
///
/// All values are properly escaped or parameterized to prevent SQL injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// UUID value.
    Uuid(Uuid),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Timestamp without time zone.
    DateTime(NaiveDateTime),
    /// Timestamp with a fixed UTC offset.
    TimestampTz(DateTime<FixedOffset>),
    /// JSON document.
    Json(serde_json::Value),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: Prefer using parameterized queries instead.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => quote_text(s),
            Self::Blob(b) => format!("X'{}'", hex_upper(b)),
            Self::Uuid(u) => quote_text(&u.hyphenated().to_string()),
            Self::Json(v) => quote_text(&v.to_string()),
            Self::Date(_) | Self::Time(_) | Self::DateTime(_) | Self::TimestampTz(_) => {
                quote_text(&self.temporal_text().unwrap_or_default())
            }
        }
    }

    /// Returns the ISO-8601 text of a temporal value.
    #[must_use]
    pub fn temporal_text(&self) -> Option<String> {
        match self {
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => Some(t.format("%H:%M:%S%.f").to_string()),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Self::TimestampTz(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string()),
            _ => None,
        }
    }

    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the parameter placeholder.
    #[must_use]
    pub const fn placeholder() -> &'static str {
        "?"
    }
}

/// Wraps text in single quotes, doubling embedded quotes.
pub(crate) fn quote_text(s: &str) -> String {
    let escaped = s.replace('\'', "''");
    format!("'{escaped}'")
}

pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for Uuid {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Uuid(self)
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Time(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for DateTime<FixedOffset> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::TimestampTz(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}
