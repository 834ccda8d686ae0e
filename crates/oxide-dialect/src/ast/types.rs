//! Vendor-neutral column types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An abstract column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Exact numeric.
    Decimal {
        /// Total number of digits.
        precision: u32,
        /// Digits after the decimal point.
        scale: u32,
    },
    /// Fixed-length character string.
    Char(u32),
    /// Variable-length character string.
    Varchar(u32),
    /// Unbounded text.
    Text,
    /// Binary string, bounded or unbounded.
    Binary(Option<u32>),
    /// Large binary object.
    Blob,
    /// UUID.
    Uuid,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Timestamp without time zone.
    DateTime,
    /// Timestamp with time zone.
    TimestampWithTimeZone,
    /// Boolean.
    Boolean,
    /// JSON document stored as text.
    Json,
    /// Binary JSON document.
    Jsonb,
}

impl DataType {
    /// Returns true for the integer types that can back an autoincrement column.
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(self, Self::Short | Self::Integer | Self::Long)
    }

    /// Returns true for date and time types.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::TimestampWithTimeZone
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Integer => write!(f, "integer"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Self::Char(n) => write!(f, "char({n})"),
            Self::Varchar(n) => write!(f, "varchar({n})"),
            Self::Text => write!(f, "text"),
            Self::Binary(Some(n)) => write!(f, "binary({n})"),
            Self::Binary(None) => write!(f, "binary"),
            Self::Blob => write!(f, "blob"),
            Self::Uuid => write!(f, "uuid"),
            Self::Date => write!(f, "date"),
            Self::Time => write!(f, "time"),
            Self::DateTime => write!(f, "datetime"),
            Self::TimestampWithTimeZone => write!(f, "timestamp_with_time_zone"),
            Self::Boolean => write!(f, "boolean"),
            Self::Json => write!(f, "json"),
            Self::Jsonb => write!(f, "jsonb"),
        }
    }
}

/// A data type together with its nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    /// The abstract data type.
    pub data_type: DataType,
    /// Whether the column accepts NULL.
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnType {
    /// Creates a NOT NULL column type.
    #[must_use]
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: false,
        }
    }

    /// Returns a nullable copy.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl From<DataType> for ColumnType {
    fn from(data_type: DataType) -> Self {
        Self::new(data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_defaults_to_not_null() {
        let ty = ColumnType::from(DataType::Integer);
        assert!(!ty.nullable);
        assert!(ty.nullable().nullable);
    }

    #[test]
    fn deserializes_parameterized_types() {
        let ty: DataType = serde_json::from_str(r#"{"varchar": 50}"#).unwrap();
        assert_eq!(ty, DataType::Varchar(50));

        let ty: DataType = serde_json::from_str(r#"{"binary": null}"#).unwrap();
        assert_eq!(ty, DataType::Binary(None));

        let ty: ColumnType = serde_json::from_str(r#"{"data_type": "uuid"}"#).unwrap();
        assert_eq!(ty, ColumnType::new(DataType::Uuid));
    }

    #[test]
    fn display_names() {
        assert_eq!(DataType::Decimal { precision: 10, scale: 2 }.to_string(), "decimal(10,2)");
        assert_eq!(DataType::Binary(None).to_string(), "binary");
        assert!(DataType::Long.is_integral());
        assert!(DataType::Time.is_temporal());
    }
}
