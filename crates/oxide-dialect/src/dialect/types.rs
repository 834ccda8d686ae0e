//! Column type names and value encodings.

use uuid::Uuid;

use super::Dialect;
use crate::ast::{ColumnType, DataType, Expr};
use crate::builder::{hex_upper, quote_text, SqlValue, StatementBuffer};
use crate::error::{DialectError, Result};

/// How UUID values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidEncoding {
    /// Native UUID type.
    Native,
    /// 16-byte big-endian binary.
    Binary,
    /// Hyphenated text.
    Text,
}

/// Maps abstract column types and values to a dialect's spelling.
///
/// Every method has a SQL-standard default; vendors override deviations.
pub trait TypeMapper: Send + Sync {
    /// Renders the DDL type name of `data_type`.
    ///
    /// # Errors
    ///
    /// Fails when the dialect cannot store the type, or when an unbounded
    /// binary column needs a length.
    fn render_type(&self, d: &Dialect, data_type: &DataType) -> Result<String> {
        let name = match *data_type {
            DataType::Short => self.short_type().to_owned(),
            DataType::Integer => self.integer_type().to_owned(),
            DataType::Long => self.long_type().to_owned(),
            DataType::Float => self.float_type().to_owned(),
            DataType::Double => self.double_type().to_owned(),
            DataType::Decimal { precision, scale } => self.decimal_type(precision, scale),
            DataType::Char(length) => self.char_type(length),
            DataType::Varchar(length) => self.varchar_type(length),
            DataType::Text => self.text_type().to_owned(),
            DataType::Binary(length) => return self.binary_type(d, length),
            DataType::Blob => self.blob_type().to_owned(),
            DataType::Uuid => self.uuid_type().to_owned(),
            DataType::Date => self.date_type().to_owned(),
            DataType::Time => self.time_type().to_owned(),
            DataType::DateTime => self.datetime_type().to_owned(),
            DataType::TimestampWithTimeZone => self.timestamp_tz_type().to_owned(),
            DataType::Boolean => self.boolean_type().to_owned(),
            DataType::Json => self.json_type().to_owned(),
            DataType::Jsonb => return self.jsonb_type(d),
        };
        Ok(name)
    }

    fn short_type(&self) -> &'static str {
        "SMALLINT"
    }

    fn integer_type(&self) -> &'static str {
        "INT"
    }

    fn long_type(&self) -> &'static str {
        "BIGINT"
    }

    fn float_type(&self) -> &'static str {
        "FLOAT"
    }

    fn double_type(&self) -> &'static str {
        "DOUBLE PRECISION"
    }

    fn decimal_type(&self, precision: u32, scale: u32) -> String {
        format!("DECIMAL({precision},{scale})")
    }

    fn char_type(&self, length: u32) -> String {
        format!("CHAR({length})")
    }

    fn varchar_type(&self, length: u32) -> String {
        format!("VARCHAR({length})")
    }

    fn text_type(&self) -> &'static str {
        "TEXT"
    }

    /// # Errors
    ///
    /// [`DialectError::InvalidConfiguration`] when `length` is `None`.
    fn binary_type(&self, d: &Dialect, length: Option<u32>) -> Result<String> {
        length.map(|n| format!("VARBINARY({n})")).ok_or_else(|| {
            DialectError::invalid(format!(
                "binary columns require a length on the {} dialect",
                d.name()
            ))
        })
    }

    fn blob_type(&self) -> &'static str {
        "BLOB"
    }

    fn uuid_type(&self) -> &'static str {
        "BINARY(16)"
    }

    fn date_type(&self) -> &'static str {
        "DATE"
    }

    fn time_type(&self) -> &'static str {
        "TIME"
    }

    fn datetime_type(&self) -> &'static str {
        "TIMESTAMP"
    }

    fn timestamp_tz_type(&self) -> &'static str {
        "TIMESTAMP WITH TIME ZONE"
    }

    fn boolean_type(&self) -> &'static str {
        "BOOLEAN"
    }

    fn json_type(&self) -> &'static str {
        "JSON"
    }

    /// # Errors
    ///
    /// Unsupported unless the vendor has a binary JSON type.
    fn jsonb_type(&self, d: &Dialect) -> Result<String> {
        Err(d.unsupported("JSONB columns"))
    }

    /// Column type of an identity column that is not sequence-backed.
    ///
    /// # Errors
    ///
    /// [`DialectError::InvalidConfiguration`] for non-integer columns.
    fn auto_increment_type(&self, d: &Dialect, data_type: &DataType) -> Result<String> {
        ensure_integral(data_type)?;
        Ok(format!(
            "{} GENERATED BY DEFAULT AS IDENTITY",
            self.render_type(d, data_type)?
        ))
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn string_literal(&self, value: &str) -> String {
        quote_text(value)
    }

    fn hex_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex_upper(bytes))
    }

    fn uuid_encoding(&self) -> UuidEncoding {
        UuidEncoding::Binary
    }

    /// Inline form of a date, time or timestamp value.
    fn temporal_literal(&self, value: &SqlValue) -> String {
        self.string_literal(&value.temporal_text().unwrap_or_default())
    }

    /// Renders a value inline.
    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => self.boolean_literal(*b).to_owned(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => self.string_literal(s),
            SqlValue::Blob(bytes) => self.hex_literal(bytes),
            SqlValue::Uuid(u) => match self.uuid_encoding() {
                UuidEncoding::Binary => self.hex_literal(u.as_bytes()),
                UuidEncoding::Native | UuidEncoding::Text => {
                    self.string_literal(&u.hyphenated().to_string())
                }
            },
            SqlValue::Json(v) => self.string_literal(&v.to_string()),
            SqlValue::Date(_) | SqlValue::Time(_) | SqlValue::DateTime(_) | SqlValue::TimestampTz(_) => {
                self.temporal_literal(value)
            }
        }
    }

    /// Bind form of a boolean.
    fn boolean_param(&self, value: bool) -> SqlValue {
        SqlValue::Bool(value)
    }

    /// Dates and times are bound as ISO-8601 text.
    fn temporal_as_text(&self) -> bool {
        false
    }

    fn encode_uuid(&self, value: Uuid) -> SqlValue {
        match self.uuid_encoding() {
            UuidEncoding::Native => SqlValue::Uuid(value),
            UuidEncoding::Binary => SqlValue::Blob(value.as_bytes().to_vec()),
            UuidEncoding::Text => SqlValue::Text(value.hyphenated().to_string()),
        }
    }

    fn encode_json(&self, value: serde_json::Value) -> SqlValue {
        SqlValue::Text(value.to_string())
    }

    /// Converts a value to the form bound for a column of `column` type.
    ///
    /// # Errors
    ///
    /// Rejects NULL for NOT NULL columns and malformed UUID or JSON text.
    fn encode_value(&self, column: &ColumnType, value: SqlValue) -> Result<SqlValue> {
        if value.is_null() {
            if column.nullable {
                return Ok(SqlValue::Null);
            }
            return Err(DialectError::invalid(format!(
                "NULL value for a NOT NULL {} column",
                column.data_type
            )));
        }
        match (column.data_type, value) {
            (DataType::Uuid, SqlValue::Uuid(u)) => Ok(self.encode_uuid(u)),
            (DataType::Uuid, SqlValue::Text(s)) => {
                let u = Uuid::parse_str(&s)
                    .map_err(|e| DialectError::invalid(format!("invalid UUID '{s}': {e}")))?;
                Ok(self.encode_uuid(u))
            }
            (DataType::Uuid, SqlValue::Blob(bytes)) => {
                let u = Uuid::from_slice(&bytes)
                    .map_err(|e| DialectError::invalid(format!("invalid UUID bytes: {e}")))?;
                Ok(self.encode_uuid(u))
            }
            (DataType::Json | DataType::Jsonb, SqlValue::Json(v)) => Ok(self.encode_json(v)),
            (DataType::Json | DataType::Jsonb, SqlValue::Text(s)) => {
                let v = serde_json::from_str(&s)
                    .map_err(|e| DialectError::invalid(format!("invalid JSON document: {e}")))?;
                Ok(self.encode_json(v))
            }
            (_, SqlValue::Bool(b)) => Ok(self.boolean_param(b)),
            (_, value) => {
                if self.temporal_as_text() {
                    if let Some(text) = value.temporal_text() {
                        return Ok(SqlValue::Text(text));
                    }
                }
                Ok(value)
            }
        }
    }

    /// Computed defaults are wrapped in parentheses.
    fn wraps_computed_default(&self) -> bool {
        true
    }

    /// Renders a column default.
    ///
    /// Literals and function calls are emitted bare; other expressions are
    /// wrapped in parentheses where the vendor expects it.
    ///
    /// # Errors
    ///
    /// Propagates expression compilation failures.
    fn default_value(&self, d: &Dialect, expr: &Expr) -> Result<String> {
        let mut buf = StatementBuffer::inline(d);
        let bare = matches!(
            expr,
            Expr::Literal(_)
                | Expr::Param(_)
                | Expr::Raw(_)
                | Expr::Function(_)
                | Expr::NextValue(_)
                | Expr::Column(_)
        );
        if bare || !self.wraps_computed_default() {
            buf.push_expr(expr)?;
        } else {
            buf.push_char('(');
            buf.push_expr(expr)?;
            buf.push_char(')');
        }
        Ok(buf.finish().sql)
    }

    /// Normalizes a default read back from the catalog.
    fn sanitize_default(&self, raw: &str) -> String {
        raw.trim().to_owned()
    }
}

pub(crate) fn ensure_integral(data_type: &DataType) -> Result<()> {
    if data_type.is_integral() {
        Ok(())
    } else {
        Err(DialectError::invalid(format!(
            "autoincrement requires an integer column, got {data_type}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::lit;
    use crate::dialect::DialectKind;

    #[test]
    fn standard_type_names() {
        let d = Dialect::new(DialectKind::Generic);
        assert_eq!(d.types().render_type(&d, &DataType::Integer).unwrap(), "INT");
        assert_eq!(
            d.types().render_type(&d, &DataType::Varchar(20)).unwrap(),
            "VARCHAR(20)"
        );
        assert_eq!(
            d.types().auto_increment_type(&d, &DataType::Long).unwrap(),
            "BIGINT GENERATED BY DEFAULT AS IDENTITY"
        );
        assert!(d.types().auto_increment_type(&d, &DataType::Text).is_err());
    }

    #[test]
    fn unbounded_binary_is_invalid() {
        let d = Dialect::new(DialectKind::Generic);
        let err = d.types().render_type(&d, &DataType::Binary(None)).unwrap_err();
        assert!(matches!(err, DialectError::InvalidConfiguration(_)));
    }

    #[test]
    fn encode_value_checks_nulls_and_coerces() {
        let d = Dialect::new(DialectKind::Generic);
        let types = d.types();
        let not_null = ColumnType::new(DataType::Integer);
        assert!(types.encode_value(&not_null, SqlValue::Null).is_err());
        assert_eq!(
            types
                .encode_value(&not_null.nullable(), SqlValue::Null)
                .unwrap(),
            SqlValue::Null
        );

        let uuid = ColumnType::new(DataType::Uuid);
        let encoded = types
            .encode_value(&uuid, SqlValue::Text(Uuid::nil().to_string()))
            .unwrap();
        assert_eq!(encoded, SqlValue::Blob(vec![0; 16]));
        assert!(types
            .encode_value(&uuid, SqlValue::Text(String::from("nope")))
            .is_err());

        let json = ColumnType::new(DataType::Json);
        assert!(types
            .encode_value(&json, SqlValue::Text(String::from("{bad")))
            .is_err());
    }

    #[test]
    fn default_values() {
        let d = Dialect::new(DialectKind::Generic);
        let types = d.types();
        assert_eq!(types.default_value(&d, &lit("x")).unwrap(), "'x'");
        assert_eq!(
            types.default_value(&d, &lit(1).plus(lit(2))).unwrap(),
            "(1+2)"
        );
    }
}
