//! PostgreSQL dialect.

use std::sync::LazyLock;

use regex::Regex;

use super::capability::{CapabilityFlags, ParameterStyle};
use super::functions::{push_text, push_wrapped, ExpressionCompiler};
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::{on_conflict_upsert, update_from_join, IgnoreClause, StatementCompiler};
use super::types::{ensure_integral, TypeMapper, UuidEncoding};
use super::Dialect;
use crate::ast::{DataType, Expr, OrderBy, UpdateOp, UpsertOp};
use crate::builder::{hex_upper, CompiledStatement, SqlValue, StatementBuffer};
use crate::config::DialectConfig;
use crate::error::Result;

/// PostgreSQL: `$n` placeholders, `ON CONFLICT` upserts, native UUID and JSONB.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

const KEYWORDS: &[&str] = &[
    "ANALYSE", "ANALYZE", "ARRAY", "ILIKE", "LIMIT", "OFFSET", "RETURNING", "SYMMETRIC",
    "VARIADIC", "WINDOW",
];

/// Trailing `::type` casts PostgreSQL attaches to catalog defaults.
static CAST_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"::(?:[A-Za-z_][\w ]*|"[^"]+")(?:\(\d+(?:,\s*\d+)?\))?(?:\[\])*$"#)
        .expect("valid cast pattern")
});

pub(super) fn profile(_config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    let capabilities = CapabilityFlags {
        supports_select_for_share: true,
        supports_window_frame_groups_mode: true,
        supports_partial_index: true,
        supports_functional_index: true,
        supports_returning: true,
        parameter_style: ParameterStyle::Numbered,
        ..CapabilityFlags::STANDARD
    };
    let identifiers =
        IdentifierManager::new('"', IdentifierCase::Lower, KEYWORDS).with_length_limit(Some(63));
    (capabilities, identifiers)
}

/// Converts `$.a.b` or `a.b` into the `'{a,b}'` path literal.
fn path_literal(path: &str) -> String {
    let trimmed = path.trim_start_matches('$').trim_start_matches('.');
    let segments: Vec<&str> = trimmed.split('.').filter(|s| !s.is_empty()).collect();
    format!("'{{{}}}'", segments.join(",").replace('\'', "''"))
}

impl TypeMapper for PostgresDialect {
    fn float_type(&self) -> &'static str {
        "REAL"
    }

    fn binary_type(&self, _d: &Dialect, _length: Option<u32>) -> Result<String> {
        Ok(String::from("BYTEA"))
    }

    fn blob_type(&self) -> &'static str {
        "BYTEA"
    }

    fn uuid_type(&self) -> &'static str {
        "UUID"
    }

    fn jsonb_type(&self, _d: &Dialect) -> Result<String> {
        Ok(String::from("JSONB"))
    }

    fn auto_increment_type(&self, _d: &Dialect, data_type: &DataType) -> Result<String> {
        ensure_integral(data_type)?;
        let name = match data_type {
            DataType::Short => "SMALLSERIAL",
            DataType::Long => "BIGSERIAL",
            _ => "SERIAL",
        };
        Ok(String::from(name))
    }

    fn hex_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'::bytea", hex_upper(bytes))
    }

    fn uuid_encoding(&self) -> UuidEncoding {
        UuidEncoding::Native
    }

    fn encode_json(&self, value: serde_json::Value) -> SqlValue {
        SqlValue::Json(value)
    }

    fn sanitize_default(&self, raw: &str) -> String {
        CAST_SUFFIX.replace(raw.trim(), "").into_owned()
    }
}

impl ExpressionCompiler for PostgresDialect {
    fn next_value(&self, d: &Dialect, sequence: &str) -> String {
        let name = d.identifiers().quote_if_necessary(sequence);
        format!("NEXTVAL('{}')", name.replace('\'', "''"))
    }

    fn locate(&self, expr: &Expr, substring: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("POSITION(");
        push_text(substring, buf);
        buf.push(" IN ");
        buf.push_expr(expr)?;
        buf.push_char(')');
        Ok(())
    }

    fn regexp(
        &self,
        expr: &Expr,
        pattern: &Expr,
        case_sensitive: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(expr, buf)?;
        buf.push(if case_sensitive { " ~ " } else { " ~* " });
        push_wrapped(pattern, buf)
    }

    fn group_concat(
        &self,
        expr: &Expr,
        separator: Option<&str>,
        distinct: bool,
        order_by: &[OrderBy],
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        let Some(separator) = separator else {
            return Err(buf.dialect().unsupported("GROUP_CONCAT without a separator"));
        };
        buf.push("STRING_AGG(");
        if distinct {
            buf.push("DISTINCT ");
        }
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(separator, buf);
        if !order_by.is_empty() {
            buf.push(" ORDER BY ");
            self.order_by_list(order_by, buf)?;
        }
        buf.push_char(')');
        Ok(())
    }

    fn array_slice(
        &self,
        expr: &Expr,
        lower: Option<u32>,
        upper: Option<u32>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(expr, buf)?;
        let lower = lower.map(|n| n.to_string()).unwrap_or_default();
        let upper = upper.map(|n| n.to_string()).unwrap_or_default();
        buf.push(&format!("[{lower}:{upper}]"));
        Ok(())
    }

    fn json_extract(
        &self,
        expr: &Expr,
        path: &[String],
        to_scalar: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(expr, buf)?;
        match path {
            [key] => {
                buf.push(if to_scalar { "->>" } else { "->" });
                match key.parse::<u32>() {
                    Ok(index) => buf.push(&index.to_string()),
                    Err(_) => push_text(key, buf),
                }
            }
            _ => {
                buf.push(if to_scalar { "#>>" } else { "#>" });
                buf.push(&path_literal(&path.join(".")));
            }
        }
        Ok(())
    }

    fn json_contains(
        &self,
        expr: &Expr,
        candidate: &Expr,
        path: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(expr, buf)?;
        if let Some(path) = path {
            buf.push("#>");
            buf.push(&path_literal(path));
        }
        buf.push(" @> ");
        push_wrapped(candidate, buf)
    }

    fn json_exists(
        &self,
        expr: &Expr,
        paths: &[String],
        optional: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        let [path] = paths else {
            return Err(buf.dialect().unsupported("JSON exists with multiple paths"));
        };
        buf.push("JSONB_PATH_EXISTS(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(path, buf);
        if let Some(vars) = optional {
            buf.push_char(',');
            push_text(vars, buf);
        }
        buf.push_char(')');
        Ok(())
    }
}

impl StatementCompiler for PostgresDialect {
    fn insert_ignore(&self, _d: &Dialect) -> Result<IgnoreClause> {
        Ok(IgnoreClause::Suffix("ON CONFLICT DO NOTHING"))
    }

    fn update_with_join(&self, d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
        update_from_join(d, op)
    }

    fn upsert(&self, d: &Dialect, op: &UpsertOp) -> Result<CompiledStatement> {
        on_conflict_upsert(d, op)
    }

    fn explain_prefix(&self, _d: &Dialect, analyze: bool, options: Option<&str>) -> Result<String> {
        let mut parts = Vec::with_capacity(2);
        if analyze {
            parts.push("ANALYZE TRUE");
        }
        if let Some(options) = options {
            parts.push(options);
        }
        if parts.is_empty() {
            return Ok(String::from("EXPLAIN "));
        }
        Ok(format!("EXPLAIN ({}) ", parts.join(", ")))
    }

    fn set_schema(&self, d: &Dialect, name: &str) -> Result<String> {
        Ok(format!(
            "SET search_path TO {}",
            d.identifiers().quote_when_wrong_case_or_necessary(name)
        ))
    }
}
