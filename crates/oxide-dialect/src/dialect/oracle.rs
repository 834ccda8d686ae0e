//! Oracle dialect.
//!
//! Identity columns are backed by explicit sequences, pagination uses
//! `OFFSET ... FETCH FIRST` and row limits on updates and deletes are folded
//! into the predicate as `ROWNUM <= n`.

use super::capability::{CapabilityFlags, RowLimitStyle};
use super::functions::{json_path, push_call, push_pipe_concat, push_text, ExpressionCompiler};
use super::generic::fetch_first;
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::{
    ident, prefixed_type_index, MergeFilter, MergeSource, MergeStyle, StatementCompiler,
};
use super::types::TypeMapper;
use super::Dialect;
use crate::ast::{Expr, Index, OrderBy};
use crate::builder::{hex_upper, SqlValue, StatementBuffer};
use crate::config::DialectConfig;
use crate::error::{DialectError, Result};

/// Oracle Database.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

const KEYWORDS: &[&str] = &[
    "ACCESS", "AUDIT", "CLUSTER", "COMMENT", "COMPRESS", "EXCLUSIVE", "FILE", "IDENTIFIED",
    "INCREMENT", "INITIAL", "LOCK", "LONG", "MAXEXTENTS", "MINUS", "MODE", "MODIFY", "NOAUDIT",
    "NOCOMPRESS", "NOWAIT", "NUMBER", "OFFLINE", "ONLINE", "PCTFREE", "RAW", "RENAME",
    "RESOURCE", "ROW", "ROWID", "ROWNUM", "SHARE", "START", "SUCCESSFUL", "SYNONYM", "SYSDATE",
    "TRIGGER", "UID", "VALIDATE", "VARCHAR2",
];

pub(super) fn profile(_config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    let capabilities = CapabilityFlags {
        supports_if_not_exists: false,
        supports_drop_if_exists: false,
        needs_sequence_for_autoincrement: true,
        supports_database_ddl: false,
        supports_restrict_reference_option: false,
        supports_set_default_reference_option: false,
        supports_on_update_reference: false,
        supports_dual_table: true,
        supports_functional_index: true,
        supports_explain_analyze: false,
        update_limit: RowLimitStyle::RowNum,
        delete_limit: RowLimitStyle::RowNum,
        ..CapabilityFlags::STANDARD
    };
    let identifiers =
        IdentifierManager::new('"', IdentifierCase::Upper, KEYWORDS).with_length_limit(Some(128));
    (capabilities, identifiers)
}

impl TypeMapper for OracleDialect {
    fn short_type(&self) -> &'static str {
        "NUMBER(5)"
    }

    fn integer_type(&self) -> &'static str {
        "NUMBER(12)"
    }

    fn long_type(&self) -> &'static str {
        "NUMBER(19)"
    }

    fn float_type(&self) -> &'static str {
        "BINARY_FLOAT"
    }

    fn double_type(&self) -> &'static str {
        "BINARY_DOUBLE"
    }

    fn decimal_type(&self, precision: u32, scale: u32) -> String {
        format!("NUMBER({precision},{scale})")
    }

    fn varchar_type(&self, length: u32) -> String {
        format!("VARCHAR2({length} CHAR)")
    }

    fn text_type(&self) -> &'static str {
        "CLOB"
    }

    fn binary_type(&self, d: &Dialect, length: Option<u32>) -> Result<String> {
        length.map(|n| format!("RAW({n})")).ok_or_else(|| {
            DialectError::invalid(format!(
                "binary columns require a length on the {} dialect",
                d.name()
            ))
        })
    }

    fn uuid_type(&self) -> &'static str {
        "RAW(16)"
    }

    fn time_type(&self) -> &'static str {
        "TIMESTAMP"
    }

    fn boolean_type(&self) -> &'static str {
        "CHAR(1)"
    }

    fn json_type(&self) -> &'static str {
        "VARCHAR2(4000)"
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn boolean_param(&self, value: bool) -> SqlValue {
        SqlValue::Int(i64::from(value))
    }

    fn hex_literal(&self, bytes: &[u8]) -> String {
        format!("HEXTORAW('{}')", hex_upper(bytes))
    }

    fn temporal_literal(&self, value: &SqlValue) -> String {
        let text = self.string_literal(&value.temporal_text().unwrap_or_default());
        match value {
            SqlValue::Date(_) => format!("DATE {text}"),
            SqlValue::DateTime(_) | SqlValue::TimestampTz(_) => format!("TIMESTAMP {text}"),
            _ => text,
        }
    }
}

impl ExpressionCompiler for OracleDialect {
    fn next_value(&self, d: &Dialect, sequence: &str) -> String {
        format!("{}.NEXTVAL", d.identifiers().quote_if_necessary(sequence))
    }

    fn char_length(&self, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        push_call("LENGTH", std::slice::from_ref(expr), buf)
    }

    fn substring(
        &self,
        expr: &Expr,
        start: &Expr,
        length: &Expr,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_call("SUBSTR", &[expr.clone(), start.clone(), length.clone()], buf)
    }

    fn concat(
        &self,
        separator: Option<&str>,
        exprs: &[Expr],
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_pipe_concat(separator, exprs, buf)
    }

    fn locate(&self, expr: &Expr, substring: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("INSTR(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(substring, buf);
        buf.push_char(')');
        Ok(())
    }

    fn group_concat(
        &self,
        expr: &Expr,
        separator: Option<&str>,
        distinct: bool,
        order_by: &[OrderBy],
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        if distinct {
            return Err(buf.dialect().unsupported("LISTAGG DISTINCT"));
        }
        buf.push("LISTAGG(");
        buf.push_expr(expr)?;
        if let Some(separator) = separator {
            buf.push_char(',');
            push_text(separator, buf);
        }
        buf.push(") WITHIN GROUP (ORDER BY ");
        if order_by.is_empty() {
            buf.push("NULL");
        } else {
            self.order_by_list(order_by, buf)?;
        }
        buf.push_char(')');
        Ok(())
    }

    fn random(&self, seed: Option<i64>, buf: &mut StatementBuffer<'_>) -> Result<()> {
        if seed.is_some() {
            return Err(buf.dialect().unsupported("RANDOM with a seed"));
        }
        buf.push("DBMS_RANDOM.VALUE");
        Ok(())
    }

    fn json_extract(
        &self,
        expr: &Expr,
        path: &[String],
        to_scalar: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        buf.push(if to_scalar { "JSON_VALUE(" } else { "JSON_QUERY(" });
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(&json_path(path), buf);
        buf.push_char(')');
        Ok(())
    }

    /// `optional` set to `all` requires every path; any path matches otherwise.
    fn json_exists(
        &self,
        expr: &Expr,
        paths: &[String],
        optional: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        if paths.is_empty() {
            return Err(DialectError::invalid("JSON exists requires at least one path"));
        }
        let joiner = if optional.is_some_and(|o| o.eq_ignore_ascii_case("all")) {
            " AND "
        } else {
            " OR "
        };
        if paths.len() > 1 {
            buf.push_char('(');
        }
        for (i, path) in paths.iter().enumerate() {
            if i > 0 {
                buf.push(joiner);
            }
            buf.push("JSON_EXISTS(");
            buf.push_expr(expr)?;
            buf.push_char(',');
            push_text(path, buf);
            buf.push_char(')');
        }
        if paths.len() > 1 {
            buf.push_char(')');
        }
        Ok(())
    }
}

impl StatementCompiler for OracleDialect {
    fn merge_style(&self) -> MergeStyle {
        MergeStyle {
            source: MergeSource::Dual,
            filter: MergeFilter::AfterSet,
            terminator: false,
        }
    }

    fn query_limit(
        &self,
        _d: &Dialect,
        limit: Option<u64>,
        offset: u64,
        _already_ordered: bool,
    ) -> String {
        fetch_first(limit, offset)
    }

    fn explain_prefix(&self, d: &Dialect, analyze: bool, options: Option<&str>) -> Result<String> {
        if analyze {
            return Err(d.unsupported("EXPLAIN ANALYZE"));
        }
        if options.is_some() {
            return Err(d.unsupported("EXPLAIN options"));
        }
        Ok(String::from("EXPLAIN PLAN FOR "))
    }

    fn drop_table(&self, d: &Dialect, name: &str, if_exists: bool, cascade: bool) -> Result<String> {
        if if_exists {
            return Err(d.unsupported("DROP TABLE IF EXISTS"));
        }
        let mut sql = format!("DROP TABLE {}", ident(d, name));
        if cascade {
            sql.push_str(" CASCADE CONSTRAINTS");
        }
        Ok(sql)
    }

    fn create_index_with_type(
        &self,
        d: &Dialect,
        index: &Index,
        name: &str,
        index_type: &str,
    ) -> Result<Option<String>> {
        prefixed_type_index(d, index, name, index_type).map(Some)
    }

    fn sequence_keywords(&self) -> (&'static str, &'static str) {
        ("NOCYCLE", "NOCACHE")
    }

    // Schemas are users.
    fn create_schema(&self, d: &Dialect, name: &str) -> Result<String> {
        Ok(format!("CREATE USER {} NO AUTHENTICATION", ident(d, name)))
    }

    fn drop_schema(&self, d: &Dialect, name: &str, cascade: bool) -> Result<String> {
        let mut sql = format!("DROP USER {}", ident(d, name));
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(sql)
    }

    fn set_schema(&self, d: &Dialect, name: &str) -> Result<String> {
        Ok(format!("ALTER SESSION SET CURRENT_SCHEMA = {}", ident(d, name)))
    }
}
