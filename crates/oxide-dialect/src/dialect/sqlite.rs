//! SQLite dialect.

use tracing::warn;

use super::capability::CapabilityFlags;
use super::functions::{json_path, push_call, push_pipe_concat, push_text, ExpressionCompiler};
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::{
    on_conflict_upsert, push_insert, update_from_join, IgnoreClause, StatementCompiler,
};
use super::types::{ensure_integral, TypeMapper};
use super::Dialect;
use crate::ast::{
    DataType, DatePart, Expr, ForeignKeyConstraint, Index, OrderBy, ReplaceOp,
    StatisticalFunction, UpdateOp, UpsertOp,
};
use crate::builder::{CompiledStatement, SqlValue, StatementBuffer};
use crate::config::DialectConfig;
use crate::error::Result;

/// SQLite: dynamic typing, `INSERT OR IGNORE`, `ON CONFLICT` upserts and
/// no schema, sequence or database DDL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

const KEYWORDS: &[&str] = &[
    "ABORT", "AUTOINCREMENT", "CONFLICT", "FAIL", "GLOB", "INDEXED", "ISNULL", "NOTNULL",
    "PRAGMA", "RAISE", "REGEXP", "REINDEX", "RENAME", "REPLACE", "VACUUM",
];

pub(super) fn profile(_config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    let capabilities = CapabilityFlags {
        supports_create_sequence: false,
        supports_create_schema: false,
        supports_database_ddl: false,
        supports_select_for_update: false,
        supports_multiple_generated_keys: false,
        supports_window_frame_groups_mode: true,
        supports_column_type_change: false,
        supports_partial_index: true,
        supports_functional_index: true,
        supports_drop_table_cascade: false,
        unique_index_as_constraint: false,
        auto_increment_implies_primary_key: true,
        supports_returning: true,
        supports_explain_analyze: false,
        ..CapabilityFlags::STANDARD
    };
    (
        capabilities,
        IdentifierManager::new('"', IdentifierCase::Mixed, KEYWORDS),
    )
}

impl TypeMapper for SqliteDialect {
    fn integer_type(&self) -> &'static str {
        "INTEGER"
    }

    fn long_type(&self) -> &'static str {
        "INTEGER"
    }

    fn float_type(&self) -> &'static str {
        "REAL"
    }

    fn double_type(&self) -> &'static str {
        "REAL"
    }

    // Any length is accepted; SQLite does not enforce it.
    fn binary_type(&self, _d: &Dialect, _length: Option<u32>) -> Result<String> {
        Ok(String::from("BLOB"))
    }

    fn uuid_type(&self) -> &'static str {
        "BLOB"
    }

    fn date_type(&self) -> &'static str {
        "TEXT"
    }

    fn time_type(&self) -> &'static str {
        "TEXT"
    }

    fn datetime_type(&self) -> &'static str {
        "TEXT"
    }

    fn timestamp_tz_type(&self) -> &'static str {
        "TEXT"
    }

    fn json_type(&self) -> &'static str {
        "TEXT"
    }

    fn auto_increment_type(&self, _d: &Dialect, data_type: &DataType) -> Result<String> {
        ensure_integral(data_type)?;
        Ok(String::from("INTEGER PRIMARY KEY AUTOINCREMENT"))
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

    fn temporal_as_text(&self) -> bool {
        true
    }
}

impl ExpressionCompiler for SqliteDialect {
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

    fn regexp(
        &self,
        _expr: &Expr,
        _pattern: &Expr,
        _case_sensitive: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        Err(buf.dialect().unsupported("REGEXP"))
    }

    fn group_concat(
        &self,
        expr: &Expr,
        separator: Option<&str>,
        distinct: bool,
        order_by: &[OrderBy],
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        if !order_by.is_empty() {
            return Err(buf.dialect().unsupported("GROUP_CONCAT with ORDER BY"));
        }
        if distinct && separator.is_some() {
            return Err(buf
                .dialect()
                .unsupported("GROUP_CONCAT DISTINCT with a separator"));
        }
        buf.push("GROUP_CONCAT(");
        if distinct {
            buf.push("DISTINCT ");
        }
        buf.push_expr(expr)?;
        if let Some(separator) = separator {
            buf.push_char(',');
            push_text(separator, buf);
        }
        buf.push_char(')');
        Ok(())
    }

    fn date_part(&self, part: DatePart, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        let format = match part {
            DatePart::Year => "%Y",
            DatePart::Month => "%m",
            DatePart::Day => "%d",
            DatePart::Hour => "%H",
            DatePart::Minute => "%M",
            DatePart::Second => "%S",
        };
        buf.push("CAST(STRFTIME(");
        push_text(format, buf);
        buf.push_char(',');
        buf.push_expr(expr)?;
        buf.push(") AS INTEGER)");
        Ok(())
    }

    fn statistical(
        &self,
        func: StatisticalFunction,
        _expr: &Expr,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        Err(buf.dialect().unsupported(func.standard_name()))
    }

    fn json_extract(
        &self,
        expr: &Expr,
        path: &[String],
        to_scalar: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        if to_scalar {
            buf.push("JSON_EXTRACT(");
            buf.push_expr(expr)?;
            buf.push_char(',');
            push_text(&json_path(path), buf);
            buf.push_char(')');
        } else {
            buf.push_expr(expr)?;
            buf.push(" -> ");
            push_text(&json_path(path), buf);
        }
        Ok(())
    }

    fn json_exists(
        &self,
        expr: &Expr,
        paths: &[String],
        _optional: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        let [path] = paths else {
            return Err(buf.dialect().unsupported("JSON exists with multiple paths"));
        };
        buf.push("JSON_TYPE(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(path, buf);
        buf.push(") IS NOT NULL");
        Ok(())
    }
}

impl StatementCompiler for SqliteDialect {
    fn insert_ignore(&self, _d: &Dialect) -> Result<IgnoreClause> {
        Ok(IgnoreClause::Prefix("INSERT OR IGNORE INTO"))
    }

    fn update_with_join(&self, d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
        update_from_join(d, op)
    }

    fn replace(&self, d: &Dialect, op: &ReplaceOp) -> Result<CompiledStatement> {
        let mut buf = StatementBuffer::new(d);
        push_insert(&mut buf, "REPLACE INTO", &op.table, &op.source, &[], self.default_values())?;
        Ok(buf.finish())
    }

    fn upsert(&self, d: &Dialect, op: &UpsertOp) -> Result<CompiledStatement> {
        on_conflict_upsert(d, op)
    }

    fn query_limit(
        &self,
        _d: &Dialect,
        limit: Option<u64>,
        offset: u64,
        _already_ordered: bool,
    ) -> String {
        match (limit, offset) {
            (None, 0) => String::new(),
            (Some(n), 0) => format!("LIMIT {n}"),
            (Some(n), m) => format!("LIMIT {n} OFFSET {m}"),
            (None, m) => format!("LIMIT -1 OFFSET {m}"),
        }
    }

    fn explain_prefix(&self, d: &Dialect, analyze: bool, options: Option<&str>) -> Result<String> {
        if analyze {
            return Err(d.unsupported("EXPLAIN ANALYZE"));
        }
        if options.is_some() {
            return Err(d.unsupported("EXPLAIN options"));
        }
        Ok(String::from("EXPLAIN QUERY PLAN "))
    }

    fn create_index_with_type(
        &self,
        d: &Dialect,
        _index: &Index,
        name: &str,
        index_type: &str,
    ) -> Result<Option<String>> {
        warn!(
            dialect = d.name(),
            index = %name,
            index_type,
            "Index types are not supported, index skipped"
        );
        Ok(None)
    }

    fn add_foreign_key(&self, d: &Dialect, _fk: &ForeignKeyConstraint) -> Result<String> {
        Err(d.unsupported("ALTER TABLE ADD FOREIGN KEY"))
    }

    fn drop_foreign_key(&self, d: &Dialect, _fk: &ForeignKeyConstraint) -> Result<String> {
        Err(d.unsupported("ALTER TABLE DROP FOREIGN KEY"))
    }

    fn set_schema(&self, d: &Dialect, _name: &str) -> Result<String> {
        Err(d.unsupported("SET SCHEMA"))
    }
}
