//! Microsoft SQL Server dialect.

use super::capability::{CapabilityFlags, RowLimitStyle};
use super::functions::{json_path, push_call, push_text, ExpressionCompiler};
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::{
    ensure_assignments, ident, prefixed_type_index, push_assignments, push_top, row_limit,
    MergeStyle, StatementCompiler,
};
use super::types::{ensure_integral, TypeMapper, UuidEncoding};
use super::Dialect;
use crate::ast::{DataType, DatePart, Expr, Index, OrderBy, StatisticalFunction, UpdateOp};
use crate::builder::{hex_upper, CompiledStatement, StatementBuffer};
use crate::config::DialectConfig;
use crate::error::Result;

/// SQL Server: bracket quoting, `TOP(n)` row limits and `MERGE` upserts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

const KEYWORDS: &[&str] = &[
    "BACKUP", "BROWSE", "BULK", "CHECKPOINT", "CLUSTERED", "DBCC", "DENY", "DUMP", "ERRLVL",
    "FILLFACTOR", "FREETEXT", "HOLDLOCK", "IDENTITY_INSERT", "KILL", "LINENO", "MERGE",
    "NOCHECK", "NONCLUSTERED", "OFFSETS", "OPENQUERY", "PERCENT", "PIVOT", "PLAN", "PRINT",
    "PROC", "RAISERROR", "READTEXT", "RECONFIGURE", "REPLICATION", "RESTORE", "ROWCOUNT",
    "ROWGUIDCOL", "RULE", "SAVE", "SETUSER", "SHUTDOWN", "STATISTICS", "TEXTSIZE", "TOP", "TRAN",
    "TRUNCATE", "TSEQUAL", "UNPIVOT", "UPDATETEXT", "WAITFOR", "WRITETEXT",
];

pub(super) fn profile(_config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    let capabilities = CapabilityFlags {
        supports_if_not_exists: false,
        supports_restrict_reference_option: false,
        supports_select_for_update: false,
        supports_nulls_ordering: false,
        supports_partial_index: true,
        supports_drop_table_cascade: false,
        requires_auto_commit_on_create_drop: true,
        supports_explain_analyze: false,
        update_limit: RowLimitStyle::Top,
        delete_limit: RowLimitStyle::Top,
        ..CapabilityFlags::STANDARD
    };
    let identifiers = IdentifierManager::new('"', IdentifierCase::Mixed, KEYWORDS)
        .with_brackets('[', ']')
        .with_length_limit(Some(128));
    (capabilities, identifiers)
}

/// Removes the parentheses SQL Server wraps stored defaults in: `((0))` is `0`.
fn strip_outer_parens(raw: &str) -> &str {
    let mut s = raw.trim();
    while s.starts_with('(') && s.ends_with(')') && closes_at_end(s) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

fn closes_at_end(s: &str) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == s.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

impl TypeMapper for SqlServerDialect {
    fn float_type(&self) -> &'static str {
        "REAL"
    }

    fn double_type(&self) -> &'static str {
        "FLOAT"
    }

    fn text_type(&self) -> &'static str {
        "VARCHAR(MAX)"
    }

    fn binary_type(&self, _d: &Dialect, length: Option<u32>) -> Result<String> {
        Ok(length.map_or_else(
            || String::from("VARBINARY(MAX)"),
            |n| format!("VARBINARY({n})"),
        ))
    }

    fn blob_type(&self) -> &'static str {
        "VARBINARY(MAX)"
    }

    fn uuid_type(&self) -> &'static str {
        "UNIQUEIDENTIFIER"
    }

    fn datetime_type(&self) -> &'static str {
        "DATETIME2"
    }

    fn timestamp_tz_type(&self) -> &'static str {
        "DATETIMEOFFSET"
    }

    fn boolean_type(&self) -> &'static str {
        "BIT"
    }

    fn json_type(&self) -> &'static str {
        "NVARCHAR(MAX)"
    }

    fn auto_increment_type(&self, d: &Dialect, data_type: &DataType) -> Result<String> {
        ensure_integral(data_type)?;
        Ok(format!("{} IDENTITY(1,1)", self.render_type(d, data_type)?))
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn hex_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", hex_upper(bytes))
    }

    fn uuid_encoding(&self) -> UuidEncoding {
        UuidEncoding::Text
    }

    fn wraps_computed_default(&self) -> bool {
        false
    }

    fn sanitize_default(&self, raw: &str) -> String {
        strip_outer_parens(raw).to_owned()
    }
}

impl ExpressionCompiler for SqlServerDialect {
    fn char_length(&self, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        push_call("LEN", std::slice::from_ref(expr), buf)
    }

    fn locate(&self, expr: &Expr, substring: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("CHARINDEX(");
        push_text(substring, buf);
        buf.push_char(',');
        buf.push_expr(expr)?;
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
        let d = buf.dialect();
        let Some(separator) = separator else {
            return Err(d.unsupported("STRING_AGG without a separator"));
        };
        if distinct {
            return Err(d.unsupported("STRING_AGG DISTINCT"));
        }
        if order_by.len() > 1 {
            return Err(d.unsupported("STRING_AGG with multiple ORDER BY keys"));
        }
        buf.push("STRING_AGG(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(separator, buf);
        buf.push_char(')');
        if !order_by.is_empty() {
            buf.push(" WITHIN GROUP (ORDER BY ");
            self.order_by_list(order_by, buf)?;
            buf.push_char(')');
        }
        Ok(())
    }

    fn date_part(&self, part: DatePart, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("DATEPART(");
        buf.push(part.keyword());
        buf.push_char(',');
        buf.push_expr(expr)?;
        buf.push_char(')');
        Ok(())
    }

    fn random(&self, seed: Option<i64>, buf: &mut StatementBuffer<'_>) -> Result<()> {
        match seed {
            Some(seed) => buf.push(&format!("RAND({seed})")),
            None => buf.push("RAND()"),
        }
        Ok(())
    }

    fn statistical(
        &self,
        func: StatisticalFunction,
        expr: &Expr,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        let name = match func {
            StatisticalFunction::StdDevPop => "STDEVP",
            StatisticalFunction::StdDevSamp => "STDEV",
            StatisticalFunction::VarPop => "VARP",
            StatisticalFunction::VarSamp => "VAR",
        };
        push_call(name, std::slice::from_ref(expr), buf)
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
}

impl StatementCompiler for SqlServerDialect {
    fn update_with_join(&self, d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
        ensure_assignments(op)?;
        let limit = row_limit(d, op.limit, d.capabilities().update_limit, "UPDATE LIMIT")?;
        let mut buf = StatementBuffer::new(d);
        buf.push("UPDATE ");
        push_top(&mut buf, limit);
        buf.push_identifier(&op.table);
        buf.push(" SET ");
        push_assignments(&mut buf, &op.assignments, None)?;
        buf.push(" FROM ");
        buf.push_identifier(&op.table);
        for join in &op.joins {
            buf.push_char(' ');
            buf.push(join.join_type.as_sql());
            buf.push_char(' ');
            buf.push_identifier(&join.table);
            buf.push(" ON ");
            buf.push_expr(&join.on)?;
        }
        if let Some(filter) = &op.filter {
            buf.push(" WHERE ");
            buf.push_expr(filter)?;
        }
        Ok(buf.finish())
    }

    fn merge_style(&self) -> MergeStyle {
        MergeStyle {
            terminator: true,
            ..MergeStyle::STANDARD
        }
    }

    /// `OFFSET ... FETCH` is only valid after an `ORDER BY`; unordered
    /// queries get a neutral one.
    fn query_limit(
        &self,
        _d: &Dialect,
        limit: Option<u64>,
        offset: u64,
        already_ordered: bool,
    ) -> String {
        if limit.is_none() && offset == 0 {
            return String::new();
        }
        let mut sql = String::new();
        if !already_ordered {
            sql.push_str("ORDER BY (SELECT NULL) ");
        }
        sql.push_str(&format!("OFFSET {offset} ROWS"));
        if let Some(n) = limit {
            sql.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
        }
        sql
    }

    fn explain_prefix(&self, d: &Dialect, _analyze: bool, _options: Option<&str>) -> Result<String> {
        Err(d.unsupported("EXPLAIN"))
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

    fn drop_index(&self, d: &Dialect, index: &Index) -> Result<String> {
        let name = d.identifiers().cut_if_necessary(&index.index_name());
        if index.unique && index.filter.is_none() && index.is_columns_only() {
            return Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                ident(d, &index.table),
                ident(d, &name)
            ));
        }
        Ok(format!(
            "DROP INDEX {} ON {}",
            ident(d, &name),
            ident(d, &index.table)
        ))
    }

    fn drop_schema(&self, d: &Dialect, name: &str, cascade: bool) -> Result<String> {
        if cascade {
            return Err(d.unsupported("DROP SCHEMA CASCADE"));
        }
        Ok(format!("DROP SCHEMA {}", ident(d, name)))
    }

    fn set_schema(&self, d: &Dialect, _name: &str) -> Result<String> {
        Err(d.unsupported("SET SCHEMA"))
    }
}
