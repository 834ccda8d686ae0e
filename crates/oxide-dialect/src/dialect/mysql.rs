//! MySQL and MariaDB dialect.
//!
//! Both vendors share one implementation. Where MariaDB diverges (sequences,
//! `LOCK IN SHARE MODE`, `ANALYZE` statements, no row alias in upserts) the
//! code matches on [`DialectKind`].

use tracing::warn;

use super::capability::{CapabilityFlags, RowLimitStyle};
use super::functions::{json_path, push_call, push_text, push_wrapped, ExpressionCompiler};
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::{
    encode_row, ensure_assignments, ident, index_filter, index_parts, push_assignments,
    push_insert, push_pairs, IgnoreClause, StatementCompiler, UpsertPlan,
};
use super::types::{ensure_integral, TypeMapper};
use super::{Dialect, DialectKind};
use crate::ast::{
    DataType, DatePart, Expr, ForUpdateOption, ForeignKeyConstraint, Index, InsertSource,
    MatchMode, OrderBy, ReplaceOp, UpdateOp, UpsertOp,
};
use crate::builder::{CompiledStatement, InsertValueRef, SqlValue, StatementBuffer};
use crate::config::DialectConfig;
use crate::error::Result;

/// MySQL and MariaDB: backtick quoting, `ON DUPLICATE KEY UPDATE`, trailing
/// `LIMIT` on updates and deletes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

const KEYWORDS: &[&str] = &[
    "ACCESSIBLE", "ANALYZE", "CHANGE", "DATABASE", "DATABASES", "DUAL", "ENCLOSED", "EXPLAIN",
    "FULLTEXT", "GENERATED", "IGNORE", "INDEX", "KEYS", "KILL", "LIMIT", "LINES", "LOAD", "LOCK",
    "LONG", "OPTIMIZE", "RANK", "REGEXP", "RENAME", "REPLACE", "RLIKE", "ROW", "SCHEMAS",
    "SEPARATOR", "SHOW", "SPATIAL", "STRAIGHT_JOIN", "TERMINATED", "UNLOCK", "UNSIGNED", "USE",
    "ZEROFILL",
];

/// Largest row count MySQL accepts, used for an offset without limit.
const MAX_ROWS: u64 = u64::MAX;

pub(super) fn profile(kind: DialectKind, config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    let mariadb = kind == DialectKind::MariaDb;
    let capabilities = CapabilityFlags {
        supports_create_sequence: mariadb,
        default_reference_option: crate::ast::ReferenceOption::Restrict,
        supports_set_default_reference_option: false,
        supports_select_for_share: true,
        supports_ternary_affected_rows: true,
        supports_nulls_ordering: false,
        supports_dual_table: true,
        supports_functional_index: !mariadb && config.version_at_least(8, 0, 13),
        supports_returning: mariadb,
        supports_upsert_row_alias: !mariadb && config.version_at_least(8, 0, 19),
        supports_explain_analyze: mariadb || config.version_at_least(8, 0, 18),
        update_limit: RowLimitStyle::Limit,
        delete_limit: RowLimitStyle::Limit,
        ..CapabilityFlags::STANDARD
    };
    let identifiers =
        IdentifierManager::new('`', IdentifierCase::Mixed, KEYWORDS).with_length_limit(Some(64));
    (capabilities, identifiers)
}

impl TypeMapper for MySqlDialect {
    fn double_type(&self) -> &'static str {
        "DOUBLE"
    }

    fn datetime_type(&self) -> &'static str {
        "DATETIME"
    }

    fn timestamp_tz_type(&self) -> &'static str {
        "TIMESTAMP"
    }

    fn jsonb_type(&self, _d: &Dialect) -> Result<String> {
        Ok(String::from("JSON"))
    }

    fn auto_increment_type(&self, d: &Dialect, data_type: &DataType) -> Result<String> {
        ensure_integral(data_type)?;
        Ok(format!("{} AUTO_INCREMENT", self.render_type(d, data_type)?))
    }

    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn wraps_computed_default(&self) -> bool {
        false
    }
}

impl ExpressionCompiler for MySqlDialect {
    fn next_value(&self, d: &Dialect, sequence: &str) -> String {
        format!("NEXTVAL({})", d.identifiers().quote_if_necessary(sequence))
    }

    fn locate(&self, expr: &Expr, substring: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("LOCATE(");
        push_text(substring, buf);
        buf.push_char(',');
        buf.push_expr(expr)?;
        buf.push_char(')');
        Ok(())
    }

    // REGEXP follows the column collation; case sensitivity is not selectable.
    fn regexp(
        &self,
        expr: &Expr,
        pattern: &Expr,
        _case_sensitive: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(expr, buf)?;
        buf.push(" REGEXP ");
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
        buf.push("GROUP_CONCAT(");
        if distinct {
            buf.push("DISTINCT ");
        }
        buf.push_expr(expr)?;
        if !order_by.is_empty() {
            buf.push(" ORDER BY ");
            self.order_by_list(order_by, buf)?;
        }
        if let Some(separator) = separator {
            buf.push(" SEPARATOR ");
            push_text(separator, buf);
        }
        buf.push_char(')');
        Ok(())
    }

    fn match_text(
        &self,
        expr: &Expr,
        pattern: &str,
        mode: Option<MatchMode>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        buf.push("MATCH(");
        buf.push_expr(expr)?;
        buf.push(") AGAINST (");
        buf.register_argument(SqlValue::Text(String::from(pattern)));
        if let Some(mode) = mode {
            buf.push(mode.as_sql());
        }
        buf.push_char(')');
        Ok(())
    }

    fn date_part(&self, part: DatePart, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        push_call(part.keyword(), std::slice::from_ref(expr), buf)
    }

    fn random(&self, seed: Option<i64>, buf: &mut StatementBuffer<'_>) -> Result<()> {
        match seed {
            Some(seed) => buf.push(&format!("RAND({seed})")),
            None => buf.push("RAND()"),
        }
        Ok(())
    }

    fn json_extract(
        &self,
        expr: &Expr,
        path: &[String],
        to_scalar: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        if to_scalar {
            buf.push("JSON_UNQUOTE(");
        }
        buf.push("JSON_EXTRACT(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(&json_path(path), buf);
        buf.push_char(')');
        if to_scalar {
            buf.push_char(')');
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
        buf.push("JSON_CONTAINS(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        buf.push_expr(candidate)?;
        if let Some(path) = path {
            buf.push_char(',');
            push_text(path, buf);
        }
        buf.push_char(')');
        Ok(())
    }

    /// `optional` selects `one` (default) or `all` paths.
    fn json_exists(
        &self,
        expr: &Expr,
        paths: &[String],
        optional: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        if paths.is_empty() {
            return Err(crate::error::DialectError::invalid(
                "JSON exists requires at least one path",
            ));
        }
        buf.push("JSON_CONTAINS_PATH(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        push_text(optional.unwrap_or("one"), buf);
        for path in paths {
            buf.push_char(',');
            push_text(path, buf);
        }
        buf.push_char(')');
        Ok(())
    }

    fn cast(&self, expr: &Expr, data_type: &DataType, buf: &mut StatementBuffer<'_>) -> Result<()> {
        let target = match *data_type {
            DataType::Short | DataType::Integer | DataType::Long | DataType::Boolean => {
                String::from("SIGNED")
            }
            DataType::Float | DataType::Double => String::from("DOUBLE"),
            DataType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            DataType::Char(n) | DataType::Varchar(n) => format!("CHAR({n})"),
            DataType::Text => String::from("CHAR"),
            DataType::Binary(_) | DataType::Blob | DataType::Uuid => String::from("BINARY"),
            DataType::Date => String::from("DATE"),
            DataType::Time => String::from("TIME"),
            DataType::DateTime | DataType::TimestampWithTimeZone => String::from("DATETIME"),
            DataType::Json | DataType::Jsonb => String::from("JSON"),
        };
        buf.push("CAST(");
        buf.push_expr(expr)?;
        buf.push(" AS ");
        buf.push(&target);
        buf.push_char(')');
        Ok(())
    }

    fn emulate_nulls_order(
        &self,
        item: &OrderBy,
        nulls_first: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(&item.expr, buf)?;
        buf.push(if nulls_first {
            " IS NULL DESC,"
        } else {
            " IS NULL ASC,"
        });
        buf.push_expr(&item.expr)?;
        buf.push_char(' ');
        buf.push(item.order.direction());
        Ok(())
    }
}

impl StatementCompiler for MySqlDialect {
    fn insert_ignore(&self, _d: &Dialect) -> Result<IgnoreClause> {
        Ok(IgnoreClause::Prefix("INSERT IGNORE INTO"))
    }

    fn default_values(&self) -> &'static str {
        " () VALUES ()"
    }

    fn update_with_join(&self, d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
        ensure_assignments(op)?;
        if op.limit.is_some() {
            return Err(d.unsupported("UPDATE with a join and LIMIT"));
        }
        let mut buf = StatementBuffer::new(d);
        buf.push("UPDATE ");
        buf.push_identifier(&op.table);
        for join in &op.joins {
            buf.push_char(' ');
            buf.push(join.join_type.as_sql());
            buf.push_char(' ');
            buf.push_identifier(&join.table);
            buf.push(" ON ");
            buf.push_expr(&join.on)?;
        }
        buf.push(" SET ");
        push_assignments(&mut buf, &op.assignments, Some(&op.table))?;
        if let Some(filter) = &op.filter {
            buf.push(" WHERE ");
            buf.push_expr(filter)?;
        }
        Ok(buf.finish())
    }

    fn delete_ignore(&self, _d: &Dialect) -> Result<&'static str> {
        Ok("IGNORE ")
    }

    fn replace(&self, d: &Dialect, op: &ReplaceOp) -> Result<CompiledStatement> {
        let mut buf = StatementBuffer::new(d);
        push_insert(&mut buf, "REPLACE INTO", &op.table, &op.source, &[], self.default_values())?;
        Ok(buf.finish())
    }

    fn upsert(&self, d: &Dialect, op: &UpsertOp) -> Result<CompiledStatement> {
        if op.filter.is_some() {
            return Err(d.unsupported("upsert with a WHERE clause"));
        }
        if !op.keys.is_empty() {
            warn!(
                dialect = d.name(),
                table = %op.table.name,
                "ON DUPLICATE KEY UPDATE applies to every unique key, explicit conflict keys ignored"
            );
        }
        let plan = UpsertPlan::new(op)?;
        let mut buf = StatementBuffer::new(d);
        push_insert(
            &mut buf,
            "INSERT INTO",
            &op.table.qualified_name(),
            &InsertSource::Values(encode_row(d, &op.table, &op.data)?),
            &[],
            self.default_values(),
        )?;
        if d.capabilities().supports_upsert_row_alias {
            buf.push(" AS NEW");
            buf.set_insert_values(InsertValueRef::Alias("NEW"));
        } else {
            buf.set_insert_values(InsertValueRef::ValuesFunction);
        }
        buf.push(" ON DUPLICATE KEY UPDATE ");
        if plan.updates.is_empty() {
            // Nothing to change: a self-assignment keeps the statement valid.
            let column = plan
                .keys
                .first()
                .or_else(|| op.data.first().map(|(c, _)| c))
                .map_or_else(String::new, |c| ident(d, c));
            buf.push(&format!("{column}={column}"));
        } else {
            push_pairs(&mut buf, &plan.updates)?;
        }
        Ok(buf.finish())
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
            (None, m) => format!("LIMIT {MAX_ROWS} OFFSET {m}"),
        }
    }

    fn select_lock_clause(&self, d: &Dialect, option: ForUpdateOption) -> Result<String> {
        if option.is_share() && d.kind() == DialectKind::MariaDb {
            return Ok(format!("LOCK IN SHARE MODE{}", option.wait_mode()));
        }
        let mode = if option.is_share() { "SHARE" } else { "UPDATE" };
        Ok(format!("FOR {mode}{}", option.wait_mode()))
    }

    fn explain_prefix(&self, d: &Dialect, analyze: bool, options: Option<&str>) -> Result<String> {
        let mut sql = match (d.kind(), analyze) {
            (DialectKind::MariaDb, true) => String::from("ANALYZE "),
            (_, true) if !d.capabilities().supports_explain_analyze => {
                return Err(d.unsupported("EXPLAIN ANALYZE"))
            }
            (_, true) => String::from("EXPLAIN ANALYZE "),
            (_, false) => String::from("EXPLAIN "),
        };
        if let Some(options) = options {
            sql.push_str(options);
            sql.push(' ');
        }
        Ok(sql)
    }

    fn wraps_index_functions(&self) -> bool {
        true
    }

    fn create_index_with_type(
        &self,
        d: &Dialect,
        index: &Index,
        name: &str,
        index_type: &str,
    ) -> Result<Option<String>> {
        let parts = index_parts(d, index, true)?;
        let sql = if matches!(
            index_type.to_ascii_uppercase().as_str(),
            "FULLTEXT" | "SPATIAL"
        ) {
            format!(
                "CREATE {} INDEX {} ON {} ({parts})",
                index_type.to_ascii_uppercase(),
                ident(d, name),
                ident(d, &index.table)
            )
        } else {
            format!(
                "CREATE INDEX {} ON {} ({parts}) USING {index_type}{}",
                ident(d, name),
                ident(d, &index.table),
                index_filter(d, index)?
            )
        };
        Ok(Some(sql))
    }

    fn drop_index(&self, d: &Dialect, index: &Index) -> Result<String> {
        let name = d.identifiers().cut_if_necessary(&index.index_name());
        Ok(format!(
            "ALTER TABLE {} DROP INDEX {}",
            ident(d, &index.table),
            ident(d, &name)
        ))
    }

    fn drop_foreign_key(&self, d: &Dialect, fk: &ForeignKeyConstraint) -> Result<String> {
        let name = fk.name.clone().unwrap_or_else(|| fk.default_name());
        Ok(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            ident(d, &fk.from_table),
            d.identifiers().cut_if_necessary_and_quote(&name)
        ))
    }

    fn sequence_keywords(&self) -> (&'static str, &'static str) {
        ("NOCYCLE", "NOCACHE")
    }

    fn drop_schema(&self, d: &Dialect, name: &str, cascade: bool) -> Result<String> {
        if cascade {
            return Err(d.unsupported("DROP SCHEMA CASCADE"));
        }
        Ok(format!("DROP SCHEMA {}", ident(d, name)))
    }

    fn set_schema(&self, d: &Dialect, name: &str) -> Result<String> {
        Ok(format!("USE {}", ident(d, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit, param, qualified, ColumnDef, DeleteOp, Function, SortOrder, TableDef};
    use crate::config::DatabaseVersion;

    fn mysql(version: &str) -> Dialect {
        let version: DatabaseVersion = version.parse().unwrap();
        Dialect::with_config(DialectKind::MySql, DialectConfig::default().with_version(version))
            .unwrap()
    }

    fn table() -> TableDef {
        TableDef::new("t")
            .column(ColumnDef::new("id", DataType::Integer))
            .column(ColumnDef::new("name", DataType::Varchar(20)))
            .primary_key(&["id"])
    }

    #[test]
    fn upsert_uses_values_function_before_row_alias() {
        let d = mysql("8.0.18");
        let op = UpsertOp::new(table(), vec![("id", param(1)), ("name", param("a"))]);
        assert_eq!(
            d.statements().upsert(&d, &op).unwrap().sql,
            "INSERT INTO t (id,name) VALUES (?,?) ON DUPLICATE KEY UPDATE name=VALUES(name)"
        );

        let d = mysql("8.0.19");
        assert_eq!(
            d.statements().upsert(&d, &op).unwrap().sql,
            "INSERT INTO t (id,name) VALUES (?,?) AS NEW ON DUPLICATE KEY UPDATE name=NEW.name"
        );
    }

    #[test]
    fn upsert_filter_is_unsupported() {
        let d = Dialect::new(DialectKind::MySql);
        let op = UpsertOp::new(table(), vec![("id", param(1))]).filter(col("id").gt(lit(0)));
        let err = d.statements().upsert(&d, &op).unwrap_err();
        assert_eq!(err.unsupported_feature(), Some("upsert with a WHERE clause"));
    }

    #[test]
    fn upsert_without_updates_assigns_key_to_itself() {
        let d = Dialect::new(DialectKind::MariaDb);
        let op = UpsertOp::new(table(), vec![("id", param(1))]);
        assert_eq!(
            d.statements().upsert(&d, &op).unwrap().sql,
            "INSERT INTO t (id) VALUES (?) ON DUPLICATE KEY UPDATE id=id"
        );
    }

    #[test]
    fn delete_and_update_limits() {
        let d = Dialect::new(DialectKind::MySql);
        let op = DeleteOp::new("t").filter(col("id").gt(lit(1))).limit(5);
        assert_eq!(
            d.statements().delete(&d, &op).unwrap().sql,
            "DELETE FROM t WHERE id>1 LIMIT 5"
        );
        let op = UpdateOp::new("t").set("a", lit(1)).limit(2);
        assert_eq!(
            d.statements().update(&d, &op).unwrap().sql,
            "UPDATE t SET a=1 LIMIT 2"
        );
    }

    #[test]
    fn update_with_join_qualifies_targets() {
        let d = Dialect::new(DialectKind::MySql);
        let op = UpdateOp::new("t")
            .set("a", qualified("s", "a"))
            .join("s", qualified("t", "id").eq(qualified("s", "id")));
        assert_eq!(
            d.statements().update(&d, &op).unwrap().sql,
            "UPDATE t INNER JOIN s ON t.id=s.id SET t.a=s.a"
        );
    }

    #[test]
    fn offset_without_limit() {
        let d = Dialect::new(DialectKind::MySql);
        assert_eq!(
            d.query_limit(None, 10, false),
            "LIMIT 18446744073709551615 OFFSET 10"
        );
    }

    #[test]
    fn nulls_ordering_is_emulated() {
        let d = Dialect::new(DialectKind::MySql);
        let order = crate::ast::OrderBy {
            expr: col("a"),
            order: SortOrder::AscNullsLast,
        };
        assert_eq!(d.compile_order_by(&[order]).unwrap(), "a IS NULL ASC,a ASC");
    }

    #[test]
    fn functions() {
        let d = Dialect::new(DialectKind::MySql);
        let agg: Expr = Function::GroupConcat {
            expr: col("name"),
            separator: Some(String::from(";")),
            distinct: true,
            order_by: vec![col("name").desc()],
        }
        .into();
        assert_eq!(
            d.compile_expr(&agg).unwrap().sql,
            "GROUP_CONCAT(DISTINCT name ORDER BY name DESC SEPARATOR ';')"
        );

        let year: Expr = Function::DatePart {
            part: DatePart::Year,
            expr: col("created"),
        }
        .into();
        assert_eq!(d.compile_expr(&year).unwrap().sql, "YEAR(created)");

        let extract: Expr = Function::JsonExtract {
            expr: col("doc"),
            path: vec![String::from("tags"), String::from("0")],
            to_scalar: true,
        }
        .into();
        assert_eq!(
            d.compile_expr(&extract).unwrap().sql,
            "JSON_UNQUOTE(JSON_EXTRACT(doc,'$.tags[0]'))"
        );

        let found: Expr = Function::Match {
            expr: col("body"),
            pattern: String::from("rust"),
            mode: Some(MatchMode::Boolean),
        }
        .into();
        assert_eq!(
            d.compile_expr(&found).unwrap().sql,
            "MATCH(body) AGAINST (? IN BOOLEAN MODE)"
        );
    }

    #[test]
    fn string_literals_escape_backslashes() {
        let d = Dialect::new(DialectKind::MySql);
        assert_eq!(d.literal(&SqlValue::Text(String::from("a\\'b"))), "'a\\\\''b'");
    }

    #[test]
    fn version_gated_features() {
        let old = mysql("8.0.12");
        let index = Index::new("t", &[])
            .with_function(Function::Lower(col("name")).into())
            .named("t_lower_name");
        assert_eq!(old.create_index(&index).unwrap(), None);

        let new = mysql("8.0.36");
        assert_eq!(
            new.create_index(&index).unwrap().unwrap(),
            "CREATE INDEX t_lower_name ON t ((LOWER(name)))"
        );
    }

    #[test]
    fn mariadb_share_lock_and_sequences() {
        let d = Dialect::new(DialectKind::MariaDb);
        assert_eq!(
            d.select_lock_clause(ForUpdateOption::ForShare).unwrap(),
            "LOCK IN SHARE MODE"
        );
        let mut seq = crate::ast::Sequence::new("s");
        seq.cycle = Some(false);
        assert_eq!(
            d.statements().create_sequence(&d, &seq).unwrap(),
            "CREATE SEQUENCE s NOCYCLE"
        );
        let mysql = Dialect::new(DialectKind::MySql);
        assert!(mysql.statements().create_sequence(&mysql, &seq).is_err());
    }
}
