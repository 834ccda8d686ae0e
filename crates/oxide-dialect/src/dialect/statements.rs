//! Whole-statement and DDL compilation.

use tracing::warn;

use super::capability::RowLimitStyle;
use super::functions::push_operand;
use super::types::ensure_integral;
use super::Dialect;
use crate::ast::{
    Assignment, BinaryOp, ColumnDef, DeleteOp, Expr, ExplainOp, ForUpdateOption,
    ForeignKeyConstraint, Index, InsertOp, InsertSource, JoinClause, JoinType, ReferenceOption,
    ReplaceOp, SelectOp, Sequence, TableDef, UpdateOp, UpsertOp,
};
use crate::builder::{CompiledStatement, InsertValueRef, StatementBuffer};
use crate::error::{DialectError, Result};

/// Where an ignore-conflicts marker goes in an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreClause {
    /// Replaces the `INSERT INTO` verb.
    Prefix(&'static str),
    /// Appended after the row.
    Suffix(&'static str),
}

/// How the source rows of a MERGE are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSource {
    /// `USING (VALUES (...)) S(cols)`
    Values,
    /// `USING (SELECT ... FROM DUAL) S`
    Dual,
}

/// Where the update predicate of a MERGE goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeFilter {
    /// `WHEN MATCHED AND <filter> THEN UPDATE ...`
    WhenMatched,
    /// `THEN UPDATE SET ... WHERE <filter>`
    AfterSet,
}

/// Vendor shape of a MERGE statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStyle {
    pub source: MergeSource,
    pub filter: MergeFilter,
    /// Terminate the statement with `;`.
    pub terminator: bool,
}

impl MergeStyle {
    pub const STANDARD: Self = Self {
        source: MergeSource::Values,
        filter: MergeFilter::WhenMatched,
        terminator: false,
    };
}

/// Quotes a name the way every DDL and DML statement does.
pub(crate) fn ident(d: &Dialect, name: &str) -> String {
    d.identifiers().quote_when_wrong_case_or_necessary(name)
}

pub(crate) fn ident_list<'a>(d: &Dialect, names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(|n| ident(d, n))
        .collect::<Vec<_>>()
        .join(",")
}

/// Passes bound values of known columns through the dialect's type encoding,
/// so a prepared row carries what the inline form would render.
///
/// # Errors
///
/// Fails on values the column type rejects.
pub(crate) fn encode_row(
    d: &Dialect,
    table: &TableDef,
    row: &[(String, Expr)],
) -> Result<Vec<(String, Expr)>> {
    row.iter()
        .map(|(column, value)| {
            let definition = table.columns.iter().find(|c| c.name == *column);
            let value = match (value, definition) {
                (Expr::Param(v), Some(def)) => {
                    Expr::Param(d.encode_value(&def.column_type, v.clone())?)
                }
                _ => value.clone(),
            };
            Ok((column.clone(), value))
        })
        .collect()
}

/// Appends `INSERT INTO t (cols) VALUES (...)` or the sub-select form.
pub(crate) fn push_insert(
    buf: &mut StatementBuffer<'_>,
    verb: &str,
    table: &str,
    source: &InsertSource,
    extra: &[(String, Expr)],
    empty_row: &str,
) -> Result<()> {
    buf.push(verb);
    buf.push_char(' ');
    buf.push_identifier(table);
    match source {
        InsertSource::Values(values) => {
            let row: Vec<&(String, Expr)> = values.iter().chain(extra).collect();
            if row.is_empty() {
                buf.push(empty_row);
                return Ok(());
            }
            buf.push(" (");
            buf.push_list(&row, |b, (column, _)| {
                b.push_identifier(column);
                Ok(())
            })?;
            buf.push(") VALUES (");
            buf.push_list(&row, |b, (_, value)| b.push_expr(value))?;
            buf.push_char(')');
        }
        InsertSource::Select { columns, query } => {
            buf.push(" (");
            buf.push_list(columns, |b, column| {
                b.push_identifier(column);
                Ok(())
            })?;
            buf.push(") ");
            buf.push(query);
        }
    }
    Ok(())
}

/// Appends `a=v,b=w`, optionally qualifying the target columns.
pub(crate) fn push_assignments(
    buf: &mut StatementBuffer<'_>,
    assignments: &[Assignment],
    qualifier: Option<&str>,
) -> Result<()> {
    buf.push_list(assignments, |b, assignment| {
        if let Some(table) = qualifier {
            b.push_identifier(table);
            b.push_char('.');
        }
        b.push_identifier(&assignment.column);
        b.push_char('=');
        b.push_expr(&assignment.value)
    })
}

pub(crate) fn push_pairs(buf: &mut StatementBuffer<'_>, pairs: &[(String, Expr)]) -> Result<()> {
    buf.push_list(pairs, |b, (column, value)| {
        b.push_identifier(column);
        b.push_char('=');
        b.push_expr(value)
    })
}

/// Validates a requested row limit against the vendor's style.
pub(crate) fn row_limit(
    d: &Dialect,
    limit: Option<u64>,
    style: RowLimitStyle,
    feature: &str,
) -> Result<Option<(RowLimitStyle, u64)>> {
    match limit {
        None => Ok(None),
        Some(_) if style == RowLimitStyle::Unsupported => Err(d.unsupported(feature)),
        Some(n) => Ok(Some((style, n))),
    }
}

pub(crate) fn push_top(buf: &mut StatementBuffer<'_>, limit: Option<(RowLimitStyle, u64)>) {
    if let Some((RowLimitStyle::Top, n)) = limit {
        buf.push(&format!("TOP({n}) "));
    }
}

/// Appends the `WHERE` clause, folding in `ROWNUM` and trailing `LIMIT` forms.
pub(crate) fn push_where(
    buf: &mut StatementBuffer<'_>,
    filter: Option<&Expr>,
    limit: Option<(RowLimitStyle, u64)>,
) -> Result<()> {
    let rownum = match limit {
        Some((RowLimitStyle::RowNum, n)) => Some(n),
        _ => None,
    };
    match (filter, rownum) {
        (Some(filter), Some(n)) => {
            buf.push(" WHERE ");
            push_operand(filter, BinaryOp::And, false, buf)?;
            buf.push(&format!(" AND ROWNUM <= {n}"));
        }
        (Some(filter), None) => {
            buf.push(" WHERE ");
            buf.push_expr(filter)?;
        }
        (None, Some(n)) => buf.push(&format!(" WHERE ROWNUM <= {n}")),
        (None, None) => {}
    }
    if let Some((RowLimitStyle::Limit, n)) = limit {
        buf.push(&format!(" LIMIT {n}"));
    }
    Ok(())
}

pub(crate) fn ensure_assignments(op: &UpdateOp) -> Result<()> {
    if op.assignments.is_empty() {
        return Err(DialectError::invalid(format!(
            "UPDATE on {} has no assignments",
            op.table
        )));
    }
    Ok(())
}

/// Rejects join shapes a derived MERGE cannot express.
pub(crate) fn single_inner_join<'a>(d: &Dialect, op: &'a UpdateOp) -> Result<&'a JoinClause> {
    match op.joins.as_slice() {
        [join] if join.join_type == JoinType::Inner => Ok(join),
        [join] => Err(d.unsupported(format!("UPDATE with {}", join.join_type.as_sql()))),
        _ => Err(d.unsupported("UPDATE with multiple joins")),
    }
}

/// `UPDATE t SET ... FROM j WHERE <join conditions> AND <filter>`.
pub(crate) fn update_from_join(d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
    ensure_assignments(op)?;
    if op.limit.is_some() {
        return Err(d.unsupported("UPDATE with a join and LIMIT"));
    }
    if let Some(join) = op.joins.iter().find(|j| j.join_type != JoinType::Inner) {
        return Err(d.unsupported(format!("UPDATE with {}", join.join_type.as_sql())));
    }
    let mut buf = StatementBuffer::new(d);
    buf.push("UPDATE ");
    buf.push_identifier(&op.table);
    buf.push(" SET ");
    push_assignments(&mut buf, &op.assignments, None)?;
    buf.push(" FROM ");
    buf.push_list(&op.joins, |b, join| {
        b.push_identifier(&join.table);
        Ok(())
    })?;
    let condition = op
        .joins
        .iter()
        .map(|j| j.on.clone())
        .chain(op.filter.clone())
        .reduce(Expr::and);
    if let Some(condition) = condition {
        buf.push(" WHERE ");
        buf.push_expr(&condition)?;
    }
    Ok(buf.finish())
}

/// Conflict target and update list of an upsert.
#[derive(Debug, Clone)]
pub(crate) struct UpsertPlan {
    pub keys: Vec<String>,
    pub updates: Vec<(String, Expr)>,
}

impl UpsertPlan {
    /// Resolves keys (explicit, primary key, first unique index) and the
    /// columns to update.
    pub fn new(op: &UpsertOp) -> Result<Self> {
        if op.data.is_empty() {
            return Err(DialectError::invalid(format!(
                "upsert on {} has no data columns",
                op.table.name
            )));
        }
        let keys = if op.keys.is_empty() {
            op.table.natural_keys().unwrap_or_default()
        } else {
            op.keys.clone()
        };
        let updates: Vec<(String, Expr)> = match &op.on_update {
            Some(updates) => updates.clone(),
            None => op
                .data
                .iter()
                .map(|(column, _)| column)
                .filter(|c| !keys.contains(c) && !op.on_update_exclude.contains(c))
                .map(|c| (c.clone(), Expr::Excluded(c.clone())))
                .collect(),
        };
        if updates.is_empty() && op.filter.is_some() {
            return Err(DialectError::invalid(format!(
                "upsert on {} has an update filter but no columns to update",
                op.table.name
            )));
        }
        Ok(Self { keys, updates })
    }

    /// # Errors
    ///
    /// Unsupported when neither keys, a primary key nor a unique index give
    /// a conflict target.
    pub fn require_keys(&self, d: &Dialect) -> Result<()> {
        if self.keys.is_empty() {
            return Err(d.unsupported("upsert without a conflict target"));
        }
        Ok(())
    }
}

/// `INSERT ... ON CONFLICT (keys) DO UPDATE SET c=EXCLUDED.c [WHERE ...]`.
pub(crate) fn on_conflict_upsert(d: &Dialect, op: &UpsertOp) -> Result<CompiledStatement> {
    let plan = UpsertPlan::new(op)?;
    plan.require_keys(d)?;
    let mut buf = StatementBuffer::new(d);
    let source = InsertSource::Values(encode_row(d, &op.table, &op.data)?);
    push_insert(
        &mut buf,
        "INSERT INTO",
        &op.table.qualified_name(),
        &source,
        &[],
        " DEFAULT VALUES",
    )?;
    buf.push(" ON CONFLICT (");
    buf.push(&ident_list(d, plan.keys.iter().map(String::as_str)));
    buf.push_char(')');
    if plan.updates.is_empty() {
        buf.push(" DO NOTHING");
        return Ok(buf.finish());
    }
    buf.set_insert_values(InsertValueRef::Excluded);
    buf.push(" DO UPDATE SET ");
    push_pairs(&mut buf, &plan.updates)?;
    if let Some(filter) = &op.filter {
        buf.push(" WHERE ");
        buf.push_expr(filter)?;
    }
    Ok(buf.finish())
}

/// `MERGE INTO t T USING (...) S ON (...) WHEN MATCHED ... WHEN NOT MATCHED ...`.
pub(crate) fn merge_upsert(
    d: &Dialect,
    op: &UpsertOp,
    style: MergeStyle,
) -> Result<CompiledStatement> {
    let plan = UpsertPlan::new(op)?;
    plan.require_keys(d)?;
    if let Some(missing) = plan
        .keys
        .iter()
        .find(|k| !op.data.iter().any(|(c, _)| c == *k))
    {
        return Err(DialectError::invalid(format!(
            "upsert key {missing} is not among the inserted columns of {}",
            op.table.name
        )));
    }

    let data = encode_row(d, &op.table, &op.data)?;
    let mut buf = StatementBuffer::new(d);
    buf.push("MERGE INTO ");
    buf.push_identifier(&op.table.qualified_name());
    buf.push(" T USING ");
    match style.source {
        MergeSource::Values => {
            buf.push("(VALUES (");
            buf.push_list(&data, |b, (_, value)| b.push_expr(value))?;
            buf.push(")) S(");
            buf.push(&ident_list(d, op.data.iter().map(|(c, _)| c.as_str())));
            buf.push_char(')');
        }
        MergeSource::Dual => {
            buf.push("(SELECT ");
            buf.push_list(&data, |b, (column, value)| {
                b.push_expr(value)?;
                b.push_char(' ');
                b.push_identifier(column);
                Ok(())
            })?;
            buf.push(" FROM DUAL) S");
        }
    }
    buf.push(" ON (");
    let on: Vec<String> = plan
        .keys
        .iter()
        .map(|k| {
            let k = ident(d, k);
            format!("T.{k}=S.{k}")
        })
        .collect();
    buf.push(&on.join(" AND "));
    buf.push_char(')');

    buf.set_insert_values(InsertValueRef::Alias("S"));
    if !plan.updates.is_empty() {
        buf.with_target_alias(&op.table.name, "T", |b| {
            b.push(" WHEN MATCHED");
            if let (Some(filter), MergeFilter::WhenMatched) = (&op.filter, style.filter) {
                b.push(" AND ");
                push_operand(filter, BinaryOp::And, false, b)?;
            }
            b.push(" THEN UPDATE SET ");
            push_pairs(b, &plan.updates)?;
            if let (Some(filter), MergeFilter::AfterSet) = (&op.filter, style.filter) {
                b.push(" WHERE ");
                b.push_expr(filter)?;
            }
            Ok::<(), DialectError>(())
        })?;
    }
    buf.push(" WHEN NOT MATCHED THEN INSERT (");
    buf.push(&ident_list(d, op.data.iter().map(|(c, _)| c.as_str())));
    buf.push(") VALUES (");
    let source: Vec<String> = op
        .data
        .iter()
        .map(|(c, _)| format!("S.{}", ident(d, c)))
        .collect();
    buf.push(&source.join(","));
    buf.push_char(')');
    if style.terminator {
        buf.push_char(';');
    }
    Ok(buf.finish())
}

/// The sequence backing an autoincrement column, if the dialect uses one.
pub(crate) fn column_sequence(d: &Dialect, table: &TableDef, column: &ColumnDef) -> Option<Sequence> {
    let auto = column.auto_increment.as_ref()?;
    let caps = d.capabilities();
    match &auto.sequence {
        Some(sequence) if caps.supports_create_sequence => Some(sequence.clone()),
        _ if caps.needs_sequence_for_autoincrement => {
            let name = format!("{}_{}_seq", table.name, column.name);
            Some(Sequence::new(d.identifiers().cut_if_necessary(&name)))
        }
        _ => None,
    }
}

/// Applies vendor substitution to a reference option; `NO ACTION` is omitted.
fn resolve_reference(d: &Dialect, option: Option<ReferenceOption>) -> Option<ReferenceOption> {
    let option = option?;
    let caps = d.capabilities();
    let resolved = if caps.supports_reference_option(option) {
        option
    } else {
        warn!(
            dialect = d.name(),
            requested = option.as_sql(),
            substituted = caps.default_reference_option.as_sql(),
            "Reference option not supported, using the dialect default"
        );
        caps.default_reference_option
    };
    (resolved != ReferenceOption::NoAction).then_some(resolved)
}

/// Renders an index key list: quoted columns, then unqualified expressions.
pub(crate) fn index_parts(d: &Dialect, index: &Index, wrap_functions: bool) -> Result<String> {
    let mut parts: Vec<String> = index.columns.iter().map(|c| ident(d, c)).collect();
    for function in &index.functions {
        let mut buf = StatementBuffer::inline(d);
        buf.without_qualifiers(|b| b.push_expr(function))?;
        let sql = buf.finish().sql;
        parts.push(if wrap_functions { format!("({sql})") } else { sql });
    }
    Ok(parts.join(","))
}

/// Renders an index predicate without table qualifiers.
pub(crate) fn index_filter(d: &Dialect, index: &Index) -> Result<String> {
    match &index.filter {
        Some(filter) => {
            let mut buf = StatementBuffer::inline(d);
            buf.push(" WHERE ");
            buf.without_qualifiers(|b| b.push_expr(filter))?;
            Ok(buf.finish().sql)
        }
        None => Ok(String::new()),
    }
}

/// `CREATE BITMAP INDEX name ON t (cols)`, for vendors naming the type as a prefix.
pub(crate) fn prefixed_type_index(d: &Dialect, index: &Index, name: &str, index_type: &str) -> Result<String> {
    Ok(format!(
        "CREATE {} INDEX {} ON {} ({}){}",
        index_type.to_ascii_uppercase(),
        ident(d, name),
        ident(d, &index.table),
        index_parts(d, index, false)?,
        index_filter(d, index)?
    ))
}

/// Compiles whole statements and DDL.
///
/// Every method fails with [`DialectError::UnsupportedByDialect`] rather
/// than emit SQL the vendor would reject. Index creation is the exception:
/// an index the vendor cannot express is skipped with a warning.
pub trait StatementCompiler: Send + Sync {
    /// # Errors
    ///
    /// Unsupported unless the vendor can skip conflicting rows.
    fn insert_ignore(&self, d: &Dialect) -> Result<IgnoreClause> {
        Err(d.unsupported("INSERT IGNORE"))
    }

    /// Row written when an insert names no columns.
    fn default_values(&self) -> &'static str {
        " DEFAULT VALUES"
    }

    /// # Errors
    ///
    /// Fails on an unsupported ignore request or expression.
    fn insert(&self, d: &Dialect, op: &InsertOp) -> Result<CompiledStatement> {
        let ignore = if op.ignore {
            Some(self.insert_ignore(d)?)
        } else {
            None
        };
        let verb = match ignore {
            Some(IgnoreClause::Prefix(verb)) => verb,
            _ => "INSERT INTO",
        };

        let source = match &op.source {
            InsertSource::Values(values) => {
                InsertSource::Values(encode_row(d, &op.table, values)?)
            }
            select @ InsertSource::Select { .. } => select.clone(),
        };

        // Sequence-backed identity columns the caller left out.
        let mut extra = Vec::new();
        if let InsertSource::Values(values) = &source {
            for column in &op.table.columns {
                if values.iter().any(|(c, _)| *c == column.name) {
                    continue;
                }
                if let Some(sequence) = column_sequence(d, &op.table, column) {
                    extra.push((column.name.clone(), Expr::NextValue(sequence.name)));
                }
            }
        }

        let mut buf = StatementBuffer::new(d);
        push_insert(
            &mut buf,
            verb,
            &op.table.qualified_name(),
            &source,
            &extra,
            self.default_values(),
        )?;
        if let Some(IgnoreClause::Suffix(suffix)) = ignore {
            buf.push_char(' ');
            buf.push(suffix);
        }
        Ok(buf.finish())
    }

    /// # Errors
    ///
    /// `UPDATE LIMIT` where the vendor has no row limit, or any join failure.
    fn update(&self, d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
        if !op.joins.is_empty() {
            return self.update_with_join(d, op);
        }
        ensure_assignments(op)?;
        let limit = row_limit(d, op.limit, d.capabilities().update_limit, "UPDATE LIMIT")?;
        let mut buf = StatementBuffer::new(d);
        buf.push("UPDATE ");
        push_top(&mut buf, limit);
        buf.push_identifier(&op.table);
        buf.push(" SET ");
        push_assignments(&mut buf, &op.assignments, None)?;
        push_where(&mut buf, op.filter.as_ref(), limit)?;
        Ok(buf.finish())
    }

    /// Joined update as a MERGE with the joined table as source.
    ///
    /// # Errors
    ///
    /// Fails with more than one join, a non-inner join or a limit.
    fn update_with_join(&self, d: &Dialect, op: &UpdateOp) -> Result<CompiledStatement> {
        ensure_assignments(op)?;
        let join = single_inner_join(d, op)?;
        if op.limit.is_some() {
            return Err(d.unsupported("UPDATE with a join and LIMIT"));
        }
        let style = self.merge_style();
        let mut buf = StatementBuffer::new(d);
        buf.push("MERGE INTO ");
        buf.push_identifier(&op.table);
        buf.push(" USING ");
        buf.push_identifier(&join.table);
        buf.push(" ON (");
        buf.push_expr(&join.on)?;
        buf.push(") WHEN MATCHED");
        if let (Some(filter), MergeFilter::WhenMatched) = (&op.filter, style.filter) {
            buf.push(" AND ");
            push_operand(filter, BinaryOp::And, false, &mut buf)?;
        }
        buf.push(" THEN UPDATE SET ");
        push_assignments(&mut buf, &op.assignments, None)?;
        if let (Some(filter), MergeFilter::AfterSet) = (&op.filter, style.filter) {
            buf.push(" WHERE ");
            buf.push_expr(filter)?;
        }
        if style.terminator {
            buf.push_char(';');
        }
        Ok(buf.finish())
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn delete_ignore(&self, d: &Dialect) -> Result<&'static str> {
        Err(d.unsupported("DELETE IGNORE"))
    }

    /// # Errors
    ///
    /// `DELETE LIMIT` where the vendor has no row limit.
    fn delete(&self, d: &Dialect, op: &DeleteOp) -> Result<CompiledStatement> {
        let limit = row_limit(d, op.limit, d.capabilities().delete_limit, "DELETE LIMIT")?;
        let mut buf = StatementBuffer::new(d);
        buf.push("DELETE ");
        if op.ignore {
            buf.push(self.delete_ignore(d)?);
        }
        push_top(&mut buf, limit);
        buf.push("FROM ");
        buf.push_identifier(&op.table);
        push_where(&mut buf, op.filter.as_ref(), limit)?;
        Ok(buf.finish())
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn replace(&self, d: &Dialect, _op: &ReplaceOp) -> Result<CompiledStatement> {
        Err(d.unsupported("REPLACE"))
    }

    fn merge_style(&self) -> MergeStyle {
        MergeStyle::STANDARD
    }

    /// # Errors
    ///
    /// Invalid without data columns or conflict target.
    fn upsert(&self, d: &Dialect, op: &UpsertOp) -> Result<CompiledStatement> {
        merge_upsert(d, op, self.merge_style())
    }

    /// Pagination clause appended to a query. Empty when nothing is limited.
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
            (None, m) => format!("OFFSET {m}"),
        }
    }

    /// # Errors
    ///
    /// Fails when the vendor cannot lock rows in the requested mode.
    fn select_lock_clause(&self, d: &Dialect, option: ForUpdateOption) -> Result<String> {
        let caps = d.capabilities();
        if !caps.supports_select_for_update {
            return Err(d.unsupported("SELECT FOR UPDATE"));
        }
        if option.is_share() && !caps.supports_select_for_share {
            return Err(d.unsupported("SELECT FOR SHARE"));
        }
        let mode = if option.is_share() { "SHARE" } else { "UPDATE" };
        Ok(format!("FOR {mode}{}", option.wait_mode()))
    }

    /// # Errors
    ///
    /// Propagates lock clause failures.
    fn select(&self, d: &Dialect, op: &SelectOp) -> Result<CompiledStatement> {
        let mut sql = op.query.clone();
        let limit = self.query_limit(d, op.limit, op.offset, op.ordered);
        if !limit.is_empty() {
            sql.push(' ');
            sql.push_str(&limit);
        }
        if let Some(lock) = op.lock {
            sql.push(' ');
            sql.push_str(&self.select_lock_clause(d, lock)?);
        }
        Ok(CompiledStatement::text(sql))
    }

    /// # Errors
    ///
    /// `EXPLAIN ANALYZE` where the vendor cannot analyze.
    fn explain_prefix(&self, d: &Dialect, analyze: bool, options: Option<&str>) -> Result<String> {
        if analyze && !d.capabilities().supports_explain_analyze {
            return Err(d.unsupported("EXPLAIN ANALYZE"));
        }
        let mut sql = String::from("EXPLAIN ");
        if analyze {
            sql.push_str("ANALYZE ");
        }
        if let Some(options) = options {
            sql.push_str(options);
            sql.push(' ');
        }
        Ok(sql)
    }

    /// # Errors
    ///
    /// Fails when the prefix or the explained statement fails.
    fn explain(&self, d: &Dialect, op: &ExplainOp) -> Result<CompiledStatement> {
        let prefix = self.explain_prefix(d, op.analyze, op.options.as_deref())?;
        let mut statements = d.compile(&op.statement)?;
        if statements.len() != 1 {
            return Err(DialectError::invalid(
                "EXPLAIN requires an operation that compiles to exactly one statement",
            ));
        }
        let inner = statements.remove(0);
        Ok(CompiledStatement {
            sql: format!("{prefix}{}", inner.sql),
            params: inner.params,
        })
    }

    /// `name TYPE [DEFAULT x] [NOT NULL]`
    ///
    /// # Errors
    ///
    /// Fails on unrenderable types or defaults.
    fn column_definition(&self, d: &Dialect, table: &TableDef, column: &ColumnDef) -> Result<String> {
        let data_type = &column.column_type.data_type;
        let mut sql = ident(d, &column.name);
        sql.push(' ');
        if column.auto_increment.is_some() {
            ensure_integral(data_type)?;
            if column_sequence(d, table, column).is_some() {
                sql.push_str(&d.types().render_type(d, data_type)?);
            } else {
                sql.push_str(&d.types().auto_increment_type(d, data_type)?);
            }
        } else {
            sql.push_str(&d.render_type(&column.column_type)?);
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&d.types().default_value(d, default)?);
        }
        if !column.column_type.nullable {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    /// Backing sequences first, then the table, then its indices.
    ///
    /// # Errors
    ///
    /// Fails on unsupported `IF NOT EXISTS` or any column failure.
    fn create_table(&self, d: &Dialect, table: &TableDef, if_not_exists: bool) -> Result<Vec<String>> {
        let caps = d.capabilities();
        if if_not_exists && !caps.supports_if_not_exists {
            return Err(d.unsupported("CREATE TABLE IF NOT EXISTS"));
        }
        if table.columns.is_empty() {
            return Err(DialectError::invalid(format!(
                "table {} has no columns",
                table.name
            )));
        }
        let mut statements = Vec::new();
        for column in &table.columns {
            if let Some(sequence) = column_sequence(d, table, column) {
                statements.push(self.create_sequence(d, &sequence)?);
            }
        }

        let mut parts = Vec::with_capacity(table.columns.len() + 1);
        for column in &table.columns {
            parts.push(self.column_definition(d, table, column)?);
        }
        if let Some(pk) = &table.primary_key {
            let implied = caps.auto_increment_implies_primary_key
                && pk.columns.len() == 1
                && table
                    .find_column(&pk.columns[0])
                    .is_some_and(|c| c.auto_increment.is_some());
            if !implied && !pk.columns.is_empty() {
                let name = pk
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("pk_{}", table.name));
                parts.push(format!(
                    "CONSTRAINT {} PRIMARY KEY ({})",
                    d.identifiers().cut_if_necessary_and_quote(&name),
                    ident_list(d, pk.columns.iter().map(String::as_str))
                ));
            }
        }
        for fk in &table.foreign_keys {
            parts.push(self.foreign_key_clause(d, fk)?);
        }

        let mut sql = String::from("CREATE TABLE ");
        if if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&ident(d, &table.qualified_name()));
        sql.push_str(" (");
        sql.push_str(&parts.join(", "));
        sql.push(')');
        statements.push(sql);

        for index in &table.indices {
            if let Some(sql) = self.create_index(d, index)? {
                statements.push(sql);
            }
        }
        Ok(statements)
    }

    /// # Errors
    ///
    /// Fails on unsupported `IF EXISTS` or `CASCADE`.
    fn drop_table(&self, d: &Dialect, name: &str, if_exists: bool, cascade: bool) -> Result<String> {
        let caps = d.capabilities();
        if if_exists && !caps.supports_drop_if_exists {
            return Err(d.unsupported("DROP TABLE IF EXISTS"));
        }
        if cascade && !caps.supports_drop_table_cascade {
            return Err(d.unsupported("DROP TABLE CASCADE"));
        }
        let mut sql = String::from("DROP TABLE ");
        if if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&ident(d, name));
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(sql)
    }

    /// `CONSTRAINT name FOREIGN KEY (cols) REFERENCES target(cols) [ON DELETE x] [ON UPDATE y]`
    ///
    /// # Errors
    ///
    /// Invalid when the constraint has no columns.
    fn foreign_key_clause(&self, d: &Dialect, fk: &ForeignKeyConstraint) -> Result<String> {
        if fk.references.is_empty() {
            return Err(DialectError::invalid(format!(
                "foreign key on {} has no columns",
                fk.from_table
            )));
        }
        let name = fk.name.clone().unwrap_or_else(|| fk.default_name());
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            d.identifiers().cut_if_necessary_and_quote(&name),
            ident_list(d, fk.from_columns()),
            ident(d, &fk.target_table),
            ident_list(d, fk.target_columns())
        );
        if let Some(option) = resolve_reference(d, fk.on_delete) {
            sql.push_str(" ON DELETE ");
            sql.push_str(option.as_sql());
        }
        if d.capabilities().supports_on_update_reference {
            if let Some(option) = resolve_reference(d, fk.on_update) {
                sql.push_str(" ON UPDATE ");
                sql.push_str(option.as_sql());
            }
        } else if fk.on_update.is_some_and(|o| o != ReferenceOption::NoAction) {
            warn!(
                dialect = d.name(),
                constraint = %name,
                "ON UPDATE actions are not supported, clause omitted"
            );
        }
        Ok(sql)
    }

    /// # Errors
    ///
    /// Propagates clause failures.
    fn add_foreign_key(&self, d: &Dialect, fk: &ForeignKeyConstraint) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            ident(d, &fk.from_table),
            self.foreign_key_clause(d, fk)?
        ))
    }

    /// # Errors
    ///
    /// Fails where constraints cannot be dropped.
    fn drop_foreign_key(&self, d: &Dialect, fk: &ForeignKeyConstraint) -> Result<String> {
        let name = fk.name.clone().unwrap_or_else(|| fk.default_name());
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            ident(d, &fk.from_table),
            d.identifiers().cut_if_necessary_and_quote(&name)
        ))
    }

    /// Creates an index, or returns `Ok(None)` with a warning when the
    /// vendor cannot express its filter, functions or type.
    ///
    /// # Errors
    ///
    /// Invalid for an index without keys or a unique index with a type.
    fn create_index(&self, d: &Dialect, index: &Index) -> Result<Option<String>> {
        let caps = d.capabilities();
        let name = d.identifiers().cut_if_necessary(&index.index_name());
        if index.columns.is_empty() && index.functions.is_empty() {
            return Err(DialectError::invalid(format!("index {name} has no columns")));
        }
        if index.unique && index.index_type.is_some() {
            return Err(DialectError::invalid(format!(
                "unique index {name} cannot also declare an index type"
            )));
        }
        if index.filter.is_some() && !caps.supports_partial_index {
            warn!(dialect = d.name(), index = %name, "Partial indices are not supported, index skipped");
            return Ok(None);
        }
        if !index.functions.is_empty() && !caps.supports_functional_index {
            warn!(dialect = d.name(), index = %name, "Functional indices are not supported, index skipped");
            return Ok(None);
        }
        if index.unique
            && index.filter.is_none()
            && index.is_columns_only()
            && caps.unique_index_as_constraint
        {
            return Ok(Some(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                ident(d, &index.table),
                ident(d, &name),
                ident_list(d, index.columns.iter().map(String::as_str))
            )));
        }
        if let Some(index_type) = &index.index_type {
            return self.create_index_with_type(d, index, &name, index_type);
        }
        let unique = if index.unique { "UNIQUE " } else { "" };
        Ok(Some(format!(
            "CREATE {unique}INDEX {} ON {} ({}){}",
            ident(d, &name),
            ident(d, &index.table),
            index_parts(d, index, self.wraps_index_functions())?,
            index_filter(d, index)?
        )))
    }

    /// Functional key parts need their own parentheses.
    fn wraps_index_functions(&self) -> bool {
        false
    }

    /// `CREATE INDEX name ON t USING type (cols)`
    ///
    /// # Errors
    ///
    /// Propagates key rendering failures.
    fn create_index_with_type(
        &self,
        d: &Dialect,
        index: &Index,
        name: &str,
        index_type: &str,
    ) -> Result<Option<String>> {
        Ok(Some(format!(
            "CREATE INDEX {} ON {} USING {index_type} ({}){}",
            ident(d, name),
            ident(d, &index.table),
            index_parts(d, index, false)?,
            index_filter(d, index)?
        )))
    }

    /// Drops what [`create_index`](Self::create_index) created.
    ///
    /// # Errors
    ///
    /// Fails where the vendor cannot drop indices.
    fn drop_index(&self, d: &Dialect, index: &Index) -> Result<String> {
        let name = d.identifiers().cut_if_necessary(&index.index_name());
        if index.unique
            && index.filter.is_none()
            && index.is_columns_only()
            && d.capabilities().unique_index_as_constraint
        {
            return Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                ident(d, &index.table),
                ident(d, &name)
            ));
        }
        Ok(format!("DROP INDEX {}", ident(d, &name)))
    }

    /// Keywords disabling cycling and caching: `(no_cycle, no_cache)`.
    fn sequence_keywords(&self) -> (&'static str, &'static str) {
        ("NO CYCLE", "NO CACHE")
    }

    /// # Errors
    ///
    /// Unsupported where the vendor has no sequences.
    fn create_sequence(&self, d: &Dialect, sequence: &Sequence) -> Result<String> {
        if !d.capabilities().supports_create_sequence {
            return Err(d.unsupported("CREATE SEQUENCE"));
        }
        let (no_cycle, no_cache) = self.sequence_keywords();
        let mut sql = format!("CREATE SEQUENCE {}", ident(d, &sequence.name));
        if let Some(start) = sequence.start_with {
            sql.push_str(&format!(" START WITH {start}"));
        }
        if let Some(step) = sequence.increment_by {
            sql.push_str(&format!(" INCREMENT BY {step}"));
        }
        if let Some(min) = sequence.min_value {
            sql.push_str(&format!(" MINVALUE {min}"));
        }
        if let Some(max) = sequence.max_value {
            sql.push_str(&format!(" MAXVALUE {max}"));
        }
        match sequence.cycle {
            Some(true) => sql.push_str(" CYCLE"),
            Some(false) => {
                sql.push(' ');
                sql.push_str(no_cycle);
            }
            None => {}
        }
        match sequence.cache {
            Some(0) => {
                sql.push(' ');
                sql.push_str(no_cache);
            }
            Some(n) => sql.push_str(&format!(" CACHE {n}")),
            None => {}
        }
        Ok(sql)
    }

    /// # Errors
    ///
    /// Unsupported where the vendor has no sequences.
    fn drop_sequence(&self, d: &Dialect, name: &str) -> Result<String> {
        if !d.capabilities().supports_create_sequence {
            return Err(d.unsupported("DROP SEQUENCE"));
        }
        Ok(format!("DROP SEQUENCE {}", ident(d, name)))
    }

    /// # Errors
    ///
    /// Unsupported where the vendor has no schemas.
    fn create_schema(&self, d: &Dialect, name: &str) -> Result<String> {
        if !d.capabilities().supports_create_schema {
            return Err(d.unsupported("CREATE SCHEMA"));
        }
        Ok(format!("CREATE SCHEMA {}", ident(d, name)))
    }

    /// # Errors
    ///
    /// Unsupported where the vendor has no schemas.
    fn drop_schema(&self, d: &Dialect, name: &str, cascade: bool) -> Result<String> {
        if !d.capabilities().supports_create_schema {
            return Err(d.unsupported("DROP SCHEMA"));
        }
        let mut sql = format!("DROP SCHEMA {}", ident(d, name));
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(sql)
    }

    /// # Errors
    ///
    /// Unsupported where sessions cannot switch schema.
    fn set_schema(&self, d: &Dialect, name: &str) -> Result<String> {
        Ok(format!("SET SCHEMA {}", ident(d, name)))
    }

    /// # Errors
    ///
    /// Unsupported for embedded and file databases.
    fn create_database(&self, d: &Dialect, name: &str) -> Result<String> {
        if !d.capabilities().supports_database_ddl {
            return Err(d.unsupported("CREATE DATABASE"));
        }
        Ok(format!("CREATE DATABASE {}", ident(d, name)))
    }

    /// # Errors
    ///
    /// Unsupported for embedded and file databases.
    fn drop_database(&self, d: &Dialect, name: &str) -> Result<String> {
        if !d.capabilities().supports_database_ddl {
            return Err(d.unsupported("DROP DATABASE"));
        }
        Ok(format!("DROP DATABASE {}", ident(d, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit, param, DataType, ForeignKeyConstraint};
    use crate::dialect::DialectKind;

    fn table() -> TableDef {
        TableDef::new("t")
            .column(ColumnDef::new("id", DataType::Integer))
            .column(ColumnDef::new("name", DataType::Varchar(50)))
            .primary_key(&["id"])
    }

    #[test]
    fn generic_delete() {
        let d = Dialect::new(DialectKind::Generic);
        let op = DeleteOp::new("t").filter(col("id").eq(lit(1)));
        assert_eq!(d.statements().delete(&d, &op).unwrap().sql, "DELETE FROM t WHERE id=1");

        let err = d.statements().delete(&d, &op.limit(5)).unwrap_err();
        assert_eq!(err.unsupported_feature(), Some("DELETE LIMIT"));
    }

    #[test]
    fn generic_merge_upsert() {
        let d = Dialect::new(DialectKind::Generic);
        let op = UpsertOp::new(table(), vec![("id", param(1)), ("name", param("a"))]);
        let stmt = d.statements().upsert(&d, &op).unwrap();
        assert_eq!(
            stmt.sql,
            "MERGE INTO t T USING (VALUES (?,?)) S(id,name) ON (T.id=S.id) \
             WHEN MATCHED THEN UPDATE SET name=S.name \
             WHEN NOT MATCHED THEN INSERT (id,name) VALUES (S.id,S.name)"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn upsert_without_data_is_invalid() {
        let d = Dialect::new(DialectKind::Generic);
        let op = UpsertOp::new(table(), vec![]);
        let err = d.statements().upsert(&d, &op).unwrap_err();
        assert!(matches!(err, DialectError::InvalidConfiguration(_)));
    }

    #[test]
    fn upsert_without_keys_is_invalid() {
        let d = Dialect::new(DialectKind::Generic);
        let op = UpsertOp::new(TableDef::new("t"), vec![("a", param(1))]);
        let err = d.statements().upsert(&d, &op).unwrap_err();
        assert!(matches!(err, DialectError::InvalidConfiguration(_)));
    }

    #[test]
    fn update_limit_unsupported_by_default() {
        let d = Dialect::new(DialectKind::Generic);
        let op = UpdateOp::new("t").set("a", lit(1)).limit(2);
        let err = d.statements().update(&d, &op).unwrap_err();
        assert_eq!(err.unsupported_feature(), Some("UPDATE LIMIT"));
    }

    #[test]
    fn merge_update_with_join() {
        let d = Dialect::new(DialectKind::Generic);
        let op = UpdateOp::new("t")
            .set("a", crate::ast::qualified("s", "a"))
            .join("s", crate::ast::qualified("t", "id").eq(crate::ast::qualified("s", "id")))
            .filter(crate::ast::qualified("s", "flag").eq(lit(true)));
        assert_eq!(
            d.statements().update(&d, &op).unwrap().sql,
            "MERGE INTO t USING s ON (t.id=s.id) WHEN MATCHED AND s.flag=TRUE THEN UPDATE SET a=s.a"
        );
        let err = d.statements().update(&d, &op.limit(1)).unwrap_err();
        assert_eq!(err.unsupported_feature(), Some("UPDATE with a join and LIMIT"));
    }

    #[test]
    fn foreign_key_clause_omits_no_action() {
        let d = Dialect::new(DialectKind::Generic);
        let fk = ForeignKeyConstraint::new("orders", "user_id", "users", "id")
            .on_delete(ReferenceOption::Cascade)
            .on_update(ReferenceOption::NoAction);
        assert_eq!(
            d.statements().foreign_key_clause(&d, &fk).unwrap(),
            "CONSTRAINT fk_orders_user_id__id FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE"
        );
    }

    #[test]
    fn create_sequence_options() {
        let d = Dialect::new(DialectKind::Generic);
        let mut seq = Sequence::new("s").start_with(10).increment_by(2);
        seq.cycle = Some(false);
        assert_eq!(
            d.statements().create_sequence(&d, &seq).unwrap(),
            "CREATE SEQUENCE s START WITH 10 INCREMENT BY 2 NO CYCLE"
        );
    }
}
