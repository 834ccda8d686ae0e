//! Statement buffer shared by the expression and statement compilers.

use std::fmt;

use serde::Serialize;

use super::value::SqlValue;
use crate::ast::{ColumnRef, Expr};
use crate::dialect::{Dialect, ParameterStyle};
use crate::error::Result;

/// Compiled SQL text plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl CompiledStatement {
    /// A statement without arguments.
    #[must_use]
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// How an `EXCLUDED` reference is spelled in the statement being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertValueRef {
    /// Not inside an upsert.
    Unavailable,
    /// `EXCLUDED.col`
    Excluded,
    /// `VALUES(col)`
    ValuesFunction,
    /// `<alias>.col`, for row aliases and MERGE sources.
    Alias(&'static str),
}

/// A mutable SQL buffer bound to one dialect.
///
/// Arguments are either registered as placeholders or rendered inline
/// through the dialect's type mapper, depending on the buffer mode.
pub struct StatementBuffer<'d> {
    dialect: &'d Dialect,
    sql: String,
    params: Vec<SqlValue>,
    prepared: bool,
    qualify_columns: bool,
    /// Target table and the alias its columns are written against.
    target_alias: Option<(String, &'static str)>,
    insert_values: InsertValueRef,
}

impl<'d> StatementBuffer<'d> {
    /// Creates a buffer following the dialect's `prepared` setting.
    #[must_use]
    pub fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
            prepared: dialect.config().prepared,
            qualify_columns: true,
            target_alias: None,
            insert_values: InsertValueRef::Unavailable,
        }
    }

    /// Creates a buffer that renders every argument inline. Used for DDL.
    #[must_use]
    pub fn inline(dialect: &'d Dialect) -> Self {
        let mut buf = Self::new(dialect);
        buf.prepared = false;
        buf
    }

    #[must_use]
    pub const fn dialect(&self) -> &'d Dialect {
        self.dialect
    }

    #[must_use]
    pub const fn is_prepared(&self) -> bool {
        self.prepared
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn push_char(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Appends an identifier, quoted when the dialect requires it or would
    /// fold it to a different name.
    pub fn push_identifier(&mut self, name: &str) {
        let quoted = self
            .dialect
            .identifiers()
            .quote_when_wrong_case_or_necessary(name);
        self.sql.push_str(&quoted);
    }

    /// Appends a column, with its table qualifier unless qualification is off.
    ///
    /// Under a target alias, unqualified columns and columns of the target
    /// table are written as `<alias>.col`.
    pub fn push_column(&mut self, column: &ColumnRef) {
        let alias = self.target_alias.as_ref().and_then(|(target, alias)| {
            let on_target = match &column.table {
                None => true,
                Some(table) => table.eq_ignore_ascii_case(target),
            };
            on_target.then_some(*alias)
        });
        if let Some(alias) = alias {
            self.sql.push_str(alias);
            self.sql.push('.');
            self.push_identifier(&column.name);
            return;
        }
        if self.qualify_columns {
            if let Some(table) = &column.table {
                self.push_identifier(table);
                self.sql.push('.');
            }
        }
        self.push_identifier(&column.name);
    }

    /// Appends a placeholder and records the argument, or renders it inline.
    pub fn register_argument(&mut self, value: SqlValue) {
        if !self.prepared {
            self.push_literal(&value);
            return;
        }
        self.params.push(value);
        match self.dialect.capabilities().parameter_style {
            ParameterStyle::QuestionMark => self.sql.push('?'),
            ParameterStyle::Numbered => {
                let n = self.params.len();
                self.sql.push_str(&format!("${n}"));
            }
        }
    }

    /// Appends a value in the dialect's literal form.
    pub fn push_literal(&mut self, value: &SqlValue) {
        let literal = self.dialect.types().literal(value);
        self.sql.push_str(&literal);
    }

    /// Compiles an expression into the buffer.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the dialect's expression compiler.
    pub fn push_expr(&mut self, expr: &Expr) -> Result<()> {
        let compiler = self.dialect.expressions();
        compiler.compile(expr, self)
    }

    /// Appends comma-separated items.
    ///
    /// # Errors
    ///
    /// Stops at the first item that fails.
    pub fn push_list<T>(
        &mut self,
        items: &[T],
        mut append: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push(',');
            }
            append(self, item)?;
        }
        Ok(())
    }

    /// Runs `f` with table qualifiers stripped from column references.
    pub fn without_qualifiers<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.qualify_columns, false);
        let result = f(self);
        self.qualify_columns = previous;
        result
    }

    /// Runs `f` with the columns of `table` written against `alias`.
    pub fn with_target_alias<R>(
        &mut self,
        table: &str,
        alias: &'static str,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = self.target_alias.replace((String::from(table), alias));
        let result = f(self);
        self.target_alias = previous;
        result
    }

    #[must_use]
    pub const fn insert_values(&self) -> InsertValueRef {
        self.insert_values
    }

    pub fn set_insert_values(&mut self, mode: InsertValueRef) {
        self.insert_values = mode;
    }

    #[must_use]
    pub fn finish(self) -> CompiledStatement {
        CompiledStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

impl fmt::Debug for StatementBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementBuffer")
            .field("dialect", &self.dialect.name())
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
