//! Expression and function compilation.

use super::Dialect;
use crate::ast::{
    AggregateFunction, BinaryOp, DataType, DatePart, Expr, Function, MatchMode, OrderBy,
    StatisticalFunction,
};
use crate::builder::{InsertValueRef, SqlValue, StatementBuffer};
use crate::error::{DialectError, Result};

/// Appends `expr`, parenthesized unless it renders as a single token or call.
pub(crate) fn push_wrapped(expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
    if expr.is_atomic() || matches!(expr, Expr::Raw(_)) {
        return buf.push_expr(expr);
    }
    buf.push_char('(');
    buf.push_expr(expr)?;
    buf.push_char(')');
    Ok(())
}

/// Appends an operand of a binary operator, parenthesized if it binds looser.
pub(crate) fn push_operand(
    expr: &Expr,
    parent: BinaryOp,
    right: bool,
    buf: &mut StatementBuffer<'_>,
) -> Result<()> {
    let needs_parens = match expr {
        Expr::Binary { op, .. } => {
            op.precedence() < parent.precedence()
                || (right
                    && op.precedence() == parent.precedence()
                    && matches!(parent, BinaryOp::Sub | BinaryOp::Div))
        }
        _ => false,
    };
    if needs_parens {
        buf.push_char('(');
        buf.push_expr(expr)?;
        buf.push_char(')');
        Ok(())
    } else {
        buf.push_expr(expr)
    }
}

/// Appends `name(args)`.
pub(crate) fn push_call(name: &str, args: &[Expr], buf: &mut StatementBuffer<'_>) -> Result<()> {
    buf.push(name);
    buf.push_char('(');
    buf.push_list(args, |b, arg| b.push_expr(arg))?;
    buf.push_char(')');
    Ok(())
}

/// Appends a string constant inline, independent of the buffer mode.
pub(crate) fn push_text(value: &str, buf: &mut StatementBuffer<'_>) {
    buf.push_literal(&SqlValue::Text(String::from(value)));
}

/// Appends `a || 'sep' || b` for vendors concatenating with the pipe operator.
pub(crate) fn push_pipe_concat(
    separator: Option<&str>,
    exprs: &[Expr],
    buf: &mut StatementBuffer<'_>,
) -> Result<()> {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            buf.push(" || ");
            if let Some(sep) = separator {
                push_text(sep, buf);
                buf.push(" || ");
            }
        }
        push_wrapped(expr, buf)?;
    }
    Ok(())
}

/// Builds a `$.a[0].b` JSON path from its segments.
pub(crate) fn json_path(segments: &[String]) -> String {
    let mut path = String::from("$");
    for segment in segments {
        if segment.parse::<u32>().is_ok() {
            path.push('[');
            path.push_str(segment);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(segment);
        }
    }
    path
}

/// Compiles expression nodes into a [`StatementBuffer`].
///
/// Standard functions have default renderings. Functions that are not
/// universally available fail by default and are implemented by the
/// vendors that have them.
pub trait ExpressionCompiler: Send + Sync {
    /// # Errors
    ///
    /// Fails with [`DialectError::UnsupportedByDialect`] for any node the
    /// dialect cannot express.
    fn compile(&self, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        match expr {
            Expr::Column(column) => buf.push_column(column),
            Expr::Literal(value) => buf.push_literal(value),
            Expr::Param(value) => buf.register_argument(value.clone()),
            Expr::Raw(sql) => buf.push(sql),
            Expr::Excluded(column) => self.excluded(column, buf)?,
            Expr::NextValue(sequence) => {
                let sql = self.next_value(buf.dialect(), sequence);
                buf.push(&sql);
            }
            Expr::Binary { op, left, right } => {
                push_operand(left, *op, false, buf)?;
                buf.push(op.as_sql());
                push_operand(right, *op, true, buf)?;
            }
            Expr::Not(inner) => {
                buf.push("NOT ");
                push_wrapped(inner, buf)?;
            }
            Expr::IsNull { expr, negated } => {
                push_wrapped(expr, buf)?;
                buf.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    // Nothing is in an empty list.
                    buf.push(if *negated { "1=1" } else { "1=0" });
                    return Ok(());
                }
                push_wrapped(expr, buf)?;
                buf.push(if *negated { " NOT IN (" } else { " IN (" });
                buf.push_list(list, |b, e| b.push_expr(e))?;
                buf.push_char(')');
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                push_wrapped(expr, buf)?;
                buf.push(if *negated { " NOT LIKE " } else { " LIKE " });
                push_wrapped(pattern, buf)?;
            }
            Expr::Function(function) => self.function(function, buf)?,
            Expr::Cast { expr, data_type } => self.cast(expr, data_type, buf)?,
        }
        Ok(())
    }

    /// Renders the proposed value of an upsert column.
    ///
    /// # Errors
    ///
    /// [`DialectError::InvalidConfiguration`] outside of an upsert.
    fn excluded(&self, column: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        match buf.insert_values() {
            InsertValueRef::Unavailable => {
                return Err(DialectError::invalid(format!(
                    "EXCLUDED reference to {column} outside of an upsert"
                )))
            }
            InsertValueRef::Excluded => {
                buf.push("EXCLUDED.");
                buf.push_identifier(column);
            }
            InsertValueRef::ValuesFunction => {
                buf.push("VALUES(");
                buf.push_identifier(column);
                buf.push_char(')');
            }
            InsertValueRef::Alias(alias) => {
                buf.push(alias);
                buf.push_char('.');
                buf.push_identifier(column);
            }
        }
        Ok(())
    }

    /// Expression yielding the next value of `sequence`.
    fn next_value(&self, d: &Dialect, sequence: &str) -> String {
        format!("NEXT VALUE FOR {}", d.identifiers().quote_if_necessary(sequence))
    }

    /// Dispatches a function node.
    ///
    /// # Errors
    ///
    /// Propagates the failure of the specific function.
    fn function(&self, function: &Function, buf: &mut StatementBuffer<'_>) -> Result<()> {
        match function {
            Function::CharLength(expr) => self.char_length(expr, buf),
            Function::Lower(expr) => push_call("LOWER", std::slice::from_ref(expr), buf),
            Function::Upper(expr) => push_call("UPPER", std::slice::from_ref(expr), buf),
            Function::Substring {
                expr,
                start,
                length,
            } => self.substring(expr, start, length, buf),
            Function::Concat { separator, exprs } => self.concat(separator.as_deref(), exprs, buf),
            Function::GroupConcat {
                expr,
                separator,
                distinct,
                order_by,
            } => self.group_concat(expr, separator.as_deref(), *distinct, order_by, buf),
            Function::Locate { expr, substring } => self.locate(expr, substring, buf),
            Function::Regexp {
                expr,
                pattern,
                case_sensitive,
            } => self.regexp(expr, pattern, *case_sensitive, buf),
            Function::Match {
                expr,
                pattern,
                mode,
            } => self.match_text(expr, pattern, *mode, buf),
            Function::DatePart { part, expr } => self.date_part(*part, expr, buf),
            Function::Random { seed } => self.random(*seed, buf),
            Function::Aggregate {
                func,
                expr,
                distinct,
            } => {
                buf.push(func.name());
                buf.push_char('(');
                match expr {
                    Some(expr) => {
                        if *distinct {
                            buf.push("DISTINCT ");
                        }
                        buf.push_expr(expr)?;
                    }
                    None if *func == AggregateFunction::Count => buf.push_char('*'),
                    None => {
                        return Err(DialectError::invalid(format!(
                            "{} requires an argument",
                            func.name()
                        )))
                    }
                }
                buf.push_char(')');
                Ok(())
            }
            Function::Statistical { func, expr } => self.statistical(*func, expr, buf),
            Function::Coalesce(exprs) => push_call("COALESCE", exprs, buf),
            Function::ArraySlice { expr, lower, upper } => {
                self.array_slice(expr, *lower, *upper, buf)
            }
            Function::JsonExtract {
                expr,
                path,
                to_scalar,
            } => self.json_extract(expr, path, *to_scalar, buf),
            Function::JsonContains {
                expr,
                candidate,
                path,
            } => self.json_contains(expr, candidate, path.as_deref(), buf),
            Function::JsonExists {
                expr,
                paths,
                optional,
            } => self.json_exists(expr, paths, optional.as_deref(), buf),
            Function::Custom { name, args } => push_call(name, args, buf),
        }
    }

    fn char_length(&self, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        push_call("CHAR_LENGTH", std::slice::from_ref(expr), buf)
    }

    fn substring(
        &self,
        expr: &Expr,
        start: &Expr,
        length: &Expr,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_call(
            "SUBSTRING",
            &[expr.clone(), start.clone(), length.clone()],
            buf,
        )
    }

    fn concat(
        &self,
        separator: Option<&str>,
        exprs: &[Expr],
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        match separator {
            None => push_call("CONCAT", exprs, buf),
            Some(sep) => {
                buf.push("CONCAT_WS(");
                push_text(sep, buf);
                for expr in exprs {
                    buf.push_char(',');
                    buf.push_expr(expr)?;
                }
                buf.push_char(')');
                Ok(())
            }
        }
    }

    /// Default form: `LISTAGG(e,'sep') WITHIN GROUP (ORDER BY ...)`.
    fn group_concat(
        &self,
        expr: &Expr,
        separator: Option<&str>,
        distinct: bool,
        order_by: &[OrderBy],
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        buf.push("LISTAGG(");
        if distinct {
            buf.push("DISTINCT ");
        }
        buf.push_expr(expr)?;
        if let Some(sep) = separator {
            buf.push_char(',');
            push_text(sep, buf);
        }
        buf.push_char(')');
        if !order_by.is_empty() {
            buf.push(" WITHIN GROUP (ORDER BY ");
            self.order_by_list(order_by, buf)?;
            buf.push_char(')');
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn locate(&self, _expr: &Expr, _substring: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        Err(buf.dialect().unsupported("LOCATE"))
    }

    fn regexp(
        &self,
        expr: &Expr,
        pattern: &Expr,
        case_sensitive: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        buf.push("REGEXP_LIKE(");
        buf.push_expr(expr)?;
        buf.push_char(',');
        buf.push_expr(pattern)?;
        buf.push(if case_sensitive { ",'c')" } else { ",'i')" });
        Ok(())
    }

    /// Full-text search. Dialects without it fall back to `LIKE`.
    fn match_text(
        &self,
        expr: &Expr,
        pattern: &str,
        _mode: Option<MatchMode>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_wrapped(expr, buf)?;
        buf.push(" LIKE ");
        buf.register_argument(SqlValue::Text(String::from(pattern)));
        Ok(())
    }

    fn date_part(&self, part: DatePart, expr: &Expr, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("EXTRACT(");
        buf.push(part.keyword());
        buf.push(" FROM ");
        buf.push_expr(expr)?;
        buf.push_char(')');
        Ok(())
    }

    /// # Errors
    ///
    /// Seeded random numbers are unsupported by default.
    fn random(&self, seed: Option<i64>, buf: &mut StatementBuffer<'_>) -> Result<()> {
        if seed.is_some() {
            return Err(buf.dialect().unsupported("RANDOM with a seed"));
        }
        buf.push("RANDOM()");
        Ok(())
    }

    fn statistical(
        &self,
        func: StatisticalFunction,
        expr: &Expr,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        push_call(func.standard_name(), std::slice::from_ref(expr), buf)
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn array_slice(
        &self,
        _expr: &Expr,
        _lower: Option<u32>,
        _upper: Option<u32>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        Err(buf.dialect().unsupported("array slice"))
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn json_extract(
        &self,
        _expr: &Expr,
        _path: &[String],
        _to_scalar: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        Err(buf.dialect().unsupported("JSON extract"))
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn json_contains(
        &self,
        _expr: &Expr,
        _candidate: &Expr,
        _path: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        Err(buf.dialect().unsupported("JSON contains"))
    }

    /// # Errors
    ///
    /// Unsupported by default.
    fn json_exists(
        &self,
        _expr: &Expr,
        _paths: &[String],
        _optional: Option<&str>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        Err(buf.dialect().unsupported("JSON exists"))
    }

    fn cast(&self, expr: &Expr, data_type: &DataType, buf: &mut StatementBuffer<'_>) -> Result<()> {
        let d = buf.dialect();
        let type_name = d.types().render_type(d, data_type)?;
        buf.push("CAST(");
        buf.push_expr(expr)?;
        buf.push(" AS ");
        buf.push(&type_name);
        buf.push_char(')');
        Ok(())
    }

    /// Appends comma-separated sort keys.
    fn order_by_list(&self, items: &[OrderBy], buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push_list(items, |b, item| self.order_by_item(item, b))
    }

    fn order_by_item(&self, item: &OrderBy, buf: &mut StatementBuffer<'_>) -> Result<()> {
        let native = buf.dialect().capabilities().supports_nulls_ordering;
        match item.order.nulls_first() {
            Some(first) if !native => self.emulate_nulls_order(item, first, buf),
            nulls => {
                buf.push_expr(&item.expr)?;
                buf.push_char(' ');
                buf.push(item.order.direction());
                match nulls {
                    Some(true) => buf.push(" NULLS FIRST"),
                    Some(false) => buf.push(" NULLS LAST"),
                    None => {}
                }
                Ok(())
            }
        }
    }

    /// Orders nulls with an auxiliary `CASE` key.
    fn emulate_nulls_order(
        &self,
        item: &OrderBy,
        nulls_first: bool,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        buf.push("CASE WHEN ");
        push_wrapped(&item.expr, buf)?;
        buf.push(if nulls_first {
            " IS NULL THEN 0 ELSE 1 END,"
        } else {
            " IS NULL THEN 1 ELSE 0 END,"
        });
        buf.push_expr(&item.expr)?;
        buf.push_char(' ');
        buf.push(item.order.direction());
        Ok(())
    }
}
