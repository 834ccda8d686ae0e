//! H2 dialect.

use tracing::warn;

use super::capability::{CapabilityFlags, RowLimitStyle};
use super::functions::{push_text, ExpressionCompiler};
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::{prefixed_type_index, StatementCompiler};
use super::types::{TypeMapper, UuidEncoding};
use super::Dialect;
use crate::ast::{Expr, Index, ReferenceOption};
use crate::builder::StatementBuffer;
use crate::config::DialectConfig;
use crate::error::Result;

/// H2: close to the standard, with `LIMIT` on updates and deletes and a
/// native UUID type.
#[derive(Debug, Clone, Copy, Default)]
pub struct H2Dialect;

const KEYWORDS: &[&str] = &[
    "_ROWID_", "ILIKE", "INTERSECTS", "LIMIT", "MINUS", "OFFSET", "QUALIFY", "REGEXP", "ROWNUM",
    "SYSDATE", "SYSTIME", "SYSTIMESTAMP", "TODAY", "TOP",
];

pub(super) fn profile(_config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    let capabilities = CapabilityFlags {
        supports_database_ddl: false,
        default_reference_option: ReferenceOption::Restrict,
        supports_dual_table: true,
        supports_window_frame_groups_mode: true,
        update_limit: RowLimitStyle::Limit,
        delete_limit: RowLimitStyle::Limit,
        ..CapabilityFlags::STANDARD
    };
    let identifiers =
        IdentifierManager::new('"', IdentifierCase::Upper, KEYWORDS).with_length_limit(Some(256));
    (capabilities, identifiers)
}

impl TypeMapper for H2Dialect {
    fn text_type(&self) -> &'static str {
        "CLOB"
    }

    fn binary_type(&self, d: &Dialect, length: Option<u32>) -> Result<String> {
        match length {
            Some(n) => Ok(format!("VARBINARY({n})")),
            None => {
                warn!(
                    dialect = d.name(),
                    "Binary column without a length, using the VARBINARY default"
                );
                Ok(String::from("VARBINARY"))
            }
        }
    }

    fn uuid_type(&self) -> &'static str {
        "UUID"
    }

    fn uuid_encoding(&self) -> UuidEncoding {
        UuidEncoding::Native
    }
}

impl ExpressionCompiler for H2Dialect {
    fn locate(&self, expr: &Expr, substring: &str, buf: &mut StatementBuffer<'_>) -> Result<()> {
        buf.push("LOCATE(");
        push_text(substring, buf);
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

    /// `ARRAY_SLICE(a, lower, upper)` with 1-based inclusive bounds.
    fn array_slice(
        &self,
        expr: &Expr,
        lower: Option<u32>,
        upper: Option<u32>,
        buf: &mut StatementBuffer<'_>,
    ) -> Result<()> {
        buf.push("ARRAY_SLICE(");
        buf.push_expr(expr)?;
        buf.push(&format!(",{},", lower.unwrap_or(1)));
        match upper {
            Some(n) => buf.push(&n.to_string()),
            None => {
                buf.push("CARDINALITY(");
                buf.push_expr(expr)?;
                buf.push_char(')');
            }
        }
        buf.push_char(')');
        Ok(())
    }
}

impl StatementCompiler for H2Dialect {
    fn explain_prefix(&self, d: &Dialect, analyze: bool, options: Option<&str>) -> Result<String> {
        if options.is_some() {
            return Err(d.unsupported("EXPLAIN options"));
        }
        Ok(String::from(if analyze { "EXPLAIN ANALYZE " } else { "EXPLAIN " }))
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
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::ast::{col, ColumnType, DataType, DeleteOp, Function};
    use crate::builder::SqlValue;
    use crate::dialect::DialectKind;

    fn h2() -> Dialect {
        Dialect::new(DialectKind::H2)
    }

    #[test]
    fn native_uuid_and_unbounded_binary() {
        let d = h2();
        assert_eq!(d.types().render_type(&d, &DataType::Uuid).unwrap(), "UUID");
        assert_eq!(
            d.types().render_type(&d, &DataType::Binary(None)).unwrap(),
            "VARBINARY"
        );
        let id = Uuid::from_u128(7);
        assert_eq!(
            d.encode_value(&ColumnType::new(DataType::Uuid), SqlValue::Uuid(id))
                .unwrap(),
            SqlValue::Uuid(id)
        );
    }

    #[test]
    fn array_slice_defaults_to_cardinality() {
        let d = h2();
        let slice: Expr = Function::ArraySlice {
            expr: col("tags"),
            lower: Some(2),
            upper: None,
        }
        .into();
        assert_eq!(
            d.compile_expr(&slice).unwrap().sql,
            "ARRAY_SLICE(tags,2,CARDINALITY(tags))"
        );
    }

    #[test]
    fn limits_and_typed_indices() {
        let d = h2();
        assert_eq!(
            d.statements().delete(&d, &DeleteOp::new("t").limit(3)).unwrap().sql,
            "DELETE FROM t LIMIT 3"
        );
        let index = Index::new("t", &["a"]).with_type("hash");
        assert_eq!(
            d.create_index(&index).unwrap().unwrap(),
            "CREATE HASH INDEX t_a ON t (a)"
        );
        assert!(d.statements().explain_prefix(&d, false, Some("FORMAT JSON")).is_err());
    }
}
